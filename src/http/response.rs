//! Response mapping.
//!
//! # Design Decisions
//! - Unknown backends are plain 404s, like any unrouted path
//! - Every other run error is a 500 carrying the error text
//! - Success is a 302 back to the index, not axum's 303 `Redirect::to`

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::runner::RunError;

/// `302 Found` pointing at `location`.
pub fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

impl IntoResponse for RunError {
    fn into_response(self) -> Response {
        match self {
            RunError::UnknownBackend(_) => not_found(),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response(),
        }
    }
}
