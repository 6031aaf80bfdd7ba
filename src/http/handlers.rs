//! Route handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{Html, Response};

use crate::config::{BackendKind, ExecutionMode};
use crate::http::index::render_index;
use crate::http::request::request_id;
use crate::http::response::{found, not_found};
use crate::http::server::AppState;
use crate::runner::RunError;

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.runs.kinds(), &state.runs.guard().busy()))
}

/// `GET /{backend}`: run the backend's exerciser, then send the client home.
pub async fn run_backend(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, RunError> {
    let kind: BackendKind = name
        .parse()
        .map_err(|_| RunError::UnknownBackend(name.clone()))?;

    tracing::debug!(
        request_id = %request_id(&headers),
        backend = %kind,
        execution = ?state.runs.execution(),
        "Run requested"
    );

    let handle = state.runs.start(kind)?;
    match state.runs.execution() {
        ExecutionMode::Blocking => {
            handle.join().await?;
        }
        ExecutionMode::Detached => handle.detach(),
    }

    Ok(found("/"))
}

/// Anything not routed.
pub async fn fallback() -> Response {
    not_found()
}
