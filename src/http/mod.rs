//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → handlers.rs (index, run, fallback)
//!     → runner (guard + exerciser task)
//!     → response.rs (302 home, 404, 500 with error text)
//! ```

pub mod handlers;
pub mod index;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
