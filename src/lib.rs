//! Datastore exerciser library.
//!
//! An HTTP service that, on request, drives a burst of writes against one
//! of several datastores or brokers so their monitoring has something to
//! show. At most one run per backend is in flight at a time.

pub mod config;
pub mod exercise;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod runner;

pub use config::ExerciserConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
