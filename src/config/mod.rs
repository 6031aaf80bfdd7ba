//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment variables          config file (TOML, --config)
//!     → loader.rs (read & parse)     → loader.rs (deserialize)
//!     → endpoint.rs (address normalization)
//!     → validation.rs (semantic checks, all errors at once)
//!     → ExerciserConfig (validated, immutable)
//!     → handed to HttpServer before the listener binds
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields except backend addresses have defaults
//! - A bad config is a typed error, never a process exit inside the library

pub mod endpoint;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, load_from_lookup, ConfigError};
pub use schema::{
    BackendConfig, BackendKind, ExecutionMode, ExerciserConfig, ListenerConfig, LoadConfig,
    LoadMode, LogFormat, ObservabilityConfig, ShutdownConfig,
};
pub use validation::ValidationError;
