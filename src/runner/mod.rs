//! Run coordination subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → dispatch.rs (RunManager::start)
//!     → guard.rs (mark backend busy, or reject)
//!     → tokio task: exerciser run, holding RunPermit + TrackedRun
//!     → RunHandle: join() in blocking mode, detach() in detached mode
//!
//! Shutdown:
//!     tracker.rs waits for in-flight runs (bounded)
//! ```
//!
//! # Design Decisions
//! - The guard is an object in server state, not a global
//! - Fire-and-forget is an explicit `detach()`, never an implicit spawn
//! - A busy rejection only affects the rejected request

use thiserror::Error;

use crate::config::BackendKind;
use crate::exercise::ExerciseError;

pub mod dispatch;
pub mod guard;
pub mod tracker;

pub use dispatch::{RunHandle, RunManager, RunReport};
pub use guard::{RunGuard, RunPermit};
pub use tracker::RunTracker;

/// Why a run could not be started or did not succeed.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("{0} is busy now")]
    Busy(BackendKind),

    #[error("{0} is not configured")]
    UnknownBackend(String),

    #[error("{backend} error: {source}")]
    Exercise {
        backend: BackendKind,
        #[source]
        source: ExerciseError,
    },

    #[error("{0} run panicked")]
    Panicked(BackendKind),
}
