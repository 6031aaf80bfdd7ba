//! Datastore exercisers.
//!
//! # Data Flow
//! ```text
//! RunManager::start(kind)
//!     → registry.rs (kind → Arc<dyn Exerciser>)
//!     → budget.rs (iteration count or time budget)
//!     → exerciser: connect → setup → write loop → teardown → close
//!     → number of writes, or ExerciseError
//! ```
//!
//! # Design Decisions
//! - One exerciser per backend, each owning its connection for one run
//! - No retries: the first client error ends the run
//! - The trait returns a boxed future so exercisers can live behind `dyn`

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::config::BackendKind;

pub mod budget;
pub mod cache;
pub mod document;
pub mod error;
pub mod queue;
pub mod registry;
pub mod sql;
pub mod wide_column;

pub use budget::{Budget, TimeBudget};
pub use error::ExerciseError;
pub use registry::ExerciserRegistry;

/// Name of the ephemeral table, collection, queue and key prefix.
pub const LOAD_TARGET: &str = "load_demo";

/// A routine that generates load against one datastore.
pub trait Exerciser: Send + Sync {
    /// Backend this exerciser talks to.
    fn kind(&self) -> BackendKind;

    /// Perform one run within `budget`, returning the number of writes.
    fn run(&self, budget: Arc<Budget>) -> BoxFuture<'_, Result<u64, ExerciseError>>;
}

/// Key written by iteration `i` on key-value backends.
pub(crate) fn load_key(i: u64) -> String {
    format!("{LOAD_TARGET}-{i}")
}
