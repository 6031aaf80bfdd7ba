//! Loop bounds for exerciser runs.
//!
//! A run either performs a fixed number of writes or keeps writing until a
//! wall-clock budget is spent. The time budget anchors its clock on the
//! first check, so building one never starts it.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::config::{BackendConfig, LoadConfig, LoadMode};

/// Wall-clock budget that starts on its first check.
#[derive(Debug)]
pub struct TimeBudget {
    duration: Duration,
    deadline: OnceLock<Instant>,
}

impl TimeBudget {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: OnceLock::new(),
        }
    }

    /// True until `duration` has elapsed since the first call.
    pub fn is_running(&self) -> bool {
        let deadline = *self.deadline.get_or_init(|| Instant::now() + self.duration);
        Instant::now() < deadline
    }

    /// Whether the clock has been started.
    pub fn is_started(&self) -> bool {
        self.deadline.get().is_some()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Predicate closure form of [`TimeBudget::is_running`].
    pub fn into_predicate(self) -> impl FnMut() -> bool {
        move || self.is_running()
    }
}

/// How many loop iterations a run may perform.
#[derive(Debug)]
pub enum Budget {
    Iterations(u64),
    Duration(TimeBudget),
}

impl Budget {
    /// Budget for one run of `backend` under the configured load mode.
    pub fn for_backend(load: &LoadConfig, backend: &BackendConfig) -> Self {
        match load.mode {
            LoadMode::Count => Budget::Iterations(backend.iterations()),
            LoadMode::Time => Budget::Duration(TimeBudget::new(Duration::from_secs(load.duration_secs))),
        }
    }

    /// Whether iteration number `iteration` (zero-based) may run.
    pub fn allows(&self, iteration: u64) -> bool {
        match self {
            Budget::Iterations(limit) => iteration < *limit,
            Budget::Duration(timer) => timer.is_running(),
        }
    }
}
