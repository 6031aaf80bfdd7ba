//! In-flight run tracking for graceful shutdown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::observability::metrics;

/// Counts runs that are still executing.
#[derive(Debug, Clone, Default)]
pub struct RunTracker {
    active_count: Arc<AtomicU64>,
}

impl RunTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a started run. Returns a guard that decrements on drop.
    pub fn track(&self) -> TrackedRun {
        let active = self.active_count.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_active_runs(active);
        TrackedRun {
            active_count: Arc::clone(&self.active_count),
        }
    }

    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until no run is in flight or `timeout` passes.
    ///
    /// Returns `true` if every run finished in time.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let drained = async {
            while self.active_count.load(Ordering::SeqCst) > 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };
        tokio::time::timeout(timeout, drained).await.is_ok()
    }
}

/// Guard held by a run task for its whole lifetime.
#[derive(Debug)]
pub struct TrackedRun {
    active_count: Arc<AtomicU64>,
}

impl Drop for TrackedRun {
    fn drop(&mut self) {
        let active = self.active_count.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::record_active_runs(active);
    }
}
