//! Single-flight guard: at most one run per backend at a time.
//!
//! # Responsibilities
//! - Mark a backend busy, or reject if it already is
//! - Release the mark when the run ends, however it ends
//! - Report which backends are busy (index page)
//!
//! # Design Decisions
//! - One mutex around the whole map; work runs outside the lock
//! - Release is tied to `RunPermit::drop`, so errors and panics release too
//! - A poisoned lock is recovered rather than propagated

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::config::BackendKind;
use crate::runner::RunError;

/// Tracks which backends have a run in progress.
#[derive(Debug, Default)]
pub struct RunGuard {
    active: Mutex<HashMap<BackendKind, Instant>>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<BackendKind, Instant>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `kind` busy. Fails with [`RunError::Busy`] if it already is.
    pub fn try_acquire(self: &Arc<Self>, kind: BackendKind) -> Result<RunPermit, RunError> {
        let started_at = Instant::now();
        {
            let mut active = self.lock();
            if active.contains_key(&kind) {
                return Err(RunError::Busy(kind));
            }
            active.insert(kind, started_at);
        }

        tracing::debug!(backend = %kind, "Run guard acquired");
        Ok(RunPermit {
            guard: Arc::clone(self),
            kind,
            started_at,
        })
    }

    pub fn is_busy(&self, kind: BackendKind) -> bool {
        self.lock().contains_key(&kind)
    }

    /// Busy backends in display order.
    pub fn busy(&self) -> Vec<BackendKind> {
        let mut kinds: Vec<_> = self.lock().keys().copied().collect();
        kinds.sort();
        kinds
    }

    fn release(&self, kind: BackendKind) {
        self.lock().remove(&kind);
        tracing::debug!(backend = %kind, "Run guard released");
    }
}

/// Proof that a backend is marked busy. Dropping it clears the mark.
#[derive(Debug)]
pub struct RunPermit {
    guard: Arc<RunGuard>,
    kind: BackendKind,
    started_at: Instant,
}

impl RunPermit {
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.guard.release(self.kind);
    }
}
