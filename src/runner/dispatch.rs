//! Run dispatch: guard, spawn, report.
//!
//! Every run is its own tokio task that owns the guard permit, so the busy
//! mark lives exactly as long as the work. Callers get a [`RunHandle`] and
//! must either `join` it or `detach` it.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::{BackendConfig, BackendKind, ExecutionMode, LoadConfig};
use crate::exercise::{Budget, ExerciseError, ExerciserRegistry};
use crate::observability::metrics;
use crate::runner::guard::RunGuard;
use crate::runner::tracker::RunTracker;
use crate::runner::RunError;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub kind: BackendKind,
    pub writes: u64,
    pub elapsed: Duration,
}

/// Starts runs and owns the state they share.
#[derive(Clone)]
pub struct RunManager {
    guard: Arc<RunGuard>,
    registry: Arc<ExerciserRegistry>,
    backends: Arc<Vec<BackendConfig>>,
    load: LoadConfig,
    tracker: RunTracker,
}

impl RunManager {
    pub fn new(load: LoadConfig, backends: Vec<BackendConfig>, registry: ExerciserRegistry) -> Self {
        Self {
            guard: Arc::new(RunGuard::new()),
            registry: Arc::new(registry),
            backends: Arc::new(backends),
            load,
            tracker: RunTracker::new(),
        }
    }

    pub fn guard(&self) -> &Arc<RunGuard> {
        &self.guard
    }

    pub fn tracker(&self) -> &RunTracker {
        &self.tracker
    }

    pub fn execution(&self) -> ExecutionMode {
        self.load.execution
    }

    /// Backends that can be started, in display order.
    pub fn kinds(&self) -> Vec<BackendKind> {
        self.registry.kinds()
    }

    fn budget_for(&self, kind: BackendKind) -> Budget {
        match self.backends.iter().find(|b| b.kind == kind) {
            Some(backend) => Budget::for_backend(&self.load, backend),
            None => Budget::for_backend(&self.load, &BackendConfig::new(kind, "")),
        }
    }

    /// Mark `kind` busy and spawn its exerciser.
    ///
    /// Fails without doing any work if the backend is unknown or busy.
    pub fn start(&self, kind: BackendKind) -> Result<RunHandle, RunError> {
        let exerciser = self
            .registry
            .get(kind)
            .ok_or_else(|| RunError::UnknownBackend(kind.to_string()))?;

        let permit = match self.guard.try_acquire(kind) {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!(backend = %kind, "Run rejected: backend busy");
                metrics::record_busy_rejection(kind);
                return Err(e);
            }
        };

        let budget = Arc::new(self.budget_for(kind));
        let tracked = self.tracker.track();

        let handle = tokio::spawn(async move {
            let _tracked = tracked;
            tracing::info!(backend = %kind, budget = ?budget, "Run started");

            let result = exerciser.run(budget).await;
            let elapsed = permit.started_at().elapsed();

            match &result {
                Ok(writes) => {
                    tracing::info!(
                        backend = %kind,
                        writes = *writes,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Run finished"
                    );
                    metrics::record_run(kind, "success", elapsed, *writes);
                }
                Err(e) => {
                    tracing::error!(
                        backend = %kind,
                        error = %e,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Run failed"
                    );
                    metrics::record_run(kind, "failure", elapsed, 0);
                }
            }

            drop(permit);
            result.map(|writes| RunReport {
                kind,
                writes,
                elapsed,
            })
        });

        Ok(RunHandle { kind, handle })
    }
}

/// A started run.
#[must_use = "a run handle must be joined or explicitly detached"]
pub struct RunHandle {
    kind: BackendKind,
    handle: JoinHandle<Result<RunReport, ExerciseError>>,
}

impl RunHandle {
    /// Wait for the run to finish.
    pub async fn join(self) -> Result<RunReport, RunError> {
        match self.handle.await {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(source)) => Err(RunError::Exercise {
                backend: self.kind,
                source,
            }),
            Err(e) => {
                tracing::error!(backend = %self.kind, error = %e, "Run task did not complete");
                Err(RunError::Panicked(self.kind))
            }
        }
    }

    /// Let the run finish in the background.
    ///
    /// The task logs its own outcome and releases the guard when done.
    pub fn detach(self) {
        tracing::debug!(backend = %self.kind, "Run detached");
        drop(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoadMode;
    use crate::exercise::Exerciser;
    use futures_util::future::BoxFuture;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::Notify;

    /// Counts budget-allowed iterations without touching a datastore.
    struct Counting {
        kind: BackendKind,
        calls: AtomicU64,
        gate: Option<Arc<Notify>>,
        fail: bool,
    }

    impl Counting {
        fn new(kind: BackendKind) -> Self {
            Self {
                kind,
                calls: AtomicU64::new(0),
                gate: None,
                fail: false,
            }
        }
    }

    impl Exerciser for Counting {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn run(&self, budget: Arc<Budget>) -> BoxFuture<'_, Result<u64, ExerciseError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
                if self.fail {
                    return Err(ExerciseError::Worker("connection refused".into()));
                }
                let mut writes = 0;
                while budget.allows(writes) {
                    writes += 1;
                }
                Ok(writes)
            })
        }
    }

    fn manager_with(exerciser: Arc<Counting>, iterations: u64) -> RunManager {
        let kind = exerciser.kind;
        let mut registry = ExerciserRegistry::new();
        registry.insert(exerciser);
        let mut backend = BackendConfig::new(kind, "unused");
        backend.iterations = Some(iterations);
        RunManager::new(LoadConfig::default(), vec![backend], registry)
    }

    #[tokio::test]
    async fn run_reports_budgeted_writes_and_releases() {
        let exerciser = Arc::new(Counting::new(BackendKind::Mysql));
        let manager = manager_with(exerciser.clone(), 3);

        let report = manager.start(BackendKind::Mysql).unwrap().join().await.unwrap();

        assert_eq!(report.writes, 3);
        assert_eq!(report.kind, BackendKind::Mysql);
        assert!(!manager.guard().is_busy(BackendKind::Mysql));
        assert_eq!(manager.tracker().active_count(), 0);
    }

    #[tokio::test]
    async fn time_mode_bounds_the_loop_by_wall_clock() {
        let exerciser = Arc::new(Counting::new(BackendKind::Redis));
        let mut registry = ExerciserRegistry::new();
        registry.insert(exerciser);
        let load = LoadConfig {
            mode: LoadMode::Time,
            duration_secs: 1,
            ..LoadConfig::default()
        };
        let manager = RunManager::new(load, Vec::new(), registry);

        let report = manager.start(BackendKind::Redis).unwrap().join().await.unwrap();
        assert!(report.writes > 0);
        assert!(report.elapsed >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn busy_backend_rejects_without_running() {
        let gate = Arc::new(Notify::new());
        let mut counting = Counting::new(BackendKind::Mysql);
        counting.gate = Some(gate.clone());
        let exerciser = Arc::new(counting);
        let manager = manager_with(exerciser.clone(), 1);

        let first = manager.start(BackendKind::Mysql).unwrap();
        let second = manager.start(BackendKind::Mysql);
        assert!(matches!(second, Err(RunError::Busy(BackendKind::Mysql))));

        gate.notify_one();
        first.join().await.unwrap();
        assert_eq!(exerciser.calls.load(Ordering::SeqCst), 1);
        assert!(!manager.guard().is_busy(BackendKind::Mysql));
    }

    #[tokio::test]
    async fn failure_is_reported_and_releases() {
        let mut counting = Counting::new(BackendKind::Pgsql);
        counting.fail = true;
        let manager = manager_with(Arc::new(counting), 1);

        let err = manager.start(BackendKind::Pgsql).unwrap().join().await.unwrap_err();
        assert_eq!(err.to_string(), "pgsql error: worker: connection refused");
        assert!(!manager.guard().is_busy(BackendKind::Pgsql));
    }

    #[tokio::test]
    async fn unknown_backend_is_rejected() {
        let manager = manager_with(Arc::new(Counting::new(BackendKind::Mysql)), 1);
        assert!(matches!(
            manager.start(BackendKind::Cassandra),
            Err(RunError::UnknownBackend(_))
        ));
        assert!(manager.guard().busy().is_empty());
    }

    #[tokio::test]
    async fn detached_run_releases_when_done() {
        let gate = Arc::new(Notify::new());
        let mut counting = Counting::new(BackendKind::Mongodb);
        counting.gate = Some(gate.clone());
        let manager = manager_with(Arc::new(counting), 2);

        manager.start(BackendKind::Mongodb).unwrap().detach();
        assert!(manager.guard().is_busy(BackendKind::Mongodb));

        gate.notify_one();
        assert!(manager.tracker().wait_idle(Duration::from_secs(5)).await);
        assert!(!manager.guard().is_busy(BackendKind::Mongodb));
    }
}
