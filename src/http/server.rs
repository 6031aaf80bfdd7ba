//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, metrics)
//! - Serve on a bound listener until shutdown
//! - Drain detached runs before returning

use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ExerciserConfig;
use crate::exercise::{ExerciseError, ExerciserRegistry};
use crate::http::handlers::{fallback, index, run_backend};
use crate::http::request::{request_id, UuidRequestId};
use crate::observability::metrics;
use crate::runner::RunManager;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub runs: RunManager,
}

/// HTTP server for the exerciser service.
pub struct HttpServer {
    router: Router,
    runs: RunManager,
    config: ExerciserConfig,
}

impl HttpServer {
    /// Create a server with real exercisers for every configured backend.
    pub fn new(config: ExerciserConfig) -> Result<Self, ExerciseError> {
        let registry = ExerciserRegistry::from_config(&config.backends)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Create a server around an explicit set of exercisers.
    pub fn with_registry(config: ExerciserConfig, registry: ExerciserRegistry) -> Self {
        let runs = RunManager::new(config.load.clone(), config.backends.clone(), registry);
        let router = Self::build_router(AppState { runs: runs.clone() });
        Self {
            router,
            runs,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/{backend}", get(run_backend))
            .fallback(fallback)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(
                        |request: &Request| {
                            tracing::info_span!(
                                "request",
                                method = %request.method(),
                                path = %request.uri().path(),
                                request_id = %request_id(request.headers()),
                            )
                        },
                    ))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(middleware::from_fn(track_metrics)),
            )
    }

    /// The router, for serving or for driving requests in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn runs(&self) -> &RunManager {
        &self.runs
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ExerciserConfig {
        &self.config
    }

    /// Serve until `shutdown` fires, then wait for detached runs.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = ?self.runs.kinds(),
            execution = ?self.config.load.execution,
            mode = ?self.config.load.mode,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server received shutdown signal");
            })
            .await?;

        let drain = Duration::from_secs(self.config.shutdown.drain_secs);
        let tracker = self.runs.tracker();
        if tracker.active_count() > 0 {
            tracing::info!(active = tracker.active_count(), "Waiting for runs to finish");
            if !tracker.wait_idle(drain).await {
                tracing::warn!(
                    active = tracker.active_count(),
                    "Shutting down with runs still in flight"
                );
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
