//! Shared utilities for integration tests.
//!
//! The exercisers here stand in for real datastores: they honour the
//! budget they are handed but never open a connection.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use tokio::sync::Notify;

use datastore_exerciser::config::{BackendConfig, BackendKind, ExerciserConfig};
use datastore_exerciser::exercise::{Budget, ExerciseError, Exerciser, ExerciserRegistry};
use datastore_exerciser::HttpServer;

/// What a fake run does once it is allowed to proceed.
#[derive(Clone, Copy)]
pub enum Behaviour {
    Succeed,
    Fail,
    Panic,
}

pub struct FakeExerciser {
    kind: BackendKind,
    behaviour: Behaviour,
    gate: Option<Arc<Notify>>,
    started: Arc<Notify>,
    calls: AtomicU64,
}

impl FakeExerciser {
    pub fn new(kind: BackendKind, behaviour: Behaviour) -> Self {
        Self {
            kind,
            behaviour,
            gate: None,
            started: Arc::new(Notify::new()),
            calls: AtomicU64::new(0),
        }
    }

    /// Hold every run until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Notified each time a run begins.
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Exerciser for FakeExerciser {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn run(&self, budget: Arc<Budget>) -> BoxFuture<'_, Result<u64, ExerciseError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.behaviour {
                Behaviour::Succeed => {
                    let mut writes = 0;
                    while budget.allows(writes) {
                        writes += 1;
                    }
                    Ok(writes)
                }
                Behaviour::Fail => Err(ExerciseError::Worker("dial tcp: connection refused".into())),
                Behaviour::Panic => panic!("exerciser blew up"),
            }
        })
    }
}

/// Config with one backend entry per fake, each limited to `iterations`.
pub fn config_for(kinds: &[BackendKind], iterations: u64) -> ExerciserConfig {
    let mut config = ExerciserConfig::default();
    for kind in kinds {
        let mut backend = BackendConfig::new(*kind, "fake");
        backend.iterations = Some(iterations);
        config.backends.push(backend);
    }
    config
}

/// Build a server over the given fakes.
pub fn server_with(config: ExerciserConfig, fakes: Vec<Arc<FakeExerciser>>) -> HttpServer {
    let mut registry = ExerciserRegistry::new();
    for fake in fakes {
        registry.insert(fake);
    }
    HttpServer::with_registry(config, registry)
}

pub fn get(path: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .body(Body::empty())
        .expect("request")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
