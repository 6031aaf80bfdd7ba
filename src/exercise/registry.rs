//! Lookup table from backend to exerciser.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::endpoint::{connection_url, CassandraTarget};
use crate::config::{BackendConfig, BackendKind};
use crate::exercise::cache::{MemcacheExerciser, RedisExerciser};
use crate::exercise::document::MongoExerciser;
use crate::exercise::queue::RabbitExerciser;
use crate::exercise::sql::SqlExerciser;
use crate::exercise::wide_column::CassandraExerciser;
use crate::exercise::{ExerciseError, Exerciser};

/// The exercisers available to the HTTP surface, one per configured backend.
#[derive(Clone, Default)]
pub struct ExerciserRegistry {
    exercisers: BTreeMap<BackendKind, Arc<dyn Exerciser>>,
}

impl ExerciserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the real exerciser for every configured backend.
    pub fn from_config(backends: &[BackendConfig]) -> Result<Self, ExerciseError> {
        let mut registry = Self::new();
        for backend in backends {
            registry.insert(build_exerciser(backend)?);
        }
        Ok(registry)
    }

    /// Register an exerciser, replacing any previous one for the same backend.
    pub fn insert(&mut self, exerciser: Arc<dyn Exerciser>) {
        self.exercisers.insert(exerciser.kind(), exerciser);
    }

    pub fn get(&self, kind: BackendKind) -> Option<Arc<dyn Exerciser>> {
        self.exercisers.get(&kind).cloned()
    }

    /// Registered backends in display order.
    pub fn kinds(&self) -> Vec<BackendKind> {
        self.exercisers.keys().copied().collect()
    }
}

fn build_exerciser(backend: &BackendConfig) -> Result<Arc<dyn Exerciser>, ExerciseError> {
    let teardown = backend.teardown;
    let exerciser: Arc<dyn Exerciser> = match backend.kind {
        kind @ (BackendKind::Mysql | BackendKind::Pgsql) => Arc::new(SqlExerciser::new(
            kind,
            connection_url(kind, &backend.address)?,
            teardown,
        )),
        BackendKind::Redis => Arc::new(RedisExerciser::new(
            connection_url(BackendKind::Redis, &backend.address)?,
            teardown,
        )),
        BackendKind::Memcache => Arc::new(MemcacheExerciser::new(
            connection_url(BackendKind::Memcache, &backend.address)?,
            teardown,
        )),
        BackendKind::Mongodb => Arc::new(MongoExerciser::new(
            connection_url(BackendKind::Mongodb, &backend.address)?,
            teardown,
        )),
        BackendKind::Cassandra => Arc::new(CassandraExerciser::new(
            CassandraTarget::parse(&backend.address)?,
            teardown,
        )),
        BackendKind::Rabbitmq => Arc::new(RabbitExerciser::new(
            connection_url(BackendKind::Rabbitmq, &backend.address)?,
            teardown,
        )),
    };
    Ok(exerciser)
}
