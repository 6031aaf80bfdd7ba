//! Key-value exercisers for Redis and Memcache.
//!
//! Each iteration writes `load_demo-<i>` and, with teardown enabled,
//! deletes it straight away.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use redis::AsyncCommands;

use crate::config::BackendKind;
use crate::exercise::{load_key, Budget, ExerciseError, Exerciser};

pub struct RedisExerciser {
    url: String,
    teardown: bool,
}

impl RedisExerciser {
    pub fn new(url: impl Into<String>, teardown: bool) -> Self {
        Self {
            url: url.into(),
            teardown,
        }
    }

    async fn exercise(&self, budget: &Budget) -> Result<u64, ExerciseError> {
        let client = redis::Client::open(self.url.as_str())?;
        let mut conn = client.get_multiplexed_async_connection().await?;

        let mut writes = 0;
        while budget.allows(writes) {
            let key = load_key(writes);
            let _: () = conn.set(&key, writes).await?;
            if self.teardown {
                let _: () = conn.del(&key).await?;
            }
            writes += 1;
        }

        Ok(writes)
    }
}

impl Exerciser for RedisExerciser {
    fn kind(&self) -> BackendKind {
        BackendKind::Redis
    }

    fn run(&self, budget: Arc<Budget>) -> BoxFuture<'_, Result<u64, ExerciseError>> {
        Box::pin(async move { self.exercise(&budget).await })
    }
}

/// The memcache client is blocking, so the loop runs on the blocking pool.
pub struct MemcacheExerciser {
    url: String,
    teardown: bool,
}

impl MemcacheExerciser {
    pub fn new(url: impl Into<String>, teardown: bool) -> Self {
        Self {
            url: url.into(),
            teardown,
        }
    }

    async fn exercise(&self, budget: Arc<Budget>) -> Result<u64, ExerciseError> {
        let url = self.url.clone();
        let teardown = self.teardown;

        tokio::task::spawn_blocking(move || -> Result<u64, ExerciseError> {
            let client = memcache::Client::connect(url)?;

            let mut writes = 0;
            while budget.allows(writes) {
                let key = load_key(writes);
                client.set(&key, writes, 0)?;
                if teardown {
                    client.delete(&key)?;
                }
                writes += 1;
            }

            Ok(writes)
        })
        .await
        .map_err(|e| ExerciseError::Worker(e.to_string()))?
    }
}

impl Exerciser for MemcacheExerciser {
    fn kind(&self) -> BackendKind {
        BackendKind::Memcache
    }

    fn run(&self, budget: Arc<Budget>) -> BoxFuture<'_, Result<u64, ExerciseError>> {
        Box::pin(self.exercise(budget))
    }
}
