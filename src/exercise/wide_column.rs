//! Cassandra exerciser via the scylla driver.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use scylla::{Session, SessionBuilder};

use crate::config::endpoint::CassandraTarget;
use crate::config::BackendKind;
use crate::exercise::{Budget, ExerciseError, Exerciser};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS load_demo (id bigint PRIMARY KEY)";
const INSERT_ROW: &str = "INSERT INTO load_demo (id) VALUES (?)";
const DROP_TABLE: &str = "DROP TABLE load_demo";

pub struct CassandraExerciser {
    target: CassandraTarget,
    teardown: bool,
}

impl CassandraExerciser {
    pub fn new(target: CassandraTarget, teardown: bool) -> Self {
        Self { target, teardown }
    }

    async fn connect(&self) -> Result<Session, ExerciseError> {
        let mut builder = SessionBuilder::new().known_nodes(&self.target.hosts);
        if let Some(keyspace) = &self.target.keyspace {
            builder = builder.use_keyspace(keyspace, false);
        }
        builder.build().await.map_err(ExerciseError::cassandra)
    }

    async fn exercise(&self, budget: &Budget) -> Result<u64, ExerciseError> {
        let session = self.connect().await?;

        session
            .query_unpaged(CREATE_TABLE, ())
            .await
            .map_err(ExerciseError::cassandra)?;

        let mut writes = 0;
        while budget.allows(writes) {
            session
                .query_unpaged(INSERT_ROW, (row_id(writes),))
                .await
                .map_err(ExerciseError::cassandra)?;
            writes += 1;
        }

        if self.teardown {
            session
                .query_unpaged(DROP_TABLE, ())
                .await
                .map_err(ExerciseError::cassandra)?;
        }

        Ok(writes)
    }
}

/// Cassandra `bigint` is signed; a run never gets near `i64::MAX` writes.
fn row_id(writes: u64) -> i64 {
    i64::try_from(writes).unwrap_or(i64::MAX)
}

impl Exerciser for CassandraExerciser {
    fn kind(&self) -> BackendKind {
        BackendKind::Cassandra
    }

    fn run(&self, budget: Arc<Budget>) -> BoxFuture<'_, Result<u64, ExerciseError>> {
        Box::pin(async move { self.exercise(&budget).await })
    }
}
