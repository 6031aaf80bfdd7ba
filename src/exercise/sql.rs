//! Relational exerciser for MySQL and PostgreSQL.
//!
//! Both go through sqlx's `Any` driver over a single connection: create the
//! load table, insert one row per iteration, drop the table.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use sqlx::any::install_default_drivers;
use sqlx::{AnyConnection, Connection};

use crate::config::BackendKind;
use crate::exercise::{Budget, ExerciseError, Exerciser};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS load_demo (i INT)";
const INSERT_ROW: &str = "INSERT INTO load_demo (i) VALUES (1)";
const DROP_TABLE: &str = "DROP TABLE load_demo";

pub struct SqlExerciser {
    kind: BackendKind,
    url: String,
    teardown: bool,
}

impl SqlExerciser {
    /// `url` must carry the `mysql://` or `postgres://` scheme.
    pub fn new(kind: BackendKind, url: impl Into<String>, teardown: bool) -> Self {
        Self {
            kind,
            url: url.into(),
            teardown,
        }
    }

    async fn exercise(&self, budget: &Budget) -> Result<u64, ExerciseError> {
        install_default_drivers();

        let mut conn = AnyConnection::connect(&self.url).await?;
        sqlx::query(CREATE_TABLE).execute(&mut conn).await?;

        let mut writes = 0;
        while budget.allows(writes) {
            sqlx::query(INSERT_ROW).execute(&mut conn).await?;
            writes += 1;
        }

        if self.teardown {
            sqlx::query(DROP_TABLE).execute(&mut conn).await?;
        } else {
            tracing::debug!(backend = %self.kind, "Keeping load table");
        }

        conn.close().await?;
        Ok(writes)
    }
}

impl Exerciser for SqlExerciser {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn run(&self, budget: Arc<Budget>) -> BoxFuture<'_, Result<u64, ExerciseError>> {
        Box::pin(async move { self.exercise(&budget).await })
    }
}
