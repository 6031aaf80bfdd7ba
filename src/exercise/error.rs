//! Errors raised while exercising a datastore.

use thiserror::Error;

/// A failure talking to the external system.
///
/// Every variant carries the client library's own error text; nothing is
/// retried.
#[derive(Error, Debug)]
pub enum ExerciseError {
    #[error("sql: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("memcache: {0}")]
    Memcache(#[from] memcache::MemcacheError),

    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("cassandra: {0}")]
    Cassandra(String),

    #[error("amqp: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("address: {0}")]
    Address(#[from] crate::config::endpoint::EndpointError),

    #[error("worker: {0}")]
    Worker(String),
}

impl ExerciseError {
    /// The scylla driver has a separate error type per phase (session,
    /// query, schema), so they are flattened to text.
    pub fn cassandra(err: impl std::fmt::Display) -> Self {
        ExerciseError::Cassandra(err.to_string())
    }
}
