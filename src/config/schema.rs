//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits so the same shape can come from the
//! environment loader or from a TOML file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Root configuration for the exerciser service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ExerciserConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// How much load each run generates and how runs are dispatched.
    pub load: LoadConfig,

    /// Datastores that can be exercised.
    pub backends: Vec<BackendConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Shutdown behaviour.
    pub shutdown: ShutdownConfig,
}

impl ExerciserConfig {
    /// Find the configuration of a backend, if it is configured.
    pub fn backend(&self, kind: BackendKind) -> Option<&BackendConfig> {
        self.backends.iter().find(|b| b.kind == kind)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// Listen port.
    pub port: u16,
}

impl ListenerConfig {
    /// Socket address string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Whether an exerciser loop is bounded by a count or by wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Run `iterations` writes per backend.
    #[default]
    Count,
    /// Keep writing until `duration_secs` have elapsed.
    Time,
}

/// Whether the HTTP handler waits for a run to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Await the run and report its outcome in the response.
    #[default]
    Blocking,
    /// Redirect immediately; the run finishes in the background.
    Detached,
}

/// Load generation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Loop bound used by every exerciser.
    pub mode: LoadMode,

    /// Time budget in seconds (used in `time` mode).
    pub duration_secs: u64,

    /// Dispatch mode for runs triggered over HTTP.
    pub execution: ExecutionMode,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            mode: LoadMode::Count,
            duration_secs: 900,
            execution: ExecutionMode::Blocking,
        }
    }
}

/// Supported datastore backends.
///
/// The declaration order is the order used on the index page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Mysql,
    Pgsql,
    Redis,
    Memcache,
    Mongodb,
    Cassandra,
    Rabbitmq,
}

impl BackendKind {
    pub const ALL: [BackendKind; 7] = [
        BackendKind::Mysql,
        BackendKind::Pgsql,
        BackendKind::Redis,
        BackendKind::Memcache,
        BackendKind::Mongodb,
        BackendKind::Cassandra,
        BackendKind::Rabbitmq,
    ];

    /// Identifier used in URL paths, metrics labels and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Mysql => "mysql",
            BackendKind::Pgsql => "pgsql",
            BackendKind::Redis => "redis",
            BackendKind::Memcache => "memcache",
            BackendKind::Mongodb => "mongodb",
            BackendKind::Cassandra => "cassandra",
            BackendKind::Rabbitmq => "rabbitmq",
        }
    }

    /// Human-readable name shown on the index page.
    pub fn label(&self) -> &'static str {
        match self {
            BackendKind::Mysql => "MySQL",
            BackendKind::Pgsql => "PostgreSQL",
            BackendKind::Redis => "Redis",
            BackendKind::Memcache => "Memcache",
            BackendKind::Mongodb => "MongoDB",
            BackendKind::Cassandra => "Cassandra",
            BackendKind::Rabbitmq => "RabbitMQ",
        }
    }

    /// Prefix of the per-backend tuning variables (`<PREFIX>_NUM`, ...).
    pub fn env_prefix(&self) -> &'static str {
        match self {
            BackendKind::Mysql => "MYSQL",
            BackendKind::Pgsql => "PGSQL",
            BackendKind::Redis => "REDIS",
            BackendKind::Memcache => "MEMCACHE",
            BackendKind::Mongodb => "MONGODB",
            BackendKind::Cassandra => "CASSANDRA",
            BackendKind::Rabbitmq => "RABBITMQ",
        }
    }

    /// Environment variables holding the address, preferred name first.
    pub fn address_vars(&self) -> &'static [&'static str] {
        match self {
            BackendKind::Mysql => &["MYSQL_URL"],
            BackendKind::Pgsql => &["PGSQL_URL"],
            BackendKind::Redis => &["REDIS_URL"],
            BackendKind::Memcache => &["MEMCACHE_ADDR"],
            BackendKind::Mongodb => &["MONGODB_URL", "MONGODB_ADDR"],
            BackendKind::Cassandra => &["CASSANDRA_URL", "CASSANDRA_HOST"],
            BackendKind::Rabbitmq => &["RABBITMQ_URL"],
        }
    }

    /// Iteration count used when `<PREFIX>_NUM` is not set.
    pub fn default_iterations(&self) -> u64 {
        match self {
            BackendKind::Redis | BackendKind::Memcache => 10_000,
            _ => 1_000,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown backend name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend: {0}")]
pub struct UnknownBackend(pub String);

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BackendKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownBackend(s.to_string()))
    }
}

/// A single datastore target.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Which datastore this is.
    pub kind: BackendKind,

    /// Connection URL or address, with or without a scheme.
    pub address: String,

    /// Writes per run in `count` mode.
    #[serde(default)]
    pub iterations: Option<u64>,

    /// Drop the table/collection/queue (or delete each key) after writing.
    #[serde(default = "default_teardown")]
    pub teardown: bool,
}

impl BackendConfig {
    pub fn new(kind: BackendKind, address: impl Into<String>) -> Self {
        Self {
            kind,
            address: address.into(),
            iterations: None,
            teardown: true,
        }
    }

    /// Configured iteration count, falling back to the backend default.
    pub fn iterations(&self) -> u64 {
        self.iterations
            .unwrap_or_else(|| self.kind.default_iterations())
    }
}

fn default_teardown() -> bool {
    true
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub log_filter: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Prometheus exporter bind address; disabled when absent.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "datastore_exerciser=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_address: None,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Seconds to wait for detached runs after the listener stops.
    pub drain_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { drain_secs: 30 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_kind_round_trips_through_path_names() {
        for kind in BackendKind::ALL {
            assert_eq!(kind.as_str().parse::<BackendKind>(), Ok(kind));
        }
        assert!("postgres".parse::<BackendKind>().is_err());
    }

    #[test]
    fn iterations_fall_back_to_backend_default() {
        let mut backend = BackendConfig::new(BackendKind::Redis, "localhost:6379");
        assert_eq!(backend.iterations(), 10_000);

        backend.iterations = Some(3);
        assert_eq!(backend.iterations(), 3);
    }

    #[test]
    fn toml_backend_defaults_to_teardown() {
        let config: ExerciserConfig = toml::from_str(
            r#"
            [[backends]]
            kind = "mysql"
            address = "root:pw@localhost/demo"
            "#,
        )
        .unwrap();

        let mysql = config.backend(BackendKind::Mysql).unwrap();
        assert!(mysql.teardown);
        assert_eq!(config.listener.port, 8080);
        assert_eq!(config.load.duration_secs, 900);
    }
}
