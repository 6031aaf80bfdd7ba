//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and the env loader handle syntax)
//! - Check every backend address can be turned into a connection target
//! - Validate value ranges (iterations > 0, time budget > 0)
//! - Detect backends configured twice
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ExerciserConfig → Result<(), Vec<ValidationError>>
//! - Runs before the server is constructed, so nothing binds on bad config

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::endpoint::{connection_url, CassandraTarget};
use crate::config::schema::{BackendKind, ExerciserConfig, LoadMode};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("${0} is required")]
    MissingVariable(String),

    #[error("${var} must be a number, got {value:?}")]
    InvalidNumber { var: String, value: String },

    #[error("${var} must be true or false, got {value:?}")]
    InvalidFlag { var: String, value: String },

    #[error("${var} must be one of {expected}, got {value:?}")]
    InvalidChoice {
        var: String,
        value: String,
        expected: String,
    },

    #[error("{0} address is empty")]
    EmptyAddress(BackendKind),

    #[error("{backend} address is invalid: {reason}")]
    InvalidAddress { backend: BackendKind, reason: String },

    #[error("metrics address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("{0} is configured more than once")]
    DuplicateBackend(BackendKind),

    #[error("{0} iterations must be greater than zero")]
    ZeroIterations(BackendKind),

    #[error("load duration must be greater than zero in time mode")]
    ZeroDuration,

    #[error("no backends configured")]
    NoBackends,
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &ExerciserConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        if !seen.insert(backend.kind) {
            errors.push(ValidationError::DuplicateBackend(backend.kind));
        }

        if backend.address.trim().is_empty() {
            errors.push(ValidationError::EmptyAddress(backend.kind));
        } else {
            let checked = match backend.kind {
                BackendKind::Cassandra => CassandraTarget::parse(&backend.address).map(|_| ()),
                kind => connection_url(kind, &backend.address).map(|_| ()),
            };
            if let Err(e) = checked {
                errors.push(ValidationError::InvalidAddress {
                    backend: backend.kind,
                    reason: e.to_string(),
                });
            }
        }

        if backend.iterations == Some(0) {
            errors.push(ValidationError::ZeroIterations(backend.kind));
        }
    }

    if config.load.mode == LoadMode::Time && config.load.duration_secs == 0 {
        errors.push(ValidationError::ZeroDuration);
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BackendConfig;

    fn config_with(backends: Vec<BackendConfig>) -> ExerciserConfig {
        ExerciserConfig {
            backends,
            ..Default::default()
        }
    }

    #[test]
    fn valid_config_passes() {
        let config = config_with(vec![
            BackendConfig::new(BackendKind::Mysql, "root:pw@db/demo"),
            BackendConfig::new(BackendKind::Cassandra, "c1,c2/ks"),
        ]);
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut redis = BackendConfig::new(BackendKind::Redis, "cache:6379");
        redis.iterations = Some(0);
        let mut config = config_with(vec![
            BackendConfig::new(BackendKind::Mysql, ""),
            BackendConfig::new(BackendKind::Mysql, "db/demo"),
            redis,
        ]);
        config.load.mode = LoadMode::Time;
        config.load.duration_secs = 0;
        config.observability.metrics_address = Some("nowhere".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyAddress(BackendKind::Mysql),
                ValidationError::DuplicateBackend(BackendKind::Mysql),
                ValidationError::ZeroIterations(BackendKind::Redis),
                ValidationError::ZeroDuration,
                ValidationError::InvalidMetricsAddress("nowhere".into()),
            ]
        );
    }

    #[test]
    fn empty_backend_list_is_rejected() {
        let errors = validate_config(&ExerciserConfig::default()).unwrap_err();
        assert_eq!(errors, vec![ValidationError::NoBackends]);
    }

    #[test]
    fn zero_duration_is_fine_in_count_mode() {
        let mut config = config_with(vec![BackendConfig::new(BackendKind::Redis, "cache:6379")]);
        config.load.duration_secs = 0;
        assert!(validate_config(&config).is_ok());
    }
}
