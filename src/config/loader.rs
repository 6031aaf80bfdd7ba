//! Configuration loading from the environment or from disk.

use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::{
    BackendConfig, BackendKind, ExecutionMode, ExerciserConfig, LoadMode, LogFormat,
};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Invalid configuration: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ExerciserConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ExerciserConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from process environment variables.
pub fn load_from_env() -> Result<ExerciserConfig, ConfigError> {
    load_from_lookup(|key| std::env::var(key).ok())
}

/// Load and validate configuration from an arbitrary variable source.
///
/// Every backend address variable is required. Parse failures and semantic
/// failures are collected together so one run reports everything.
pub fn load_from_lookup<F>(lookup: F) -> Result<ExerciserConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut env = EnvReader {
        lookup,
        errors: Vec::new(),
    };
    let mut config = ExerciserConfig::default();

    if let Some(host) = env.get("HOST") {
        config.listener.host = host;
    }
    if let Some(port) = env.number("PORT") {
        config.listener.port = port;
    }

    if let Some(mode) = env.choice("LOAD_MODE", &[("count", LoadMode::Count), ("time", LoadMode::Time)]) {
        config.load.mode = mode;
    }
    if let Some(secs) = env.number("LOAD_SEC") {
        config.load.duration_secs = secs;
    }
    if let Some(execution) = env.choice(
        "RUN_MODE",
        &[("blocking", ExecutionMode::Blocking), ("detached", ExecutionMode::Detached)],
    ) {
        config.load.execution = execution;
    }

    if let Some(format) = env.choice("LOG_FORMAT", &[("pretty", LogFormat::Pretty), ("json", LogFormat::Json)]) {
        config.observability.log_format = format;
    }
    config.observability.metrics_address = env.get("METRICS_ADDR");

    if let Some(secs) = env.number("SHUTDOWN_DRAIN_SEC") {
        config.shutdown.drain_secs = secs;
    }

    for kind in BackendKind::ALL {
        let vars = kind.address_vars();
        let Some(address) = vars.iter().find_map(|var| env.get(var)) else {
            env.errors
                .push(ValidationError::MissingVariable(vars.join(" or $")));
            continue;
        };

        let prefix = kind.env_prefix();
        let mut backend = BackendConfig::new(kind, address);
        backend.iterations = env.number(&format!("{prefix}_NUM"));
        if let Some(teardown) = env.flag(&format!("{prefix}_TEARDOWN")) {
            backend.teardown = teardown;
        }
        config.backends.push(backend);
    }

    let mut errors = env.errors;
    if let Err(semantic) = validate_config(&config) {
        // Missing addresses were already reported by name.
        let missing = errors_mention_missing(&errors);
        errors.extend(
            semantic
                .into_iter()
                .filter(|e| !(missing && *e == ValidationError::NoBackends)),
        );
    }

    if errors.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Validation(errors))
    }
}

fn errors_mention_missing(errors: &[ValidationError]) -> bool {
    errors
        .iter()
        .any(|e| matches!(e, ValidationError::MissingVariable(_)))
}

struct EnvReader<F> {
    lookup: F,
    errors: Vec<ValidationError>,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-empty, trimmed value of a variable.
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn number<T>(&mut self, key: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.get(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(var = key, error = %e, "Rejecting numeric variable");
                self.errors.push(ValidationError::InvalidNumber {
                    var: key.to_string(),
                    value: raw,
                });
                None
            }
        }
    }

    fn flag(&mut self, key: &str) -> Option<bool> {
        let raw = self.get(key)?;
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => {
                self.errors.push(ValidationError::InvalidFlag {
                    var: key.to_string(),
                    value: raw,
                });
                None
            }
        }
    }

    fn choice<T: Copy>(&mut self, key: &str, choices: &[(&str, T)]) -> Option<T> {
        let raw = self.get(key)?;
        let lowered = raw.to_ascii_lowercase();
        if let Some((_, value)) = choices.iter().find(|(name, _)| *name == lowered) {
            return Some(*value);
        }

        let expected = choices
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join("|");
        self.errors.push(ValidationError::InvalidChoice {
            var: key.to_string(),
            value: raw,
            expected,
        });
        None
    }
}
