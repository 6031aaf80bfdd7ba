//! Datastore exerciser.
//!
//! # Architecture Overview
//!
//! ```text
//!     GET /{backend}
//!     ─────────────▶ http ──▶ runner (guard) ──▶ exercise ──▶ MySQL / PostgreSQL /
//!                                                             Redis / Memcache /
//!     302 Location: /                                         MongoDB / Cassandra /
//!     ◀───────────── http ◀── runner (join) ◀──────────────── RabbitMQ
//!
//!     config (env or TOML)   observability (tracing, Prometheus)   lifecycle
//! ```
//!
//! Configuration comes from the environment unless `--config` points at a
//! TOML file. It is validated before anything binds.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use datastore_exerciser::config::{self, ExerciserConfig};
use datastore_exerciser::lifecycle;
use datastore_exerciser::observability::logging;

#[derive(Parser)]
#[command(name = "datastore-exerciser")]
#[command(about = "Generate demo load against datastores on request", long_about = None)]
struct Cli {
    /// Read configuration from a TOML file instead of the environment
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listening port
    #[arg(short, long)]
    port: Option<u16>,
}

fn load(cli: &Cli) -> Result<ExerciserConfig, config::ConfigError> {
    match &cli.config {
        Some(path) => config::load_config(path),
        None => config::load_from_env(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    logging::init_logging(&config.observability);
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.listener.bind_address(),
        backends = config.backends.len(),
        "datastore-exerciser starting"
    );

    match lifecycle::start(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
