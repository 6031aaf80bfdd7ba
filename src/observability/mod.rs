//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Prometheus scrape endpoint (METRICS_ADDR)
//! ```
//!
//! # Design Decisions
//! - Structured fields (backend, writes, elapsed_ms) rather than formatted text
//! - Request ID set by tower-http and echoed on every response
//! - Metrics are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
