//! # Grant Telemetry
//!
//! Logging and metrics for the grant administration core.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an env filter, pretty or JSON output
//! - **Metrics**: Prometheus counters for operation outcomes, budget refusals
//!   and redeemed amounts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use grant_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     // Invoke grant operations; events and counters are now collected.
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `grant-ledger` | Service name in log lines |
//! | `GRANT_LOG_LEVEL` | `info` | Log level filter |
//! | `GRANT_JSON_LOGS` | `false` | One JSON object per line |
//! | `GRANT_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `GRANT_NETWORK` | `devnet` | Deployment network label |

#![warn(missing_docs)]

mod config;
mod logging;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    record_admission_rejection, record_cashed_out, record_operation, register_metrics,
    MetricsHandle, ADMISSION_REJECTIONS, CASHED_OUT, OPERATIONS, OPERATION_FAILURES,
};
pub use tracing_setup::TracingGuard;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber was already installed, or installation failed.
    #[error("Failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// The configuration could not be turned into a filter.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    let tracing = tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard { tracing, metrics })
}

/// Guard that keeps telemetry active.
#[derive(Debug)]
pub struct TelemetryGuard {
    tracing: TracingGuard,
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    /// Metrics registry handle, for exposition endpoints.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.tracing.service(), "Shutting down telemetry");
    }
}
