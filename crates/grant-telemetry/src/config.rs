//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Deployment network (devnet, testnet, mainnet)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "grant-ledger".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            network: "devnet".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: grant-ledger)
    /// - `GRANT_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `GRANT_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `GRANT_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `GRANT_NETWORK`: Network name (default: devnet)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "grant-ledger".to_string()),

            log_level: env::var("GRANT_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("GRANT_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("GRANT_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(is_container),

            network: env::var("GRANT_NETWORK").unwrap_or_else(|_| "devnet".to_string()),
        }
    }

    /// Service name qualified by network, e.g. `grant-ledger@testnet`.
    pub fn full_service_name(&self) -> String {
        if self.network.is_empty() {
            self.service_name.clone()
        } else {
            format!("{}@{}", self.service_name, self.network)
        }
    }
}

/// Interpret a boolean-ish environment value, falling back on anything unrecognised.
fn parse_flag(value: &str, fallback: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => fallback,
    }
}
