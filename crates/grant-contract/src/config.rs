//! Configuration for the grant contract.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! [contract]
//! key_namespace = "grant"
//! query_policy = "participants"     # or "open"
//! admin_queries = "grantor_organization"   # or "open"
//! cross_tier_uniqueness = false
//! timestamp_format = "%m-%d-%Y %H:%M:%S"
//! max_payment_items = 64
//!
//! [telemetry]
//! log_level = "info"
//! json_logs = false
//! ```

use chrono::format::{Item, StrftimeItems};
use grant_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Who may read a single grant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPolicy {
    /// Owner or rostered awardees only.
    #[default]
    Participants,
    /// Any caller.
    Open,
}

/// Who may run the cross-grant administrative queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminQueryPolicy {
    /// Callers attested under the Grantor organization.
    #[default]
    GrantorOrganization,
    /// Any caller.
    Open,
}

/// Contract configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Leading segment of every grant key.
    pub key_namespace: String,
    pub query_policy: QueryPolicy,
    pub admin_queries: AdminQueryPolicy,
    /// Reject an awardee ID already present in the other roster tier.
    pub cross_tier_uniqueness: bool,
    /// `chrono` format of payment dates.
    pub timestamp_format: String,
    /// Maximum item lines in one reimbursement request.
    pub max_payment_items: usize,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            key_namespace: "grant".to_string(),
            query_policy: QueryPolicy::Participants,
            admin_queries: AdminQueryPolicy::GrantorOrganization,
            cross_tier_uniqueness: false,
            timestamp_format: "%m-%d-%Y %H:%M:%S".to_string(),
            max_payment_items: 64,
        }
    }
}

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {error}")]
    Io { path: String, error: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Whole configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub contract: ContractConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl ConfigFile {
    /// Load and validate a TOML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse and validate TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        file.contract.validate()?;
        Ok(file)
    }
}

impl ContractConfig {
    /// Parse the `[contract]` section of a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        ConfigFile::parse(content).map(|file| file.contract)
    }

    /// Load the `[contract]` section of a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigFile::load(path).map(|file| file.contract)
    }

    /// Reject settings the contract cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_namespace.is_empty() || self.key_namespace.contains('\u{0}') {
            return Err(ConfigError::Invalid(
                "key_namespace must be non-empty and free of NUL".into(),
            ));
        }
        if self.max_payment_items == 0 {
            return Err(ConfigError::Invalid(
                "max_payment_items must be at least 1".into(),
            ));
        }
        if self.timestamp_format.trim().is_empty()
            || StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error))
        {
            return Err(ConfigError::Invalid(format!(
                "timestamp_format {:?} is not a valid strftime pattern",
                self.timestamp_format
            )));
        }
        Ok(())
    }

    /// Apply `GRANT_*` environment overrides on top of this config.
    ///
    /// - `GRANT_KEY_NAMESPACE`
    /// - `GRANT_QUERY_POLICY` (`participants` | `open`)
    /// - `GRANT_CROSS_TIER_UNIQUENESS` (`true` | `false`)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(ns) = std::env::var("GRANT_KEY_NAMESPACE") {
            self.key_namespace = ns;
        }
        if let Ok(policy) = std::env::var("GRANT_QUERY_POLICY") {
            match policy.to_lowercase().as_str() {
                "open" => self.query_policy = QueryPolicy::Open,
                "participants" => self.query_policy = QueryPolicy::Participants,
                _ => {}
            }
        }
        if let Ok(flag) = std::env::var("GRANT_CROSS_TIER_UNIQUENESS") {
            self.cross_tier_uniqueness = flag == "1" || flag.eq_ignore_ascii_case("true");
        }
        self
    }
}
