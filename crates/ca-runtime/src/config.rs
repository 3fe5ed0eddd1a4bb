//! # Runtime Configuration
//!
//! Defaults, then an optional JSON file named by `CA_CONFIG_FILE`, then
//! individual environment overrides.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CA_CONFIRM_WAIT_SECS` | `confirmation.confirm_wait_secs` |
//! | `CA_SWEEP_INTERVAL_SECS` | `confirmation.sweep_interval_secs` |
//! | `CA_DISPOSITION_TIMEOUT_SECS` | `confirmation.disposition_timeout_secs` |
//! | `CA_TIMEOUT_POLICY` | `confirmation.timeout_policy` |
//! | `CA_CERT_HASH_ALGO` | `confirmation.hash_algorithm` |
//! | `CA_MAX_PER_TRANSACTION` | `confirmation.max_per_transaction` |
//! | `CA_MAX_PENDING` | `confirmation.max_pending` |
//! | `CA_LOG_LEVEL` | `logging.level` (`RUST_LOG` still wins) |
//! | `CA_LOG_JSON` | `logging.json` |

use anyhow::{anyhow, Context, Result};
use ca_confirmation::ConfirmationConfig;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

/// Environment variable naming the JSON configuration file.
pub const CONFIG_FILE_VAR: &str = "CA_CONFIG_FILE";

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Confirmation subsystem configuration.
    pub confirmation: ConfirmationConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl RuntimeConfig {
    /// Reads a JSON configuration file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Applies `CA_*` overrides looked up through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let c = &mut self.confirmation;
        if let Some(v) = parse_var(&lookup, "CA_CONFIRM_WAIT_SECS")? {
            c.confirm_wait_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "CA_SWEEP_INTERVAL_SECS")? {
            c.sweep_interval_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "CA_DISPOSITION_TIMEOUT_SECS")? {
            c.disposition_timeout_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "CA_TIMEOUT_POLICY")? {
            c.timeout_policy = v;
        }
        if let Some(v) = parse_var(&lookup, "CA_CERT_HASH_ALGO")? {
            c.hash_algorithm = v;
        }
        if let Some(v) = parse_var(&lookup, "CA_MAX_PER_TRANSACTION")? {
            c.max_per_transaction = v;
        }
        if let Some(v) = parse_var(&lookup, "CA_MAX_PENDING")? {
            c.max_pending = v;
        }

        if let Some(level) = lookup("CA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(v) = parse_var(&lookup, "CA_LOG_JSON")? {
            self.logging.json = v;
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid value {:?} for {}: {}", raw, key, e)),
    }
}

/// Loads configuration from the process environment.
pub fn load_config() -> Result<RuntimeConfig> {
    let mut config = match std::env::var_os(CONFIG_FILE_VAR) {
        Some(path) => RuntimeConfig::from_file(Path::new(&path))?,
        None => RuntimeConfig::default(),
    };
    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config
        .confirmation
        .validate()
        .context("invalid confirmation configuration")?;
    Ok(config)
}
