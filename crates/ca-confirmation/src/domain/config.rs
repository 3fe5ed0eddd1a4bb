//! Confirmation subsystem configuration.

use super::digest::CertHashAlgorithm;
use super::errors::ConfirmationError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// What the sweeper does with a certificate whose confirmation never arrived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmTimeoutPolicy {
    /// Revoke: only confirmed certificates are considered valid.
    #[default]
    Revoke,
    /// Accept: commit the certificate as final without confirmation.
    Accept,
}

impl FromStr for ConfirmTimeoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revoke" => Ok(Self::Revoke),
            "accept" => Ok(Self::Accept),
            other => Err(format!("unknown confirm timeout policy: {}", other)),
        }
    }
}

/// Capacity limits of the pending pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolLimits {
    /// Maximum pending certificates per transaction.
    pub max_per_transaction: usize,
    /// Maximum pending certificates across all transactions.
    pub max_pending: usize,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            max_per_transaction: 16,
            max_pending: 100_000,
        }
    }
}

/// Confirmation configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// How long a client has to confirm an issued certificate (seconds).
    pub confirm_wait_secs: u64,
    /// Interval between sweeps for unconfirmed certificates (seconds).
    pub sweep_interval_secs: u64,
    /// Time after which one disposition is logged as slow (seconds).
    pub disposition_timeout_secs: u64,
    /// Disposition of timed out certificates.
    pub timeout_policy: ConfirmTimeoutPolicy,
    /// Digest algorithm binding certConf messages to issued certificates.
    pub hash_algorithm: CertHashAlgorithm,
    /// Maximum pending certificates per transaction.
    pub max_per_transaction: usize,
    /// Maximum pending certificates in the pool.
    pub max_pending: usize,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        let limits = PoolLimits::default();
        Self {
            confirm_wait_secs: 300,
            sweep_interval_secs: 10,
            disposition_timeout_secs: 5,
            timeout_policy: ConfirmTimeoutPolicy::Revoke,
            hash_algorithm: CertHashAlgorithm::Sha256,
            max_per_transaction: limits.max_per_transaction,
            max_pending: limits.max_pending,
        }
    }
}

impl ConfirmationConfig {
    pub fn confirm_wait(&self) -> Duration {
        Duration::from_secs(self.confirm_wait_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn disposition_timeout(&self) -> Duration {
        Duration::from_secs(self.disposition_timeout_secs)
    }

    pub fn pool_limits(&self) -> PoolLimits {
        PoolLimits {
            max_per_transaction: self.max_per_transaction,
            max_pending: self.max_pending,
        }
    }

    /// Rejects zero durations and zero limits.
    pub fn validate(&self) -> Result<(), ConfirmationError> {
        let checks = [
            (self.confirm_wait_secs == 0, "confirm_wait_secs must be positive"),
            (self.sweep_interval_secs == 0, "sweep_interval_secs must be positive"),
            (
                self.disposition_timeout_secs == 0,
                "disposition_timeout_secs must be positive",
            ),
            (
                self.max_per_transaction == 0,
                "max_per_transaction must be positive",
            ),
            (self.max_pending == 0, "max_pending must be positive"),
        ];

        match checks.iter().find(|(failed, _)| *failed) {
            Some((_, msg)) => Err(ConfirmationError::InvalidConfig(msg.to_string())),
            None => Ok(()),
        }
    }
}
