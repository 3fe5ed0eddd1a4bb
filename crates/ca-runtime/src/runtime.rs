//! # CA Runtime
//!
//! Owns the confirmation service and its sweeper.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration and build the service
//! 2. Spawn the confirmation sweeper
//!
//! ## Shutdown Sequence
//!
//! 1. Stop the sweeper, letting an in-flight sweep finish
//! 2. Log final pool status and counters

use anyhow::{Context, Result};
use ca_confirmation::{
    CertificateIssuer, CertificateStore, ConfirmationApi, ConfirmationDependencies,
    ConfirmationService, ConfirmationSweeper, LoggingCertificateStore, RejectingIssuer,
    SystemTimeSource,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use crate::config::RuntimeConfig;

/// Host for one confirmation service.
pub struct CaRuntime<I = RejectingIssuer, S = LoggingCertificateStore>
where
    I: CertificateIssuer + 'static,
    S: CertificateStore + 'static,
{
    service: Arc<ConfirmationService<I, S>>,
    sweeper: Mutex<Option<ConfirmationSweeper>>,
    config: RuntimeConfig,
}

impl CaRuntime {
    /// Creates a runtime without a signer, logging every store decision.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let deps = ConfirmationDependencies {
            issuer: RejectingIssuer,
            store: LoggingCertificateStore,
            time_source: Arc::new(SystemTimeSource),
        };
        Self::with_dependencies(deps, config)
    }
}

impl<I, S> CaRuntime<I, S>
where
    I: CertificateIssuer + 'static,
    S: CertificateStore + 'static,
{
    pub fn with_dependencies(
        deps: ConfirmationDependencies<I, S>,
        config: RuntimeConfig,
    ) -> Result<Self> {
        let service = ConfirmationService::new(deps, config.confirmation.clone())
            .context("failed to build confirmation service")?;

        Ok(Self {
            service: Arc::new(service),
            sweeper: Mutex::new(None),
            config,
        })
    }

    /// Starts the sweeper. Calling it twice keeps the first sweeper.
    pub fn start(&self) {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            return;
        }

        let c = &self.config.confirmation;
        info!(
            confirm_wait_secs = c.confirm_wait_secs,
            sweep_interval_secs = c.sweep_interval_secs,
            policy = ?c.timeout_policy,
            hash_algorithm = %c.hash_algorithm,
            "Starting confirmation subsystem"
        );

        let api: Arc<dyn ConfirmationApi> = self.service.clone();
        *sweeper = Some(ConfirmationSweeper::spawn(api, c.sweep_interval()));
    }

    pub fn is_running(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(ConfirmationSweeper::is_running)
    }

    /// Stops the sweeper and reports what is still pending.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        let sweeper = self.sweeper.lock().take();
        if let Some(sweeper) = sweeper {
            sweeper.shutdown().await;
        }

        let status = self.service.status();
        let stats = self.service.stats().snapshot();
        info!(
            pending = status.pending_count,
            transactions = status.transaction_count,
            stats = %serde_json::to_string(&stats).unwrap_or_default(),
            "Shutdown complete"
        );
    }

    pub fn service(&self) -> Arc<ConfirmationService<I, S>> {
        Arc::clone(&self.service)
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}
