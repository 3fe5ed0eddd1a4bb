//! # Confirmation Service
//!
//! Implements `ConfirmationApi` on top of the pending pool.
//!
//! ## Architecture
//!
//! This service:
//! 1. Asks the issuer for certificates and tracks them until confirmed
//! 2. Commits confirmed certificates and revokes rejected or aborted ones
//! 3. Evicts timed out transactions before disposing of their certificates
//! 4. Uses dependency injection for the issuer, store and clock

use crate::domain::{
    CertReqId, CertificateInfo, ConfirmTimeoutPolicy, ConfirmationConfig, ConfirmationError,
    PendingCertificatePool, PoolStatus, RevocationReason, StoreError, SweepOutcome,
    TransactionId,
};
use crate::ports::inbound::ConfirmationApi;
use crate::ports::outbound::{CertificateIssuer, CertificateStore, IssuanceRequest, TimeSource};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Dependencies for the confirmation service.
pub struct ConfirmationDependencies<I, S> {
    pub issuer: I,
    pub store: S,
    pub time_source: Arc<dyn TimeSource>,
}

/// Lifetime counters of the confirmation service.
#[derive(Debug, Default)]
pub struct ConfirmationStats {
    /// Certificates added to the pending pool
    pub tracked: AtomicU64,
    /// Certificates confirmed by the client (or implicitly)
    pub confirmed: AtomicU64,
    /// Certificates the client refused
    pub rejected: AtomicU64,
    /// Certificates dropped by a transaction abort
    pub aborted: AtomicU64,
    /// Certificates evicted by a sweep
    pub timed_out: AtomicU64,
    /// Confirmations that matched nothing
    pub unknown_confirmations: AtomicU64,
}

impl ConfirmationStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            tracked: self.tracked.load(Ordering::Relaxed),
            confirmed: self.confirmed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            unknown_confirmations: self.unknown_confirmations.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `ConfirmationStats`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub tracked: u64,
    pub confirmed: u64,
    pub rejected: u64,
    pub aborted: u64,
    pub timed_out: u64,
    pub unknown_confirmations: u64,
}

/// The confirmation service.
pub struct ConfirmationService<I, S>
where
    I: CertificateIssuer,
    S: CertificateStore,
{
    issuer: I,
    store: S,
    pool: Arc<PendingCertificatePool>,
    time_source: Arc<dyn TimeSource>,
    config: ConfirmationConfig,
    stats: ConfirmationStats,
}

impl<I, S> ConfirmationService<I, S>
where
    I: CertificateIssuer,
    S: CertificateStore,
{
    /// Creates a service with an empty pool.
    ///
    /// # Errors
    /// - `InvalidConfig` if `config` fails validation
    pub fn new(
        deps: ConfirmationDependencies<I, S>,
        config: ConfirmationConfig,
    ) -> Result<Self, ConfirmationError> {
        config.validate()?;

        let pool = Arc::new(PendingCertificatePool::new(
            config.hash_algorithm,
            config.pool_limits(),
            Arc::clone(&deps.time_source),
        ));

        Ok(Self {
            issuer: deps.issuer,
            store: deps.store,
            pool,
            time_source: deps.time_source,
            config,
            stats: ConfirmationStats::default(),
        })
    }

    pub fn pool(&self) -> &Arc<PendingCertificatePool> {
        &self.pool
    }

    pub fn config(&self) -> &ConfirmationConfig {
        &self.config
    }

    pub fn stats(&self) -> &ConfirmationStats {
        &self.stats
    }

    fn deadline(&self) -> u64 {
        let wait_ms = u64::try_from(self.config.confirm_wait().as_millis()).unwrap_or(u64::MAX);
        self.time_source.now().saturating_add(wait_ms)
    }

    async fn dispose(&self, cert: Arc<CertificateInfo>) -> Result<(), StoreError> {
        match self.config.timeout_policy {
            ConfirmTimeoutPolicy::Revoke => {
                self.store
                    .revoke(cert, RevocationReason::CessationOfOperation)
                    .await
            }
            ConfirmTimeoutPolicy::Accept => self.store.commit(cert).await,
        }
    }
}

#[async_trait]
impl<I, S> ConfirmationApi for ConfirmationService<I, S>
where
    I: CertificateIssuer,
    S: CertificateStore,
{
    async fn enroll(
        &self,
        transaction_id: &TransactionId,
        cert_req_id: CertReqId,
        request: &IssuanceRequest,
    ) -> Result<Arc<CertificateInfo>, ConfirmationError> {
        let issued = Arc::new(self.issuer.issue(request).await?);

        if request.implicit_confirm {
            if !issued.is_already_issued() {
                self.store.commit(Arc::clone(&issued)).await?;
                self.stats.confirmed.fetch_add(1, Ordering::Relaxed);
            }
            debug!(
                transaction_id = %transaction_id,
                cert_req_id = %cert_req_id,
                serial = %issued.serial_hex(),
                "Certificate implicitly confirmed"
            );
            return Ok(issued);
        }

        if let Err(err) = self.track_issued(transaction_id, cert_req_id, Arc::clone(&issued)) {
            // Nobody can confirm it now
            if let Err(revoke_err) = self
                .store
                .revoke(Arc::clone(&issued), RevocationReason::CessationOfOperation)
                .await
            {
                warn!(
                    serial = %issued.serial_hex(),
                    error = %revoke_err,
                    "Failed to revoke untracked certificate"
                );
            }
            return Err(err);
        }

        Ok(issued)
    }

    fn track_issued(
        &self,
        transaction_id: &TransactionId,
        cert_req_id: CertReqId,
        cert_info: Arc<CertificateInfo>,
    ) -> Result<(), ConfirmationError> {
        let already_issued = cert_info.is_already_issued();
        self.pool
            .add_certificate(transaction_id, cert_req_id, cert_info, self.deadline())?;
        if !already_issued {
            self.stats.tracked.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    async fn confirm(
        &self,
        transaction_id: &TransactionId,
        cert_req_id: &CertReqId,
        cert_hash: &[u8],
    ) -> Result<Arc<CertificateInfo>, ConfirmationError> {
        let Some(cert) = self
            .pool
            .remove_certificate(transaction_id, cert_req_id, cert_hash)
        else {
            self.stats
                .unknown_confirmations
                .fetch_add(1, Ordering::Relaxed);
            warn!(
                transaction_id = %transaction_id,
                cert_req_id = %cert_req_id,
                "Confirmation matches no pending certificate"
            );
            return Err(ConfirmationError::UnknownConfirmation {
                transaction_id: transaction_id.clone(),
                cert_req_id: cert_req_id.clone(),
            });
        };

        self.store.commit(Arc::clone(&cert)).await.map_err(|err| {
            warn!(
                transaction_id = %transaction_id,
                serial = %cert.serial_hex(),
                error = %err,
                "Commit of confirmed certificate failed"
            );
            err
        })?;
        self.stats.confirmed.fetch_add(1, Ordering::Relaxed);

        info!(
            transaction_id = %transaction_id,
            cert_req_id = %cert_req_id,
            serial = %cert.serial_hex(),
            "Certificate confirmed"
        );
        Ok(cert)
    }

    async fn reject(
        &self,
        transaction_id: &TransactionId,
        cert_req_id: &CertReqId,
        cert_hash: &[u8],
    ) -> Result<Arc<CertificateInfo>, ConfirmationError> {
        let Some(cert) = self
            .pool
            .remove_certificate(transaction_id, cert_req_id, cert_hash)
        else {
            self.stats
                .unknown_confirmations
                .fetch_add(1, Ordering::Relaxed);
            warn!(
                transaction_id = %transaction_id,
                cert_req_id = %cert_req_id,
                "Rejection matches no pending certificate"
            );
            return Err(ConfirmationError::UnknownConfirmation {
                transaction_id: transaction_id.clone(),
                cert_req_id: cert_req_id.clone(),
            });
        };

        self.store
            .revoke(Arc::clone(&cert), RevocationReason::CessationOfOperation)
            .await?;
        self.stats.rejected.fetch_add(1, Ordering::Relaxed);

        info!(
            transaction_id = %transaction_id,
            cert_req_id = %cert_req_id,
            serial = %cert.serial_hex(),
            "Certificate rejected by client"
        );
        Ok(cert)
    }

    async fn abort(&self, transaction_id: &TransactionId) -> Result<usize, ConfirmationError> {
        let Some(certs) = self.pool.remove_certificates(transaction_id) else {
            return Ok(0);
        };
        let count = certs.len();
        self.stats.aborted.fetch_add(count as u64, Ordering::Relaxed);

        // Every certificate gets its revocation attempt; the first failure is reported
        let mut first_error = None;
        for cert in certs {
            let serial = cert.serial_hex();
            if let Err(err) = self
                .store
                .revoke(cert, RevocationReason::CessationOfOperation)
                .await
            {
                warn!(
                    transaction_id = %transaction_id,
                    serial = %serial,
                    error = %err,
                    "Failed to revoke aborted certificate"
                );
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }

        info!(transaction_id = %transaction_id, count, "Transaction aborted");
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(count),
        }
    }

    async fn sweep(&self) -> Result<SweepOutcome, ConfirmationError> {
        let mut outcome = SweepOutcome::default();

        // Evict first: a confirmation racing this sweep finds nothing and NACKs
        for transaction_id in self.pool.confirm_timeouted_transactions() {
            if let Some(certs) = self.pool.remove_certificates(&transaction_id) {
                outcome.evicted.insert(transaction_id, certs);
            }
        }

        if outcome.is_empty() {
            return Ok(outcome);
        }

        let evicted = outcome.evicted_count();
        self.stats
            .timed_out
            .fetch_add(evicted as u64, Ordering::Relaxed);

        let (mut disposed, mut failed, mut slow) = (0usize, 0usize, 0usize);
        for (transaction_id, certs) in &outcome.evicted {
            for cert in certs {
                let disposition = self.dispose(Arc::clone(cert));
                tokio::pin!(disposition);

                // A slow store is reported, never abandoned
                let result = match tokio::time::timeout(
                    self.config.disposition_timeout(),
                    &mut disposition,
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => {
                        slow += 1;
                        warn!(
                            transaction_id = %transaction_id,
                            serial = %cert.serial_hex(),
                            "Disposition exceeded its deadline, still waiting"
                        );
                        disposition.await
                    }
                };

                match result {
                    Ok(()) => disposed += 1,
                    Err(err) => {
                        failed += 1;
                        warn!(
                            transaction_id = %transaction_id,
                            serial = %cert.serial_hex(),
                            error = %err,
                            "Disposition of unconfirmed certificate failed"
                        );
                    }
                }
            }
        }

        outcome.disposed = disposed;
        outcome.failed = failed;
        outcome.slow_dispositions = slow;

        info!(
            transactions = outcome.evicted.len(),
            evicted,
            policy = ?self.config.timeout_policy,
            "Swept unconfirmed certificates"
        );
        Ok(outcome)
    }

    fn status(&self) -> PoolStatus {
        self.pool.status()
    }
}
