//! # Inbound Port - ConfirmationApi
//!
//! Primary driving port used by the CMP protocol handler and the sweeper.
//!
//! | Method | Caller | Trigger |
//! |--------|--------|---------|
//! | `enroll` | Protocol handler | ir/cr/kur/p10cr request |
//! | `track_issued` | Protocol handler | certificate issued elsewhere |
//! | `confirm` | Protocol handler | certConf accepting a certificate |
//! | `reject` | Protocol handler | certConf rejecting a certificate |
//! | `abort` | Protocol handler | error message or transaction close |
//! | `sweep` | ConfirmationSweeper | periodic tick |

use crate::domain::{
    CertReqId, CertificateInfo, ConfirmationError, PoolStatus, SweepOutcome, TransactionId,
};
use crate::ports::outbound::IssuanceRequest;
use async_trait::async_trait;
use std::sync::Arc;

/// Primary API for the confirmation subsystem.
///
/// # Example
///
/// ```rust,ignore
/// use ca_confirmation::ports::ConfirmationApi;
///
/// async fn example(api: &impl ConfirmationApi, tid: TransactionId, request: IssuanceRequest) {
///     let cert = api.enroll(&tid, CertReqId::from(1), &request).await?;
///
///     // ... CMP response sent, client answers with certConf ...
///     let hash = client_cert_hash(&cert);
///     api.confirm(&tid, &CertReqId::from(1), &hash).await?;
/// }
/// ```
#[async_trait]
pub trait ConfirmationApi: Send + Sync {
    /// Issues a certificate and, unless implicit confirmation was requested,
    /// tracks it until confirmed.
    ///
    /// # Errors
    /// - `Issuance`: the signer failed
    /// - `Store`: implicit confirmation could not be committed
    /// - `TransactionLimitReached` / `PoolFull`: capacity exhausted
    async fn enroll(
        &self,
        transaction_id: &TransactionId,
        cert_req_id: CertReqId,
        request: &IssuanceRequest,
    ) -> Result<Arc<CertificateInfo>, ConfirmationError>;

    /// Tracks a certificate issued by the caller, with the configured
    /// confirmation deadline.
    fn track_issued(
        &self,
        transaction_id: &TransactionId,
        cert_req_id: CertReqId,
        cert_info: Arc<CertificateInfo>,
    ) -> Result<(), ConfirmationError>;

    /// Confirms a pending certificate and commits it.
    ///
    /// # Errors
    /// - `UnknownConfirmation`: nothing pending for this request and hash
    /// - `Store`: commit failed (the certificate is no longer pending)
    async fn confirm(
        &self,
        transaction_id: &TransactionId,
        cert_req_id: &CertReqId,
        cert_hash: &[u8],
    ) -> Result<Arc<CertificateInfo>, ConfirmationError>;

    /// Withdraws a pending certificate the client refused.
    ///
    /// # Errors
    /// - `UnknownConfirmation`: nothing pending for this request and hash
    /// - `Store`: revocation request failed
    async fn reject(
        &self,
        transaction_id: &TransactionId,
        cert_req_id: &CertReqId,
        cert_hash: &[u8],
    ) -> Result<Arc<CertificateInfo>, ConfirmationError>;

    /// Abandons every pending certificate of a transaction.
    ///
    /// Returns the number of certificates withdrawn.
    async fn abort(&self, transaction_id: &TransactionId) -> Result<usize, ConfirmationError>;

    /// Evicts transactions with expired certificates and disposes of them.
    async fn sweep(&self) -> Result<SweepOutcome, ConfirmationError>;

    /// Gets the current pool status.
    fn status(&self) -> PoolStatus;
}
