//! Outbound (Driven) ports for the confirmation subsystem.
//!
//! These traits define dependencies on collaborators outside the subsystem:
//! the signing backend that issues certificates, the store that finalizes or
//! revokes them, and the clock.

use crate::domain::{
    CertificateInfo, IssuanceError, RevocationReason, StoreError, Timestamp,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Manually driven time source.
///
/// Used by tests and by callers replaying recorded traffic.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    time: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, time: Timestamp) {
        self.time.store(time, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(Ordering::SeqCst)
    }
}

/// Enrollment request forwarded to the issuance backend.
///
/// The CMP layer has already parsed and verified the request; only the parts
/// the signer needs are carried here.
#[derive(Clone, Debug, Default)]
pub struct IssuanceRequest {
    /// Requested subject distinguished name.
    pub subject: String,
    /// Certificate profile to issue under.
    pub profile: Option<String>,
    /// Encoded SubjectPublicKeyInfo.
    pub public_key: Vec<u8>,
    /// Client asked for implicit confirmation (no certConf round trip).
    pub implicit_confirm: bool,
}

/// Issuance backend (local key or PKCS#11-backed HSM slot).
#[async_trait]
pub trait CertificateIssuer: Send + Sync {
    /// Signs a certificate for `request`.
    ///
    /// A replayed request for an already issued certificate returns a record
    /// with `is_already_issued() == true`.
    async fn issue(&self, request: &IssuanceRequest) -> Result<CertificateInfo, IssuanceError>;
}

/// Final certificate store.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Marks a certificate as final (confirmed or accepted).
    async fn commit(&self, cert: Arc<CertificateInfo>) -> Result<(), StoreError>;

    /// Requests revocation of a certificate that will never be confirmed.
    async fn revoke(
        &self,
        cert: Arc<CertificateInfo>,
        reason: RevocationReason,
    ) -> Result<(), StoreError>;
}
