//! Certificate store adapters.
//!
//! The real store (database, publisher queue) lives outside this crate; these
//! adapters cover hosts that only need the confirmation flow observable.

use crate::domain::{CertificateInfo, RevocationReason, StoreError};
use crate::ports::outbound::CertificateStore;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// No-op store for running without persistence.
#[derive(Debug, Clone, Default)]
pub struct NoOpCertificateStore;

#[async_trait]
impl CertificateStore for NoOpCertificateStore {
    async fn commit(&self, _cert: Arc<CertificateInfo>) -> Result<(), StoreError> {
        Ok(())
    }

    async fn revoke(
        &self,
        _cert: Arc<CertificateInfo>,
        _reason: RevocationReason,
    ) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Store that records every decision in the log.
#[derive(Debug, Clone, Default)]
pub struct LoggingCertificateStore;

#[async_trait]
impl CertificateStore for LoggingCertificateStore {
    async fn commit(&self, cert: Arc<CertificateInfo>) -> Result<(), StoreError> {
        info!(
            serial = %cert.serial_hex(),
            subject = cert.subject(),
            profile = cert.profile().unwrap_or("-"),
            "Certificate committed"
        );
        Ok(())
    }

    async fn revoke(
        &self,
        cert: Arc<CertificateInfo>,
        reason: RevocationReason,
    ) -> Result<(), StoreError> {
        info!(
            serial = %cert.serial_hex(),
            subject = cert.subject(),
            reason = %reason,
            "Certificate revocation requested"
        );
        Ok(())
    }
}

/// Recording store for testing.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingCertificateStore {
    pub committed: parking_lot::Mutex<Vec<Arc<CertificateInfo>>>,
    pub revoked: parking_lot::Mutex<Vec<(Arc<CertificateInfo>, RevocationReason)>>,
    pub fail_with: parking_lot::Mutex<Option<StoreError>>,
    pub delay: Option<std::time::Duration>,
}

#[cfg(test)]
impl RecordingCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slow(delay: std::time::Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn committed_count(&self) -> usize {
        self.committed.lock().len()
    }

    pub fn revoked_count(&self) -> usize {
        self.revoked.lock().len()
    }

    async fn pause(&self) -> Result<(), StoreError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_with.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CertificateStore for RecordingCertificateStore {
    async fn commit(&self, cert: Arc<CertificateInfo>) -> Result<(), StoreError> {
        self.pause().await?;
        self.committed.lock().push(cert);
        Ok(())
    }

    async fn revoke(
        &self,
        cert: Arc<CertificateInfo>,
        reason: RevocationReason,
    ) -> Result<(), StoreError> {
        self.pause().await?;
        self.revoked.lock().push((cert, reason));
        Ok(())
    }
}
