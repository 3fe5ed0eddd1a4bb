//! Issuance backend adapters.

use crate::domain::{CertificateInfo, IssuanceError};
use crate::ports::outbound::{CertificateIssuer, IssuanceRequest};
use async_trait::async_trait;
use tracing::warn;

/// Issuer used when no signer is configured.
///
/// Refuses every request, so enrollment fails cleanly while confirmations
/// and sweeps for certificates tracked through `track_issued` keep working.
#[derive(Debug, Clone, Default)]
pub struct RejectingIssuer;

#[async_trait]
impl CertificateIssuer for RejectingIssuer {
    async fn issue(&self, request: &IssuanceRequest) -> Result<CertificateInfo, IssuanceError> {
        warn!(subject = %request.subject, "Issuance requested but no signer is configured");
        Err(IssuanceError::SignerUnavailable(
            "no signer configured".to_string(),
        ))
    }
}

/// Issuer that signs nothing and returns a fixed encoding per subject.
#[cfg(test)]
#[derive(Default)]
pub struct StaticIssuer {
    pub issued: std::sync::atomic::AtomicU64,
    pub replay: bool,
}

#[cfg(test)]
#[async_trait]
impl CertificateIssuer for StaticIssuer {
    async fn issue(&self, request: &IssuanceRequest) -> Result<CertificateInfo, IssuanceError> {
        let serial = self
            .issued
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        let encoded = format!("{}#{}", request.subject, serial).into_bytes();
        let info = CertificateInfo::new(serial.to_be_bytes().to_vec(), &request.subject, encoded)
            .map_err(|e| IssuanceError::Internal(e.to_string()))?;
        Ok(if self.replay {
            info.mark_already_issued()
        } else {
            info
        })
    }
}
