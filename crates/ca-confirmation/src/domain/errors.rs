//! Confirmation error types.
//!
//! Pool lookups that find nothing return `None`; everything here is either a
//! contract violation by the caller, a capacity limit, or a collaborator
//! failure surfaced by the service layer.

use super::entities::{CertReqId, TransactionId};
use thiserror::Error;

/// Confirmation subsystem error type.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfirmationError {
    /// Transaction identifiers must carry at least one byte.
    #[error("Transaction ID must not be empty")]
    EmptyTransactionId,

    /// The certReqId could not be decoded as an INTEGER.
    #[error("Invalid certReqId: {0}")]
    InvalidCertReqId(String),

    /// Issued certificate has no encoded form to digest.
    #[error("Encoded certificate must not be empty")]
    EmptyCertificate,

    /// Transaction already tracks the maximum number of certificates.
    #[error("Transaction {transaction_id} reached limit of {limit} pending certificates")]
    TransactionLimitReached {
        transaction_id: TransactionId,
        limit: usize,
    },

    /// Pool has reached its global capacity.
    #[error("Pending pool full at {capacity} certificates")]
    PoolFull { capacity: usize },

    /// No pending certificate matched the presented request and hash.
    ///
    /// Deliberately covers both "unknown certReqId" and "wrong certHash".
    #[error("No pending certificate for transaction {transaction_id}, certReqId {cert_req_id}")]
    UnknownConfirmation {
        transaction_id: TransactionId,
        cert_req_id: CertReqId,
    },

    /// The issuance backend failed.
    #[error("Issuance failed: {0}")]
    Issuance(#[from] IssuanceError),

    /// The certificate store failed to commit or revoke.
    #[error("Certificate store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration rejected by `ConfirmationConfig::validate`.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Failure reported by a `CertificateIssuer`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IssuanceError {
    /// No signer is available (HSM slot offline, key not loaded).
    #[error("Signer unavailable: {0}")]
    SignerUnavailable(String),

    /// The request was refused by the certificate profile.
    #[error("Request rejected by profile: {0}")]
    Rejected(String),

    /// Any other backend failure.
    #[error("Internal issuance error: {0}")]
    Internal(String),
}

/// Failure reported by a `CertificateStore`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The certificate is unknown to the store.
    #[error("Certificate not found: serial {0}")]
    NotFound(String),

    /// Any other store failure.
    #[error("Internal store error: {0}")]
    Internal(String),
}
