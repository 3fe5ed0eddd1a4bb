//! # Domain Layer - Confirmation Subsystem
//!
//! Pure in-memory logic for tracking issued certificates until confirmed.
//!
//! ## Components
//!
//! - `entities`: TransactionId, CertReqId, CertificateInfo, RevocationReason
//! - `digest`: CertHashAlgorithm and constant-time CertDigest
//! - `value_objects`: PendingEntry, PoolStatus, SweepOutcome
//! - `pool`: PendingCertificatePool (sharded, per-transaction atomic)
//! - `config`: ConfirmationConfig, ConfirmTimeoutPolicy, PoolLimits
//! - `errors`: ConfirmationError, IssuanceError, StoreError

pub mod config;
pub mod digest;
pub mod entities;
pub mod errors;
pub mod pool;
pub mod value_objects;

pub use config::*;
pub use digest::*;
pub use entities::*;
pub use errors::*;
pub use pool::*;
pub use value_objects::*;
