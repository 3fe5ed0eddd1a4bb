//! Adapters layer for the confirmation subsystem.
//!
//! Stand-in collaborators for hosts without a real signer or store.

pub mod issuer;
pub mod store;

pub use issuer::RejectingIssuer;
pub use store::{LoggingCertificateStore, NoOpCertificateStore};
