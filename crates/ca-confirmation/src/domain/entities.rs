//! Core domain entities for the confirmation subsystem.
//!
//! Identifiers of a CMP transaction and the issued certificate record handed
//! over by the issuance backend.

use super::errors::ConfirmationError;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use uuid::Uuid;

/// Timestamp in milliseconds since UNIX epoch.
pub type Timestamp = u64;

/// Opaque CMP transactionID.
///
/// Only ever compared and hashed; the bytes are never interpreted. Cloning is
/// cheap so the same identifier can key the pool and appear in reports.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TransactionId(Arc<[u8]>);

impl TransactionId {
    /// Creates a transaction identifier from raw bytes.
    ///
    /// # Errors
    /// - `EmptyTransactionId` if `bytes` is empty
    pub fn new(bytes: &[u8]) -> Result<Self, ConfirmationError> {
        if bytes.is_empty() {
            return Err(ConfirmationError::EmptyTransactionId);
        }
        Ok(Self(Arc::from(bytes)))
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self)
    }
}

/// CMP certReqId: an INTEGER of arbitrary size, unique within a transaction.
///
/// Stored as minimal big-endian two's-complement octets (the DER INTEGER
/// content), so numerically equal ids are byte-equal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CertReqId(Box<[u8]>);

impl CertReqId {
    /// Creates a certReqId from big-endian two's-complement octets.
    ///
    /// # Errors
    /// - `InvalidCertReqId` if `bytes` is empty
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, ConfirmationError> {
        if bytes.is_empty() {
            return Err(ConfirmationError::InvalidCertReqId(
                "INTEGER needs at least one content octet".to_string(),
            ));
        }
        Ok(Self(minimal_twos_complement(bytes).into()))
    }

    /// Returns the minimal big-endian two's-complement octets.
    pub fn as_be_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the value if it fits into an `i128`.
    pub fn to_i128(&self) -> Option<i128> {
        if self.0.len() > 16 {
            return None;
        }
        let fill = if self.0[0] & 0x80 != 0 { 0xFF } else { 0x00 };
        let mut buf = [fill; 16];
        buf[16 - self.0.len()..].copy_from_slice(&self.0);
        Some(i128::from_be_bytes(buf))
    }
}

/// Strips sign-extension octets that do not change the encoded value.
fn minimal_twos_complement(bytes: &[u8]) -> &[u8] {
    let mut start = 0;
    while start + 1 < bytes.len() {
        let (b, next) = (bytes[start], bytes[start + 1]);
        let redundant_zero = b == 0x00 && next & 0x80 == 0;
        let redundant_ones = b == 0xFF && next & 0x80 != 0;
        if !(redundant_zero || redundant_ones) {
            break;
        }
        start += 1;
    }
    &bytes[start..]
}

impl From<i128> for CertReqId {
    fn from(value: i128) -> Self {
        Self(minimal_twos_complement(&value.to_be_bytes()).into())
    }
}

macro_rules! cert_req_id_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for CertReqId {
                fn from(value: $t) -> Self {
                    Self::from(i128::from(value))
                }
            }
        )*
    };
}

cert_req_id_from_int!(i32, i64, u32, u64);

impl fmt::Display for CertReqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_i128() {
            Some(v) => write!(f, "{}", v),
            None => write!(f, "0x{}", hex::encode(&self.0)),
        }
    }
}

impl fmt::Debug for CertReqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CertReqId({})", self)
    }
}

/// A certificate produced by the issuance path.
///
/// Immutable once shared. Equality is identity: two records are equal only if
/// they stem from the same construction (same `id`), regardless of content.
#[derive(Clone, Debug)]
pub struct CertificateInfo {
    id: Uuid,
    serial_number: Vec<u8>,
    subject: String,
    profile: Option<String>,
    encoded_cert: Vec<u8>,
    already_issued: bool,
}

impl CertificateInfo {
    /// Creates a record for a freshly issued certificate.
    ///
    /// # Errors
    /// - `EmptyCertificate` if `encoded_cert` is empty
    pub fn new(
        serial_number: Vec<u8>,
        subject: impl Into<String>,
        encoded_cert: Vec<u8>,
    ) -> Result<Self, ConfirmationError> {
        if encoded_cert.is_empty() {
            return Err(ConfirmationError::EmptyCertificate);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            serial_number,
            subject: subject.into(),
            profile: None,
            encoded_cert,
            already_issued: false,
        })
    }

    /// Sets the certificate profile the certificate was issued under.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Marks this record as a replay of an earlier identical issuance.
    pub fn mark_already_issued(mut self) -> Self {
        self.already_issued = true;
        self
    }

    /// Identity of this record.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn serial_number(&self) -> &[u8] {
        &self.serial_number
    }

    /// Serial number as lowercase hex, for logs and store keys.
    pub fn serial_hex(&self) -> String {
        hex::encode(&self.serial_number)
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Canonical encoded (DER) form of the certificate.
    pub fn encoded_cert(&self) -> &[u8] {
        &self.encoded_cert
    }

    /// True if this certificate was already issued by a prior identical request.
    pub fn is_already_issued(&self) -> bool {
        self.already_issued
    }
}

impl PartialEq for CertificateInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CertificateInfo {}

impl Hash for CertificateInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Reason passed to the store when a pending certificate is withdrawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    Superseded,
    /// Client rejected, transaction aborted, or confirmation never arrived.
    CessationOfOperation,
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unspecified => "unspecified",
            Self::KeyCompromise => "keyCompromise",
            Self::Superseded => "superseded",
            Self::CessationOfOperation => "cessationOfOperation",
        };
        f.write_str(name)
    }
}
