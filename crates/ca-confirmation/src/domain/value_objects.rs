//! Value objects for the confirmation subsystem.
//!
//! Immutable records stored in and reported by the pending pool.

use super::digest::{CertDigest, CertHashAlgorithm};
use super::entities::{CertReqId, CertificateInfo, Timestamp, TransactionId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One issued certificate awaiting confirmation.
///
/// Equality and hashing use `(cert_req_id, cert_info identity)` only. The
/// deadline and digest never take part, so re-adding the same certificate for
/// the same request is a set no-op.
#[derive(Clone, Debug)]
pub struct PendingEntry {
    cert_req_id: CertReqId,
    wait_for_confirm_till: Timestamp,
    cert_info: Arc<CertificateInfo>,
    cert_digest: CertDigest,
}

impl PendingEntry {
    /// Builds an entry, digesting the encoded certificate once.
    pub fn new(
        cert_req_id: CertReqId,
        wait_for_confirm_till: Timestamp,
        cert_info: Arc<CertificateInfo>,
        hash_algorithm: CertHashAlgorithm,
    ) -> Self {
        let cert_digest = hash_algorithm.digest(cert_info.encoded_cert());
        Self {
            cert_req_id,
            wait_for_confirm_till,
            cert_info,
            cert_digest,
        }
    }

    pub fn cert_req_id(&self) -> &CertReqId {
        &self.cert_req_id
    }

    pub fn wait_for_confirm_till(&self) -> Timestamp {
        self.wait_for_confirm_till
    }

    pub fn cert_info(&self) -> &Arc<CertificateInfo> {
        &self.cert_info
    }

    pub fn cert_digest(&self) -> &CertDigest {
        &self.cert_digest
    }

    /// True once the deadline lies strictly before `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.wait_for_confirm_till < now
    }

    /// True if this entry belongs to `cert_req_id` and `presented` is its digest.
    pub fn matches(&self, cert_req_id: &CertReqId, presented: &[u8]) -> bool {
        // Digest comparison runs regardless of the id result
        let digest_ok = self.cert_digest.matches(presented);
        self.cert_req_id == *cert_req_id && digest_ok
    }

    pub fn into_cert_info(self) -> Arc<CertificateInfo> {
        self.cert_info
    }
}

impl PartialEq for PendingEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cert_req_id == other.cert_req_id && self.cert_info.id() == other.cert_info.id()
    }
}

impl Eq for PendingEntry {}

impl Hash for PendingEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cert_req_id.hash(state);
        self.cert_info.id().hash(state);
    }
}

/// Pool status snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// Number of pending entries across all transactions.
    pub pending_count: usize,
    /// Number of transactions with at least one pending entry.
    pub transaction_count: usize,
    /// Earliest confirmation deadline in the pool.
    pub oldest_deadline: Option<Timestamp>,
}

/// Certificates evicted by one sweep, grouped by owning transaction.
#[derive(Clone, Debug, Default)]
pub struct SweepOutcome {
    /// Certificates actually removed from the pool by this sweep.
    pub evicted: HashMap<TransactionId, HashSet<Arc<CertificateInfo>>>,
    /// Dispositions that completed successfully.
    pub disposed: usize,
    /// Dispositions that failed in the store.
    pub failed: usize,
    /// Dispositions that outlived `disposition_timeout` before completing.
    pub slow_dispositions: usize,
}

impl SweepOutcome {
    /// Total number of evicted certificates.
    pub fn evicted_count(&self) -> usize {
        self.evicted.values().map(HashSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty()
    }
}
