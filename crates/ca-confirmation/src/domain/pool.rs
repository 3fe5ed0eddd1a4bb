//! # Pending Certificate Pool
//!
//! Registry of issued certificates awaiting client confirmation, keyed by
//! CMP transaction.
//!
//! ## Data Structures
//!
//! - `pending`: sharded map `TransactionId -> HashSet<PendingEntry>`
//! - `reserved`: slot counter enforcing the global capacity
//!
//! ## Invariants Enforced
//!
//! - A transaction key exists iff it owns at least one entry (pruned on removal)
//! - At most one entry per `(cert_req_id, certificate identity)` per transaction
//! - Entries are never mutated; they are inserted and removed whole
//! - Confirmation removes an entry only if the presented digest matches
//!
//! ## Concurrency
//!
//! Every operation on one transaction runs under that key's shard write lock,
//! so it is atomic with respect to every other operation on the same
//! transaction. Sweeps take shard read locks one shard at a time.

use super::config::PoolLimits;
use super::digest::CertHashAlgorithm;
use super::entities::{CertReqId, CertificateInfo, Timestamp, TransactionId};
use super::errors::ConfirmationError;
use super::value_objects::{PendingEntry, PoolStatus};
use crate::ports::outbound::{SystemTimeSource, TimeSource};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Concurrency-safe pool of issued-but-unconfirmed certificates.
pub struct PendingCertificatePool {
    /// Pending entries grouped by transaction.
    pending: DashMap<TransactionId, HashSet<PendingEntry>>,
    /// Slots taken against `limits.max_pending`.
    reserved: AtomicUsize,
    /// Digest algorithm for binding confirmations.
    hash_algorithm: CertHashAlgorithm,
    /// Capacity limits.
    limits: PoolLimits,
    /// Clock used to decide expiry.
    time_source: Arc<dyn TimeSource>,
}

impl PendingCertificatePool {
    /// Creates an empty pool.
    pub fn new(
        hash_algorithm: CertHashAlgorithm,
        limits: PoolLimits,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            pending: DashMap::new(),
            reserved: AtomicUsize::new(0),
            hash_algorithm,
            limits: PoolLimits {
                max_per_transaction: limits.max_per_transaction.max(1),
                max_pending: limits.max_pending.max(1),
            },
            time_source,
        }
    }

    /// Creates a pool with SHA-256 digests, default limits and the system clock.
    pub fn with_defaults() -> Self {
        Self::new(
            CertHashAlgorithm::default(),
            PoolLimits::default(),
            Arc::new(SystemTimeSource),
        )
    }

    pub fn hash_algorithm(&self) -> CertHashAlgorithm {
        self.hash_algorithm
    }

    pub fn limits(&self) -> PoolLimits {
        self.limits
    }

    /// Starts tracking an issued certificate until `wait_for_confirm_till`.
    ///
    /// Already-issued certificates are ignored: they were tracked or
    /// finalized by the original request. Adding an entry equal to one already
    /// pending is a no-op.
    ///
    /// # Errors
    /// - `PoolFull` if the pool holds `max_pending` entries
    /// - `TransactionLimitReached` if the transaction holds `max_per_transaction` entries
    pub fn add_certificate(
        &self,
        transaction_id: &TransactionId,
        cert_req_id: CertReqId,
        cert_info: Arc<CertificateInfo>,
        wait_for_confirm_till: Timestamp,
    ) -> Result<(), ConfirmationError> {
        if cert_info.is_already_issued() {
            debug!(
                transaction_id = %transaction_id,
                cert_req_id = %cert_req_id,
                serial = %cert_info.serial_hex(),
                "Skipping already issued certificate"
            );
            return Ok(());
        }

        // Digest outside any lock
        let entry = PendingEntry::new(
            cert_req_id,
            wait_for_confirm_till,
            cert_info,
            self.hash_algorithm,
        );

        self.reserve_slot()?;

        let mut entries = self.pending.entry(transaction_id.clone()).or_default();
        if entries.contains(&entry) {
            drop(entries);
            self.release_slots(1);
            return Ok(());
        }
        if entries.len() >= self.limits.max_per_transaction {
            drop(entries);
            self.release_slots(1);
            return Err(ConfirmationError::TransactionLimitReached {
                transaction_id: transaction_id.clone(),
                limit: self.limits.max_per_transaction,
            });
        }

        trace!(
            transaction_id = %transaction_id,
            cert_req_id = %entry.cert_req_id(),
            deadline = wait_for_confirm_till,
            "Tracking pending certificate"
        );
        entries.insert(entry);
        Ok(())
    }

    /// Removes and returns the certificate confirmed by `presented_digest`.
    ///
    /// Returns `None` if the transaction is unknown, no entry has this
    /// `cert_req_id`, or the digest does not match. A digest mismatch leaves
    /// the entry in place.
    pub fn remove_certificate(
        &self,
        transaction_id: &TransactionId,
        cert_req_id: &CertReqId,
        presented_digest: &[u8],
    ) -> Option<Arc<CertificateInfo>> {
        let Entry::Occupied(mut occupied) = self.pending.entry(transaction_id.clone()) else {
            return None;
        };

        let matched = occupied
            .get()
            .iter()
            .find(|entry| entry.matches(cert_req_id, presented_digest))
            .cloned()?;

        occupied.get_mut().remove(&matched);
        if occupied.get().is_empty() {
            occupied.remove();
        }
        self.release_slots(1);

        Some(matched.into_cert_info())
    }

    /// Removes and returns every pending certificate of a transaction.
    ///
    /// Returns `None` if the transaction had no pending certificates.
    pub fn remove_certificates(
        &self,
        transaction_id: &TransactionId,
    ) -> Option<HashSet<Arc<CertificateInfo>>> {
        let (_, entries) = self.pending.remove(transaction_id)?;
        self.release_slots(entries.len());

        Some(
            entries
                .into_iter()
                .map(PendingEntry::into_cert_info)
                .collect(),
        )
    }

    /// Reports every certificate whose confirmation deadline has passed.
    ///
    /// Nothing is removed: callers evict the owning transactions with
    /// `remove_certificates` once they act on the timeout. Returns `None` if
    /// the pool is empty.
    pub fn remove_confirm_timeouted_certificates(
        &self,
    ) -> Option<HashSet<Arc<CertificateInfo>>> {
        if self.pending.is_empty() {
            return None;
        }

        let now = self.time_source.now();
        let expired = self
            .pending
            .iter()
            .flat_map(|shard_ref| {
                shard_ref
                    .value()
                    .iter()
                    .filter(|entry| entry.is_expired(now))
                    .map(|entry| Arc::clone(entry.cert_info()))
                    .collect::<Vec<_>>()
            })
            .collect();

        Some(expired)
    }

    /// Transactions owning at least one entry past its deadline.
    pub fn confirm_timeouted_transactions(&self) -> Vec<TransactionId> {
        let now = self.time_source.now();
        self.pending
            .iter()
            .filter(|shard_ref| shard_ref.value().iter().any(|e| e.is_expired(now)))
            .map(|shard_ref| shard_ref.key().clone())
            .collect()
    }

    /// Checks if a certificate is pending for `cert_req_id` in a transaction.
    pub fn contains(&self, transaction_id: &TransactionId, cert_req_id: &CertReqId) -> bool {
        self.pending
            .get(transaction_id)
            .map(|entries| entries.iter().any(|e| e.cert_req_id() == cert_req_id))
            .unwrap_or(false)
    }

    /// Returns the number of pending entries.
    pub fn len(&self) -> usize {
        self.pending.iter().map(|shard_ref| shard_ref.value().len()).sum()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns the number of transactions with pending entries.
    pub fn transaction_count(&self) -> usize {
        self.pending.len()
    }

    /// Gets the pool status.
    pub fn status(&self) -> PoolStatus {
        let mut status = PoolStatus::default();
        for shard_ref in self.pending.iter() {
            status.transaction_count += 1;
            for entry in shard_ref.value() {
                status.pending_count += 1;
                let deadline = entry.wait_for_confirm_till();
                status.oldest_deadline = Some(
                    status
                        .oldest_deadline
                        .map_or(deadline, |oldest| oldest.min(deadline)),
                );
            }
        }
        status
    }

    fn reserve_slot(&self) -> Result<(), ConfirmationError> {
        let capacity = self.limits.max_pending;
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |taken| {
                (taken < capacity).then_some(taken + 1)
            })
            .map(|_| ())
            .map_err(|_| ConfirmationError::PoolFull { capacity })
    }

    fn release_slots(&self, count: usize) {
        self.reserved.fetch_sub(count, Ordering::AcqRel);
    }
}

impl std::fmt::Debug for PendingCertificatePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCertificatePool")
            .field("transactions", &self.pending.len())
            .field("hash_algorithm", &self.hash_algorithm)
            .field("limits", &self.limits)
            .finish()
    }
}
