//! # Certificate Enrollment Confirmation
//!
//! Tracks certificates a CA has issued through CMP until the client confirms
//! them with a certConf message, and disposes of those whose confirmation
//! never arrives.
//!
//! ## Purpose
//!
//! A certificate returned in an ip/cp/kup response is not final until the
//! client acknowledges it with the digest of the exact certificate it
//! received. Between issuance and acknowledgement the certificate sits in the
//! `PendingCertificatePool`; a background `ConfirmationSweeper` revokes (or,
//! by policy, accepts) whatever stays unconfirmed past its deadline.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | Confirmation requires a matching certificate digest | `domain/value_objects.rs` - `PendingEntry::matches()` |
//! | Digest mismatch is indistinguishable from "not found" | `domain/pool.rs` - `remove_certificate()` returns `None` |
//! | Replayed issuance is never tracked twice | `domain/pool.rs` - `add_certificate()` already-issued check |
//! | Empty transactions are pruned | `domain/pool.rs` - `remove_certificate()` |
//! | Timeout scan never removes | `domain/pool.rs` - `remove_confirm_timeouted_certificates()` |
//! | Eviction precedes disposition | `service.rs` - `sweep()` |
//!
//! ## Confirmation Flow
//!
//! ```text
//!            issue               certConf (hash ok)
//! [REQUEST] ───────→ [PENDING] ─────────────────────→ [COMMITTED]
//!                       │  │
//!                       │  └── certConf reject / abort ──→ [REVOKED]
//!                       │
//!                       └── deadline passed (sweeper) ──→ [REVOKED | COMMITTED by policy]
//! ```
//!
//! | Stage | Method | Effect |
//! |-------|--------|--------|
//! | Track | `track_issued()` / `enroll()` | Entry added with `now + confirm_wait` |
//! | Confirm | `confirm()` | Entry removed, certificate committed |
//! | Reject | `reject()` | Entry removed, revocation requested |
//! | Abort | `abort()` | Transaction removed, all revoked |
//! | Sweep | `sweep()` | Expired transactions evicted, then disposed |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - NoOp/Logging stores, RejectingIssuer               │
//! │  service.rs - ConfirmationService                               │
//! │  sweeper.rs - ConfirmationSweeper background task               │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - ConfirmationApi trait                      │
//! │  ports/outbound.rs - CertificateIssuer, CertificateStore,       │
//! │                      TimeSource traits                          │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/entities.rs      - TransactionId, CertReqId, CertificateInfo │
//! │  domain/digest.rs        - CertHashAlgorithm, CertDigest        │
//! │  domain/pool.rs          - PendingCertificatePool               │
//! │  domain/value_objects.rs - PendingEntry, PoolStatus, SweepOutcome │
//! │  domain/config.rs        - ConfirmationConfig                   │
//! │  domain/errors.rs        - ConfirmationError                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;
pub mod sweeper;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
pub use service::{
    ConfirmationDependencies, ConfirmationService, ConfirmationStats, StatsSnapshot,
};
pub use sweeper::ConfirmationSweeper;
