//! # Integration Test Flows
//!
//! End-to-end confirmation flows through the public API of `ca-confirmation`.
//!
//! ## Flows Tested:
//!
//! 1. **Pool contract**: add, hash-bound confirmation, bulk removal
//! 2. **Service**: enrollment, certConf accept/reject, abort, NACKs
//! 3. **Sweeper**: unconfirmed certificates disposed exactly once

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use ca_confirmation::{
        CertHashAlgorithm, CertReqId, CertificateInfo, CertificateIssuer, CertificateStore,
        ConfirmTimeoutPolicy, ConfirmationApi, ConfirmationConfig, ConfirmationDependencies,
        ConfirmationError, ConfirmationService, ConfirmationSweeper, IssuanceError,
        IssuanceRequest, ManualTimeSource, PendingCertificatePool, PoolLimits, RevocationReason,
        StoreError, TransactionId,
    };
    use parking_lot::Mutex;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const NOW: u64 = 1_700_000_000_000;

    /// Issuer producing a distinct encoding per request.
    #[derive(Default)]
    struct SequentialIssuer {
        next_serial: Mutex<u64>,
    }

    #[async_trait]
    impl CertificateIssuer for SequentialIssuer {
        async fn issue(
            &self,
            request: &IssuanceRequest,
        ) -> Result<CertificateInfo, IssuanceError> {
            let serial = {
                let mut next = self.next_serial.lock();
                *next += 1;
                *next
            };
            let mut encoded = request.public_key.clone();
            encoded.extend_from_slice(&serial.to_be_bytes());
            let info = CertificateInfo::new(
                serial.to_be_bytes().to_vec(),
                request.subject.clone(),
                encoded,
            )
            .map_err(|e| IssuanceError::Internal(e.to_string()))?;
            Ok(match &request.profile {
                Some(profile) => info.with_profile(profile.clone()),
                None => info,
            })
        }
    }

    /// Store recording every decision.
    #[derive(Default)]
    struct RecordingStore {
        committed: Mutex<Vec<Arc<CertificateInfo>>>,
        revoked: Mutex<Vec<(Arc<CertificateInfo>, RevocationReason)>>,
    }

    #[async_trait]
    impl CertificateStore for RecordingStore {
        async fn commit(&self, cert: Arc<CertificateInfo>) -> Result<(), StoreError> {
            self.committed.lock().push(cert);
            Ok(())
        }

        async fn revoke(
            &self,
            cert: Arc<CertificateInfo>,
            reason: RevocationReason,
        ) -> Result<(), StoreError> {
            self.revoked.lock().push((cert, reason));
            Ok(())
        }
    }

    /// Delegates to a shared store so the test keeps a handle on it.
    struct SharedStore(Arc<RecordingStore>);

    #[async_trait]
    impl CertificateStore for SharedStore {
        async fn commit(&self, cert: Arc<CertificateInfo>) -> Result<(), StoreError> {
            self.0.commit(cert).await
        }

        async fn revoke(
            &self,
            cert: Arc<CertificateInfo>,
            reason: RevocationReason,
        ) -> Result<(), StoreError> {
            self.0.revoke(cert, reason).await
        }
    }

    type Service = ConfirmationService<SequentialIssuer, SharedStore>;

    fn build_service(
        config: ConfirmationConfig,
    ) -> (Arc<Service>, Arc<RecordingStore>, Arc<ManualTimeSource>) {
        let store = Arc::new(RecordingStore::default());
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let deps = ConfirmationDependencies {
            issuer: SequentialIssuer::default(),
            store: SharedStore(Arc::clone(&store)),
            time_source: clock.clone(),
        };
        let service = ConfirmationService::new(deps, config).unwrap();
        (Arc::new(service), store, clock)
    }

    fn tid(bytes: &[u8]) -> TransactionId {
        TransactionId::new(bytes).unwrap()
    }

    fn request(subject: &str) -> IssuanceRequest {
        IssuanceRequest {
            subject: subject.to_string(),
            profile: Some("tls-client".to_string()),
            public_key: vec![0x30, 0x59, 0x30, 0x13],
            implicit_confirm: false,
        }
    }

    fn cert_hash(algorithm: CertHashAlgorithm, cert: &CertificateInfo) -> Vec<u8> {
        algorithm.digest(cert.encoded_cert()).as_bytes().to_vec()
    }

    fn cert(encoded: &[u8]) -> Arc<CertificateInfo> {
        Arc::new(CertificateInfo::new(vec![0x10], "CN=example", encoded.to_vec()).unwrap())
    }

    // =============================================================================
    // POOL CONTRACT
    // =============================================================================

    #[test]
    fn test_end_to_end_example() {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let pool = PendingCertificatePool::new(
            CertHashAlgorithm::Sha256,
            PoolLimits::default(),
            clock,
        );
        let tx = tid(&[0x01]);
        let a = cert(b"certificate A");
        let b = cert(b"certificate B");

        pool.add_certificate(&tx, CertReqId::from(1), a.clone(), NOW + 60_000)
            .unwrap();
        pool.add_certificate(&tx, CertReqId::from(2), b.clone(), NOW + 60_000)
            .unwrap();

        let confirmed = pool.remove_certificate(
            &tx,
            &CertReqId::from(1),
            &cert_hash(CertHashAlgorithm::Sha256, &a),
        );
        assert_eq!(confirmed, Some(a));

        let rest = pool.remove_certificates(&tx).unwrap();
        assert_eq!(rest.len(), 1);
        assert!(rest.contains(&b));

        assert!(pool.remove_certificates(&tx).is_none());
        assert!(pool.is_empty());
    }

    #[test]
    fn test_big_cert_req_id_round_trip() {
        let clock = Arc::new(ManualTimeSource::new(NOW));
        let pool = PendingCertificatePool::new(
            CertHashAlgorithm::Sha512,
            PoolLimits::default(),
            clock,
        );
        let tx = tid(b"big-ids");
        let wide = CertReqId::from_be_bytes(&[0x01; 24]).unwrap();
        // Same value, redundant sign octet
        let padded = CertReqId::from_be_bytes(&[&[0x00][..], &[0x01; 24][..]].concat()).unwrap();
        let a = cert(b"wide");

        pool.add_certificate(&tx, wide, a.clone(), NOW + 1).unwrap();
        let removed =
            pool.remove_certificate(&tx, &padded, &cert_hash(CertHashAlgorithm::Sha512, &a));
        assert_eq!(removed, Some(a));
    }

    // =============================================================================
    // SERVICE FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_multi_certificate_enrollment() {
        let config = ConfirmationConfig {
            hash_algorithm: CertHashAlgorithm::Sha384,
            ..Default::default()
        };
        let (service, store, _) = build_service(config);
        let tx = tid(b"\x8a\x11\x02\x7f");

        let signing = service
            .enroll(&tx, CertReqId::from(0), &request("CN=device,OU=signing"))
            .await
            .unwrap();
        let encryption = service
            .enroll(&tx, CertReqId::from(1), &request("CN=device,OU=encryption"))
            .await
            .unwrap();
        assert_eq!(service.status().pending_count, 2);
        assert_eq!(service.status().transaction_count, 1);
        assert_eq!(signing.profile(), Some("tls-client"));

        // A SHA-256 hash is not accepted under SHA-384
        let result = service
            .confirm(
                &tx,
                &CertReqId::from(0),
                &cert_hash(CertHashAlgorithm::Sha256, &signing),
            )
            .await;
        assert!(matches!(
            result,
            Err(ConfirmationError::UnknownConfirmation { .. })
        ));

        service
            .confirm(
                &tx,
                &CertReqId::from(0),
                &cert_hash(CertHashAlgorithm::Sha384, &signing),
            )
            .await
            .unwrap();
        service
            .reject(
                &tx,
                &CertReqId::from(1),
                &cert_hash(CertHashAlgorithm::Sha384, &encryption),
            )
            .await
            .unwrap();

        assert!(service.pool().is_empty());
        assert_eq!(store.committed.lock().as_slice(), &[signing]);
        assert_eq!(store.revoked.lock()[0].0, encryption);

        let stats = service.stats().snapshot();
        assert_eq!(stats.tracked, 2);
        assert_eq!(stats.confirmed, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.unknown_confirmations, 1);
    }

    #[tokio::test]
    async fn test_cross_transaction_confirmation_is_nacked() {
        let (service, store, _) = build_service(ConfirmationConfig::default());
        let cert = service
            .enroll(&tid(b"tx-a"), CertReqId::from(1), &request("CN=a"))
            .await
            .unwrap();

        let result = service
            .confirm(
                &tid(b"tx-b"),
                &CertReqId::from(1),
                &cert_hash(CertHashAlgorithm::Sha256, &cert),
            )
            .await;
        assert!(result.is_err());
        assert!(store.committed.lock().is_empty());
        assert!(service.pool().contains(&tid(b"tx-a"), &CertReqId::from(1)));
    }

    #[tokio::test]
    async fn test_abort_closes_transaction() {
        let (service, store, _) = build_service(ConfirmationConfig::default());
        let tx = tid(b"abort-me");
        for req in 0..4 {
            service
                .enroll(&tx, CertReqId::from(req), &request("CN=batch"))
                .await
                .unwrap();
        }

        assert_eq!(service.abort(&tx).await.unwrap(), 4);
        assert!(service.pool().is_empty());
        assert!(store
            .revoked
            .lock()
            .iter()
            .all(|(_, reason)| *reason == RevocationReason::CessationOfOperation));
    }

    // =============================================================================
    // SWEEPER FLOWS
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_disposes_only_unconfirmed() {
        let config = ConfirmationConfig {
            confirm_wait_secs: 30,
            sweep_interval_secs: 5,
            ..Default::default()
        };
        let (service, store, clock) = build_service(config);
        let tx = tid(&[0x01]);

        let confirmed = service
            .enroll(&tx, CertReqId::from(1), &request("CN=prompt"))
            .await
            .unwrap();
        let forgotten = service
            .enroll(&tid(&[0x02]), CertReqId::from(1), &request("CN=silent"))
            .await
            .unwrap();

        let sweeper = ConfirmationSweeper::spawn(service.clone(), Duration::from_secs(5));

        service
            .confirm(
                &tx,
                &CertReqId::from(1),
                &cert_hash(CertHashAlgorithm::Sha256, &confirmed),
            )
            .await
            .unwrap();

        // Deadline not reached: sweeps find nothing
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(service.status().pending_count, 1);

        clock.advance(30_001);
        tokio::time::sleep(Duration::from_secs(12)).await;
        sweeper.shutdown().await;

        assert!(service.pool().is_empty());
        assert_eq!(store.committed.lock().as_slice(), &[confirmed]);
        let revoked = store.revoked.lock();
        assert_eq!(revoked.len(), 1);
        assert_eq!(revoked[0].0, forgotten);
    }

    #[tokio::test(start_paused = true)]
    async fn test_accept_policy_finalizes_silent_clients() {
        let config = ConfirmationConfig {
            confirm_wait_secs: 10,
            sweep_interval_secs: 1,
            timeout_policy: ConfirmTimeoutPolicy::Accept,
            ..Default::default()
        };
        let (service, store, clock) = build_service(config);
        let cert = service
            .enroll(&tid(b"silent"), CertReqId::from(7), &request("CN=legacy"))
            .await
            .unwrap();

        let sweeper = ConfirmationSweeper::spawn(service.clone(), Duration::from_secs(1));
        clock.advance(10_001);
        tokio::time::sleep(Duration::from_secs(3)).await;
        sweeper.shutdown().await;

        assert_eq!(store.committed.lock().as_slice(), &[cert]);
        assert!(store.revoked.lock().is_empty());
        assert_eq!(service.stats().snapshot().timed_out, 1);
    }
}
