//! # Pending Pool Benchmarks
//!
//! | Operation | Expectation |
//! |-----------|-------------|
//! | `add_certificate` | digest + one shard write |
//! | `remove_certificate` | one shard write, constant-time compare |
//! | timeout scan | linear in pending entries, no allocation per miss |

use ca_confirmation::{
    CertHashAlgorithm, CertReqId, CertificateInfo, ManualTimeSource, PendingCertificatePool,
    PoolLimits, TransactionId,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

const NOW: u64 = 1_000_000;

fn random_cert(rng: &mut impl Rng, size: usize) -> Arc<CertificateInfo> {
    let mut encoded = vec![0u8; size];
    rng.fill(encoded.as_mut_slice());
    Arc::new(CertificateInfo::new(rng.gen::<[u8; 8]>().to_vec(), "CN=bench", encoded).unwrap())
}

fn pool(algorithm: CertHashAlgorithm) -> PendingCertificatePool {
    PendingCertificatePool::new(
        algorithm,
        PoolLimits {
            max_per_transaction: 16,
            max_pending: 1_000_000,
        },
        Arc::new(ManualTimeSource::new(NOW)),
    )
}

fn bench_add_and_confirm(c: &mut Criterion) {
    let mut group = c.benchmark_group("pending-pool-confirm");
    group.measurement_time(Duration::from_secs(5));
    let mut rng = rand::thread_rng();

    for algorithm in [
        CertHashAlgorithm::Sha256,
        CertHashAlgorithm::Sha384,
        CertHashAlgorithm::Sha3_256,
    ] {
        let cert = random_cert(&mut rng, 1_500);
        let hash = algorithm.digest(cert.encoded_cert()).as_bytes().to_vec();
        let pool = pool(algorithm);
        let tx = TransactionId::new(b"bench").unwrap();

        group.bench_with_input(
            BenchmarkId::new("add_then_confirm", algorithm),
            &algorithm,
            |b, _| {
                b.iter(|| {
                    pool.add_certificate(&tx, CertReqId::from(1), Arc::clone(&cert), NOW + 60_000)
                        .unwrap();
                    black_box(pool.remove_certificate(&tx, &CertReqId::from(1), &hash))
                })
            },
        );
    }
    group.finish();
}

fn bench_timeout_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("pending-pool-sweep");
    let mut rng = rand::thread_rng();

    for size in [1_000usize, 10_000, 50_000] {
        let pool = pool(CertHashAlgorithm::Sha256);
        for i in 0..size {
            let tx = TransactionId::new(&(i as u64).to_be_bytes()).unwrap();
            // One in a hundred already expired
            let deadline = if i % 100 == 0 { NOW - 1 } else { NOW + 60_000 };
            pool.add_certificate(&tx, CertReqId::from(1), random_cert(&mut rng, 64), deadline)
                .unwrap();
        }

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("scan", size), &size, |b, _| {
            b.iter(|| black_box(pool.confirm_timeouted_transactions().len()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add_and_confirm, bench_timeout_scan);
criterion_main!(benches);
