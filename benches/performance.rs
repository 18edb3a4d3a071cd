use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;
use uuid::Uuid;

use topup_gateway::models::{CallbackPayload, Transaction, TransactionStatus};
use topup_gateway::observability::LatencyTimer;
use topup_gateway::provider::SignatureVerifier;

fn callback_body(padding: usize) -> Vec<u8> {
    format!(
        r#"{{"reference":"T1","merchant_ref":"TXN-BENCH","status":"PAID","amount":50000,"amount_received":49500,"paid_at":1700000000,"padding":"{}"}}"#,
        "x".repeat(padding)
    )
    .into_bytes()
}

fn benchmark_signature_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature");
    group.measurement_time(Duration::from_secs(10));

    let verifier = SignatureVerifier::new(b"bench-callback-secret");

    for size in [64, 1024, 16384].iter() {
        let body = callback_body(*size);
        let signature = verifier.sign(&body);

        group.bench_with_input(BenchmarkId::new("verify_valid", size), size, |b, _| {
            b.iter(|| {
                let result = verifier.verify(black_box(&body), black_box(Some(signature.as_str())));
                black_box(result)
            });
        });
    }

    let body = callback_body(1024);
    let mut tampered = verifier.sign(&body).into_bytes();
    tampered[0] = if tampered[0] == b'0' { b'1' } else { b'0' };
    let tampered = String::from_utf8(tampered).unwrap();

    group.bench_function("verify_mismatch", |b| {
        b.iter(|| {
            let result = verifier.verify(black_box(&body), black_box(Some(tampered.as_str())));
            black_box(result)
        });
    });

    group.bench_function("sign", |b| {
        b.iter(|| {
            let signature = verifier.sign(black_box(&body));
            black_box(signature)
        });
    });

    group.finish();
}

fn benchmark_payload_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload");

    let body = callback_body(0);

    group.bench_function("parse_callback", |b| {
        b.iter(|| {
            let payload: CallbackPayload = serde_json::from_slice(black_box(&body)).unwrap();
            black_box(payload)
        });
    });

    group.bench_function("parse_and_map_status", |b| {
        b.iter(|| {
            let payload: CallbackPayload = serde_json::from_slice(black_box(&body)).unwrap();
            let mapped = TransactionStatus::from_provider(&payload.status);
            black_box(mapped)
        });
    });

    group.finish();
}

fn benchmark_status_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("status");

    group.bench_function("from_provider", |b| {
        let reported = ["UNPAID", "PAID", "EXPIRED", "FAILED", "REFUND", "ON_HOLD"];
        b.iter(|| {
            for status in reported.iter() {
                black_box(TransactionStatus::from_provider(black_box(status)));
            }
        });
    });

    group.bench_function("can_transition_to", |b| {
        let states = [
            TransactionStatus::Pending,
            TransactionStatus::Paid,
            TransactionStatus::Failed,
            TransactionStatus::Expired,
            TransactionStatus::Refunded,
        ];
        b.iter(|| {
            for from in states.iter() {
                for to in states.iter() {
                    black_box(from.can_transition_to(black_box(*to)));
                }
            }
        });
    });

    group.finish();
}

fn benchmark_transaction_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("transaction");

    group.bench_function("create_transaction", |b| {
        let user_id = Uuid::new_v4();
        b.iter(|| {
            let transaction = Transaction::new(
                black_box(user_id),
                black_box("TXN-BENCH-001".to_string()),
                black_box(50_000),
                black_box(500),
                black_box(Some("qris".to_string())),
            );
            black_box(transaction)
        });
    });

    group.bench_function("credit_amount", |b| {
        let mut transaction = Transaction::new(Uuid::new_v4(), "TXN-BENCH-002".to_string(), 50_000, 500, None);
        transaction.amount_received = 49_500;
        b.iter(|| {
            let credit = transaction.credit_amount();
            black_box(credit)
        });
    });

    group.finish();
}

fn benchmark_latency_timer(c: &mut Criterion) {
    let mut group = c.benchmark_group("latency_timer");

    group.bench_function("create_and_elapsed", |b| {
        b.iter(|| {
            let timer = LatencyTimer::new();
            let elapsed = timer.elapsed_ms();
            black_box(elapsed)
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_signature_verification,
    benchmark_payload_parsing,
    benchmark_status_mapping,
    benchmark_transaction_model,
    benchmark_latency_timer,
);

criterion_main!(benches);
