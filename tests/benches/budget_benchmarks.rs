//! # Budget Engine Benchmarks
//!
//! Every reimbursement request rebuilds the commitments of the whole grant,
//! so admission cost grows with the payment history.
//!
//! | Operation | Input |
//! |-----------|-------|
//! | `Commitments::from_grant` | grants with 10..1000 payments |
//! | `budget::admit` | same grants, one new three-line request |
//! | full handler round trip | `RequestReimbursement` through the in-memory ledger |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use grant_contract::algorithms::budget::{admit, Commitments};
use grant_contract::{
    Amount, Awardee, AwardeeType, Benefit, Grant, GrantStatus, Payment, PaymentItem,
    PaymentStatus, Percentage,
};
use grant_tests::fixtures::{approved_grant, request, Harness, AWARDEE_MSP};
use std::time::Duration;

const CATEGORIES: [&str; 4] = ["Equipment", "Personnel", "Supplies", "Travel"];

/// Grant with `payments` one-unit payments spread over both tiers.
fn grant_with_history(payments: usize) -> Grant {
    let roster = ["A1", "S1"]
        .iter()
        .zip([AwardeeType::Main, AwardeeType::Sub])
        .map(|(id, tier)| Awardee {
            id: id.to_string(),
            awardee_type: tier,
            ..Awardee::default()
        })
        .collect();

    let history = (0..payments)
        .map(|i| {
            let items = vec![
                PaymentItem::new(CATEGORIES[i % 4], 1),
                PaymentItem::new(CATEGORIES[(i + 1) % 4], 1),
            ];
            Payment {
                id: format!("P-{i}"),
                awardee_id: if i % 3 == 0 { "S1" } else { "A1" }.to_string(),
                date: String::new(),
                items,
                notes: String::new(),
                status: match i % 5 {
                    0 => PaymentStatus::Rejected {
                        reason: "duplicate".to_string(),
                    },
                    1 => PaymentStatus::Accepted,
                    _ => PaymentStatus::Requested,
                },
                total: Amount::new(2),
            }
        })
        .collect();

    Grant {
        id: "G-BENCH".to_string(),
        amount: Amount::new(4_000_000),
        awardees: roster,
        benefits: CATEGORIES
            .iter()
            .map(|c| Benefit::new(*c, 1_000_000))
            .collect(),
        cashed_out: Amount::ZERO,
        description: String::new(),
        end_date: String::new(),
        grantor: "Grantor".to_string(),
        grantor_id: "boss".to_string(),
        notes: String::new(),
        paid_amount: Amount::ZERO,
        payments: history,
        payment_type: String::new(),
        progress: Vec::new(),
        progress_freq: String::new(),
        start_date: String::new(),
        status: GrantStatus::Approved,
        sub: Percentage::new(40).expect("valid percentage"),
    }
}

fn bench_commitments(c: &mut Criterion) {
    let mut group = c.benchmark_group("budget-commitments");
    group.measurement_time(Duration::from_secs(5));

    for size in [10usize, 100, 1000] {
        let grant = grant_with_history(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("from_grant", size), &grant, |b, grant| {
            b.iter(|| black_box(Commitments::from_grant(grant)))
        });
    }

    group.finish();
}

fn bench_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("budget-admission");
    group.measurement_time(Duration::from_secs(5));

    let items = [
        PaymentItem::new("Travel", 500),
        PaymentItem::new("Supplies", 250),
        PaymentItem::new("Travel", 125),
    ];

    for size in [10usize, 100, 1000] {
        let grant = grant_with_history(size);
        for tier in [AwardeeType::Main, AwardeeType::Sub] {
            group.bench_with_input(
                BenchmarkId::new(format!("admit_{tier}"), size),
                &grant,
                |b, grant| b.iter(|| black_box(admit(grant, tier, &items, 64))),
            );
        }
    }

    group.finish();
}

fn bench_handler_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("handler-round-trip");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("request_reimbursement", |b| {
        b.iter_batched(
            || {
                let h = Harness::new();
                approved_grant(&h);
                h
            },
            |h| black_box(request(&h, "A1", AWARDEE_MSP, "P-1", &[("Travel", 100)])),
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_commitments,
    bench_admission,
    bench_handler_round_trip
);
criterion_main!(benches);
