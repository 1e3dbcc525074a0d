//! Performance benchmarks for the payroll engine.
//!
//! This benchmark suite verifies that the engine meets performance targets:
//! - Single item computation: < 10μs mean
//! - Calculating a run of 100 employees: < 10ms mean
//! - Calculating a run of 1000 employees: < 100ms mean
//! - Period items request over HTTP (100 employees): < 20ms mean
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::str::FromStr;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use payroll_engine::api::{AppState, create_router, issue_token};
use payroll_engine::calculation::{DeductionRates, Proration, compute_item};
use payroll_engine::config::{AuthConfig, DeductionConfig};
use payroll_engine::materializer::RunMaterializer;
use payroll_engine::models::NewEmployee;
use payroll_engine::storage::{InMemoryStore, PayrollStore};

use axum::{
    body::Body,
    http::{Request, header},
};
use chrono::NaiveDate;
use tower::ServiceExt;

fn decimal(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn default_rates() -> DeductionRates {
    DeductionRates {
        withholding_rate: None,
        provident_fund_rate: decimal("0.03"),
        social_security_enabled: true,
    }
}

/// Creates a store holding `count` employees with varied salaries and hire
/// dates, a third of them hired mid-period.
fn create_populated_store(rt: &tokio::runtime::Runtime, count: usize) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    rt.block_on(async {
        for i in 0..count {
            let hired_on = if i % 3 == 0 {
                NaiveDate::from_ymd_opt(2025, 9, 1 + (i % 28) as u32).unwrap()
            } else {
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
            };
            let mut employee = NewEmployee::new(
                format!("E{:05}", i),
                "Bench",
                format!("Employee {}", i),
                Decimal::new(20_000 + (i as i64 % 50) * 1_000, 0),
                hired_on,
            );
            if i % 5 == 0 {
                employee.social_security_enabled = false;
            }
            store.create_employee(employee).await.unwrap();
        }
    });
    store
}

/// Benchmark: Single item computation.
///
/// Target: < 10μs mean
fn bench_single_item(c: &mut Criterion) {
    let config = DeductionConfig::default();
    let rates = default_rates();
    let proration = Proration {
        worked_days: 30,
        total_days: 30,
    };

    c.bench_function("single_item", |b| {
        b.iter(|| {
            black_box(compute_item(
                black_box(decimal("50000")),
                black_box(proration),
                &rates,
                &config,
            ))
        })
    });
}

/// Benchmark: Run calculation over growing workforces.
///
/// Target: < 10ms mean for 100 employees, < 100ms mean for 1000
fn bench_calculate_run(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("calculate_run");

    for employee_count in [10usize, 100, 1000] {
        let store = create_populated_store(&rt, employee_count);
        let materializer = RunMaterializer::new(store, DeductionConfig::default());
        let run_id = rt.block_on(materializer.create_run(2025, 9)).unwrap().id;

        if employee_count >= 1000 {
            group.sample_size(10);
        }
        group.throughput(Throughput::Elements(employee_count as u64));
        group.bench_with_input(
            BenchmarkId::new("employees", employee_count),
            &employee_count,
            |b, _| {
                b.to_async(&rt).iter(|| async {
                    black_box(materializer.calculate(run_id).await.unwrap())
                })
            },
        );
    }

    group.finish();
}

/// Benchmark: Period items request through the HTTP API.
///
/// Target: < 20ms mean
fn bench_period_items_request(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store: Arc<dyn PayrollStore> = create_populated_store(&rt, 100);
    let auth = AuthConfig::default();
    let (token, _) = issue_token(&auth, "admin@example.com").unwrap();
    let router = create_router(AppState::new(store, DeductionConfig::default(), auth));

    c.bench_function("period_items_request", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(
                    Request::builder()
                        .uri("/api/v1/payroll/runs/period/2025-09/items")
                        .header(header::AUTHORIZATION, format!("Bearer {}", token))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            black_box(response)
        })
    });
}

criterion_group!(
    benches,
    bench_single_item,
    bench_calculate_run,
    bench_period_items_request,
);
criterion_main!(benches);
