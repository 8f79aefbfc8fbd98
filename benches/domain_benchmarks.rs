use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use transaction_validator::app::ValidationPipeline;
use transaction_validator::domain::{
    CheckName, CheckResults, Currency, Transaction, ValidateTransactionRequest, scorer,
};
use transaction_validator::test_utils::{FixedClock, MockFraudScoreSource};
use validator::Validate;

fn bench_request_validation(c: &mut Criterion) {
    let mut request =
        ValidateTransactionRequest::new("TX-BENCH", 1000.50, "MXN", "1234567890", "0987654321");
    request.description = Some("Pago de prueba".to_string());

    c.bench_function("validate_request_structure", |b| {
        b.iter(|| {
            let _ = black_box(&request).validate();
        })
    });
}

fn bench_scoring(c: &mut Criterion) {
    let checks: CheckResults = CheckName::ALL
        .into_iter()
        .map(|check| (check, check != CheckName::FraudCheck))
        .collect();

    c.bench_function("score_check_results", |b| {
        b.iter(|| scorer::score(black_box(&checks)))
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let pipeline = ValidationPipeline::new(
        Arc::new(MockFraudScoreSource::with_score(0.05)),
        Arc::new(FixedClock::default()),
    );
    let transaction =
        Transaction::new("TX-BENCH", 750_000.0, Currency::Usd, "1234567890", "0987654321")
            .with_description("Pago de prueba");

    c.bench_function("pipeline_validate", |b| {
        b.to_async(&runtime)
            .iter(|| async { pipeline.validate(black_box(&transaction)).await })
    });
}

criterion_group!(benches, bench_request_validation, bench_scoring, bench_pipeline);
criterion_main!(benches);
