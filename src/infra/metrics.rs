//! Prometheus metrics for HTTP traffic and validation outcomes.
//!
//! Metrics live in a registry owned by this value rather than the process
//! default registry, so each service instance (and each test) exposes its own.

use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use tracing::warn;

use crate::domain::{AppError, CheckName, ValidationObserver, ValidationResult};

/// Label used for every validation performed by the pipeline
const VALIDATION_TYPE: &str = "automatic";

/// Counters, gauges and histograms exported on `/metrics`
pub struct ValidationMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    active_transactions: IntGauge,
    validations_total: IntCounterVec,
    errors_total: IntCounterVec,
    check_results_total: IntCounterVec,
}

impl ValidationMetrics {
    #[must_use]
    pub fn new() -> Self {
        let requests_total = IntCounterVec::new(
            Opts::new(
                "transaction_validator_requests_total",
                "Total HTTP requests received",
            ),
            &["method", "endpoint", "status"],
        )
        .expect("metric can be created");

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "transaction_validator_request_duration_seconds",
                "HTTP request latency in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["method", "endpoint"],
        )
        .expect("metric can be created");

        let active_transactions = IntGauge::new(
            "transaction_validator_active_transactions",
            "Requests currently being processed",
        )
        .expect("metric can be created");

        let validations_total = IntCounterVec::new(
            Opts::new(
                "transaction_validations_total",
                "Total transaction validations by outcome",
            ),
            &["status", "validation_type"],
        )
        .expect("metric can be created");

        let errors_total = IntCounterVec::new(
            Opts::new(
                "transaction_validator_errors_total",
                "Total errors by type",
            ),
            &["error_type"],
        )
        .expect("metric can be created");

        let check_results_total = IntCounterVec::new(
            Opts::new(
                "transaction_validator_check_results_total",
                "Rule check outcomes by check name",
            ),
            &["check", "outcome"],
        )
        .expect("metric can be created");

        let registry = Registry::new();
        for collector in [
            Box::new(requests_total.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(request_duration.clone()),
            Box::new(active_transactions.clone()),
            Box::new(validations_total.clone()),
            Box::new(errors_total.clone()),
            Box::new(check_results_total.clone()),
        ] {
            registry
                .register(collector)
                .expect("metric names are unique");
        }

        Self {
            registry,
            requests_total,
            request_duration,
            active_transactions,
            validations_total,
            errors_total,
            check_results_total,
        }
    }

    /// Mark a request as in flight until the returned guard is dropped
    pub fn track_in_flight(&self) -> InFlightGuard {
        self.active_transactions.inc();
        InFlightGuard {
            gauge: self.active_transactions.clone(),
        }
    }

    /// Record a finished request
    pub fn request_finished(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[method, endpoint, status.as_str()])
            .inc();
        self.request_duration
            .with_label_values(&[method, endpoint])
            .observe(elapsed.as_secs_f64());
    }

    /// Count of finished requests with the given labels
    pub fn requests(&self, method: &str, endpoint: &str, status: u16) -> u64 {
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[method, endpoint, status.as_str()])
            .get()
    }

    pub fn active_requests(&self) -> i64 {
        self.active_transactions.get()
    }

    /// Count of validations recorded with the given status label
    pub fn validations(&self, status: &str) -> u64 {
        self.validations_total
            .with_label_values(&[status, VALIDATION_TYPE])
            .get()
    }

    /// Count an error that never reached the pipeline, such as a rejected request body
    pub fn record_error(&self, error_type: &str) {
        self.errors_total.with_label_values(&[error_type]).inc();
    }

    pub fn errors(&self, error_type: &str) -> u64 {
        self.errors_total.with_label_values(&[error_type]).get()
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> Result<String, AppError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| AppError::Serialization(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| AppError::Serialization(e.to_string()))
    }
}

/// Decrements the in-flight gauge on drop, including when a request is cancelled
pub struct InFlightGuard {
    gauge: IntGauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

impl Default for ValidationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationObserver for ValidationMetrics {
    fn check_completed(&self, check: CheckName, passed: bool, _elapsed: Duration) {
        let outcome = if passed { "pass" } else { "fail" };
        self.check_results_total
            .with_label_values(&[check.as_str(), outcome])
            .inc();
    }

    fn validation_completed(&self, result: &ValidationResult, _elapsed: Duration) {
        self.validations_total
            .with_label_values(&[result.outcome(), VALIDATION_TYPE])
            .inc();
    }

    fn validation_failed(&self, transaction_id: &str, error: &AppError) {
        warn!(transaction_id = %transaction_id, error_type = error.kind(), "Recording failed validation");
        self.errors_total.with_label_values(&[error.kind()]).inc();
        self.validations_total
            .with_label_values(&["error", VALIDATION_TYPE])
            .inc();
    }
}
