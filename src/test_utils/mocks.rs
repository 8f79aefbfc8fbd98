//! Mock implementations for testing.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::{
    AppError, CheckName, Clock, ExternalServiceError, FraudScoreSource, Transaction,
    ValidationObserver, ValidationResult,
};

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }
}

/// Deterministic fraud-score source returning a fixed score
pub struct MockFraudScoreSource {
    score: f64,
    config: MockConfig,
    is_healthy: AtomicBool,
    calls: AtomicUsize,
}

impl MockFraudScoreSource {
    /// Low-risk source, score 0.05
    #[must_use]
    pub fn new() -> Self {
        Self::with_score(0.05)
    }

    #[must_use]
    pub fn with_score(score: f64) -> Self {
        Self::with_config(score, MockConfig::success())
    }

    #[must_use]
    pub fn with_config(score: f64, config: MockConfig) -> Self {
        Self {
            score,
            config,
            is_healthy: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(0.0, MockConfig::failure(message))
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Number of times `sample` was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(AppError::ExternalService(ExternalServiceError::Unavailable(
                msg,
            )));
        }
        Ok(())
    }
}

impl Default for MockFraudScoreSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FraudScoreSource for MockFraudScoreSource {
    async fn sample(&self, _transaction: &Transaction) -> Result<f64, AppError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.check_should_fail()?;
        Ok(self.score)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::ExternalService(ExternalServiceError::Unavailable(
                "Unhealthy".to_string(),
            )));
        }
        Ok(())
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(
            Utc.with_ymd_and_hms(2025, 12, 10, 10, 0, 0)
                .single()
                .unwrap_or_default(),
        )
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Observer that keeps every notification for later assertions
#[derive(Default)]
pub struct RecordingObserver {
    checks: Mutex<Vec<(CheckName, bool)>>,
    completed: Mutex<Vec<(String, bool)>>,
    failures: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn checks(&self) -> Vec<(CheckName, bool)> {
        self.checks.lock().unwrap().clone()
    }

    /// `(transaction_id, is_valid)` for each completed validation
    pub fn completed(&self) -> Vec<(String, bool)> {
        self.completed.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().unwrap().clone()
    }
}

impl ValidationObserver for RecordingObserver {
    fn check_completed(&self, check: CheckName, passed: bool, _elapsed: Duration) {
        self.checks.lock().unwrap().push((check, passed));
    }

    fn validation_completed(&self, result: &ValidationResult, _elapsed: Duration) {
        self.completed
            .lock()
            .unwrap()
            .push((result.transaction_id.clone(), result.is_valid));
    }

    fn validation_failed(&self, transaction_id: &str, _error: &AppError) {
        self.failures.lock().unwrap().push(transaction_id.to_string());
    }
}
