//! Domain traits defining contracts for external collaborators.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::AppError;
use super::types::{CheckName, Transaction, ValidationResult};

/// Source of the fraud risk signal consumed by `fraud_check`.
///
/// Implementations return a score in `[0, 1]`, lower is safer. The pipeline
/// calls `sample` exactly once per validation.
#[async_trait]
pub trait FraudScoreSource: Send + Sync {
    /// Produce a fraud score for the transaction
    async fn sample(&self, transaction: &Transaction) -> Result<f64, AppError>;

    /// Check connectivity with the underlying risk engine
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Wall clock used to stamp results and default transaction timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Reporting hooks invoked by the validation pipeline.
///
/// Hooks are informational only; they cannot influence a validation outcome.
pub trait ValidationObserver: Send + Sync {
    /// Called after each rule check runs
    fn check_completed(&self, check: CheckName, passed: bool, elapsed: Duration) {
        let _ = (check, passed, elapsed);
    }

    /// Called once a result has been fully built
    fn validation_completed(&self, result: &ValidationResult, elapsed: Duration) {
        let _ = (result, elapsed);
    }

    /// Called when validation aborts on an internal fault
    fn validation_failed(&self, transaction_id: &str, error: &AppError) {
        let _ = (transaction_id, error);
    }
}

/// Observer that records nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ValidationObserver for NoopObserver {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::Currency;

    struct ConstantFraudScore;

    #[async_trait]
    impl FraudScoreSource for ConstantFraudScore {
        async fn sample(&self, _transaction: &Transaction) -> Result<f64, AppError> {
            Ok(0.01)
        }
    }

    #[tokio::test]
    async fn test_fraud_source_health_check_defaults_to_ok() {
        let source = ConstantFraudScore;
        assert!(source.health_check().await.is_ok());

        let tx = Transaction::new("TX-1", 1.0, Currency::Usd, "1234567890", "0987654321");
        assert_eq!(source.sample(&tx).await.unwrap(), 0.01);
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
