//! Validation pipeline: runs the rule checks, scores them and builds the verdict.

use std::sync::Arc;
use std::time::Instant;

use tracing::{Span, debug, debug_span, error, info, instrument};

use crate::domain::checks::{self, CheckContext};
use crate::domain::scorer;
use crate::domain::{
    AppError, CheckName, CheckResults, Clock, FraudScoreSource, NoopObserver, Transaction,
    ValidationObserver, ValidationResult,
};

/// Stateless orchestrator of the rule checks.
///
/// Holds only shared read-only collaborators, so a single instance can serve
/// any number of concurrent validations.
pub struct ValidationPipeline {
    fraud_source: Arc<dyn FraudScoreSource>,
    clock: Arc<dyn Clock>,
    observer: Arc<dyn ValidationObserver>,
}

impl ValidationPipeline {
    #[must_use]
    pub fn new(fraud_source: Arc<dyn FraudScoreSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            fraud_source,
            clock,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Attach an observer notified around each check and each validation
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ValidationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Validate a structurally sound transaction.
    ///
    /// Returns either a fully built result or an internal error; a failing
    /// fraud-score source never yields a partial verdict.
    #[instrument(
        name = "validate_transaction",
        skip(self, transaction),
        fields(
            transaction_id = %transaction.transaction_id,
            amount = transaction.amount,
            currency = %transaction.currency,
            fraud_score = tracing::field::Empty,
        )
    )]
    pub async fn validate(&self, transaction: &Transaction) -> Result<ValidationResult, AppError> {
        let started = Instant::now();

        let fraud_score = match self.sample_fraud_score(transaction).await {
            Ok(score) => score,
            Err(e) => {
                error!(
                    transaction_id = %transaction.transaction_id,
                    error = %e,
                    "Validation aborted: fraud score unavailable"
                );
                self.observer
                    .validation_failed(&transaction.transaction_id, &e);
                return Err(AppError::Internal(format!(
                    "validation of transaction {} failed",
                    transaction.transaction_id
                )));
            }
        };
        Span::current().record("fraud_score", fraud_score);

        let ctx = CheckContext {
            transaction,
            fraud_score,
        };
        let mut checks_passed = CheckResults::default();
        let mut warnings = Vec::new();

        for check in CheckName::ALL {
            let check_started = Instant::now();
            let outcome = debug_span!("rule_check", check = %check).in_scope(|| {
                let outcome = checks::evaluate(check, &ctx);
                debug!(passed = outcome.passed, "Check evaluated");
                outcome
            });

            checks_passed.record(check, outcome.passed);
            if let Some(warning) = outcome.warning {
                warnings.push(warning.to_string());
            }
            self.observer
                .check_completed(check, outcome.passed, check_started.elapsed());
        }

        let score = scorer::score(&checks_passed);
        let result = ValidationResult {
            transaction_id: transaction.transaction_id.clone(),
            is_valid: score.is_valid,
            validation_score: score.validation_score,
            risk_level: score.risk_level,
            checks_passed,
            warnings,
            timestamp: self.clock.now(),
        };

        info!(
            transaction_id = %result.transaction_id,
            validation_score = result.validation_score,
            risk_level = %result.risk_level,
            is_valid = result.is_valid,
            "Transaction validated"
        );
        self.observer
            .validation_completed(&result, started.elapsed());

        Ok(result)
    }

    async fn sample_fraud_score(&self, transaction: &Transaction) -> Result<f64, AppError> {
        let score = self.fraud_source.sample(transaction).await?;
        if !(0.0..=1.0).contains(&score) {
            return Err(AppError::Internal(format!(
                "fraud score {} outside [0, 1]",
                score
            )));
        }
        Ok(score)
    }
}
