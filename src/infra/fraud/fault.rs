//! Chaos-testing wrapper that makes a fraud-score source fail on purpose.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use crate::domain::{AppError, ExternalServiceError, FraudScoreSource, Transaction};

/// Fails a configurable fraction of samples before reaching the inner source.
///
/// Only installed when `FRAUD_FAULT_RATE` is set above zero.
pub struct FaultInjectingFraudSource {
    inner: Arc<dyn FraudScoreSource>,
    failure_rate: f64,
}

impl FaultInjectingFraudSource {
    /// `failure_rate` is clamped to `[0, 1]`
    #[must_use]
    pub fn new(inner: Arc<dyn FraudScoreSource>, failure_rate: f64) -> Self {
        let failure_rate = if failure_rate.is_nan() {
            0.0
        } else {
            failure_rate.clamp(0.0, 1.0)
        };
        Self {
            inner,
            failure_rate,
        }
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }
}

#[async_trait]
impl FraudScoreSource for FaultInjectingFraudSource {
    async fn sample(&self, transaction: &Transaction) -> Result<f64, AppError> {
        let inject = rand::thread_rng().gen_bool(self.failure_rate);
        if inject {
            warn!(
                transaction_id = %transaction.transaction_id,
                "Injected fraud engine fault"
            );
            return Err(AppError::ExternalService(ExternalServiceError::Unavailable(
                "injected fault".to_string(),
            )));
        }
        self.inner.sample(transaction).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.inner.health_check().await
    }
}
