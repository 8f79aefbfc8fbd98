//! Application service: request validation in front of the pipeline, plus probes.

use std::sync::Arc;

use tracing::{instrument, warn};
use validator::Validate;

use crate::domain::{
    AppError, Clock, FraudScoreSource, HealthResponse, HealthStatus, ReadinessResponse,
    ValidateTransactionRequest, ValidationError, ValidationObserver, ValidationResult,
};

use super::pipeline::ValidationPipeline;

/// Application service containing the request-level logic
pub struct AppService {
    pipeline: ValidationPipeline,
    fraud_source: Arc<dyn FraudScoreSource>,
    clock: Arc<dyn Clock>,
    version: String,
}

impl AppService {
    #[must_use]
    pub fn new(
        fraud_source: Arc<dyn FraudScoreSource>,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn ValidationObserver>,
        version: impl Into<String>,
    ) -> Self {
        let pipeline = ValidationPipeline::new(Arc::clone(&fraud_source), Arc::clone(&clock))
            .with_observer(observer);
        Self {
            pipeline,
            fraud_source,
            clock,
            version: version.into(),
        }
    }

    /// Validate a wire request and run it through the pipeline.
    ///
    /// Structural problems are rejected here and never reach the rule checks.
    #[instrument(skip(self, request), fields(transaction_id = %request.transaction_id))]
    pub async fn validate_transaction(
        &self,
        request: ValidateTransactionRequest,
    ) -> Result<ValidationResult, AppError> {
        request.validate().map_err(|e| {
            warn!(error = %e, "Request validation failed");
            AppError::Validation(ValidationError::Multiple(e.to_string()))
        })?;

        let transaction = request.into_transaction(self.clock.now());
        self.pipeline.validate(&transaction).await
    }

    /// Report component health; the API itself is always up
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> HealthResponse {
        let fraud_engine = match self.fraud_source.health_check().await {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => {
                warn!(error = %e, "Fraud engine health check failed");
                HealthStatus::Unhealthy
            }
        };
        HealthResponse::new(fraud_engine, &self.version, self.clock.now())
    }

    /// Ready to serve traffic only when the fraud source is reachable
    #[instrument(skip(self))]
    pub async fn readiness(&self) -> ReadinessResponse {
        ReadinessResponse::new(self.fraud_source.health_check().await.is_ok())
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
