//! HTTP request handlers with OpenAPI documentation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::{error, warn};
use utoipa::OpenApi;

use crate::app::AppState;
use crate::domain::{
    AppError, CheckName, ComponentChecks, ErrorDetail, ErrorResponse, HealthResponse, HealthStatus, RateLimitResponse, ReadinessDependencies, ReadinessResponse,
    RiskLevel, ServiceInfoResponse, StatsResponse, ValidateTransactionRequest, ValidationError,
    ValidationResult,
};

/// Display name reported by the root endpoint
pub const SERVICE_NAME: &str = "PayFlow MX - Transaction Validator";

/// Short service identifier reported by the stats endpoint
pub const SERVICE_ID: &str = "transaction-validator";

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    info(
        title = "PayFlow MX Transaction Validator API",
        description = "Validates electronic transactions against rule checks and assigns a risk tier",
        license(
            name = "MIT"
        )
    ),
    paths(
        root_handler,
        health_check_handler,
        readiness_handler,
        metrics_handler,
        validate_transaction_handler,
        stats_handler,
    ),
    components(
        schemas(
            ValidateTransactionRequest,
            ValidationResult,
            CheckName,
            RiskLevel,
            HealthResponse,
            HealthStatus,
            ComponentChecks,
            ReadinessResponse,
            ReadinessDependencies,
            ServiceInfoResponse,
            StatsResponse,
            ErrorResponse,
            ErrorDetail,
            RateLimitResponse,
        )
    ),
    tags(
        (name = "validation", description = "Transaction validation endpoints"),
        (name = "health", description = "Health check endpoints"),
        (name = "monitoring", description = "Metrics and service information")
    )
)]
pub struct ApiDoc;

/// Service descriptor
#[utoipa::path(
    get,
    path = "/",
    tag = "monitoring",
    responses(
        (status = 200, description = "Service information", body = ServiceInfoResponse)
    )
)]
pub async fn root_handler(State(state): State<Arc<AppState>>) -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        service: SERVICE_NAME.to_string(),
        version: state.info.version.clone(),
        status: "operational".to_string(),
        environment: state.info.environment.clone(),
    })
}

/// Detailed health check
///
/// Always answers 200; a failing fraud engine only degrades the status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health status", body = HealthResponse)
    )
)]
pub async fn health_check_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let health = state.service.health_check().await;
    Json(health)
}

/// Kubernetes readiness probe
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Ready to serve traffic", body = ReadinessResponse),
        (status = 503, description = "Fraud engine unreachable", body = ReadinessResponse)
    )
)]
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.service.readiness().await;
    let status = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(readiness))
}

/// Prometheus metrics
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "monitoring",
    responses(
        (status = 200, description = "Prometheus text exposition", body = String, content_type = "text/plain"),
        (status = 500, description = "Metrics could not be encoded", body = ErrorResponse)
    )
)]
pub async fn metrics_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.render()?;
    Ok(([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body))
}

/// Validate a transaction
///
/// Runs the six rule checks and returns the verdict with its score and risk
/// tier. Structurally invalid requests are rejected with 422 before any check
/// runs.
#[utoipa::path(
    post,
    path = "/api/v1/validate",
    tag = "validation",
    request_body = ValidateTransactionRequest,
    responses(
        (status = 200, description = "Validation verdict", body = ValidationResult),
        (status = 413, description = "Request body too large", body = ErrorResponse),
        (status = 422, description = "Structurally invalid request", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = RateLimitResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn validate_transaction_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ValidateTransactionRequest>, JsonRejection>,
) -> Result<Json<ValidationResult>, AppError> {
    let outcome = match payload {
        Ok(Json(request)) => state.service.validate_transaction(request).await,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!(limit = MAX_BODY_BYTES, "Rejected oversized request body");
            Err(AppError::PayloadTooLarge(MAX_BODY_BYTES))
        }
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected request body");
            Err(AppError::Validation(ValidationError::MalformedBody(
                rejection.body_text(),
            )))
        }
    };

    if let Err(e @ (AppError::Validation(_) | AppError::PayloadTooLarge(_))) = &outcome {
        state.metrics.record_error(e.kind());
    }
    outcome.map(Json)
}

/// Service statistics
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    tag = "monitoring",
    responses(
        (status = 200, description = "Service statistics", body = StatsResponse)
    )
)]
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        service: SERVICE_ID.to_string(),
        uptime: "operational".to_string(),
        version: state.info.version.clone(),
        metrics_endpoint: "/metrics".to_string(),
        health_endpoint: "/health".to_string(),
    })
}

/// JSON 404 for unknown routes
pub async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: ErrorDetail {
                r#type: "not_found".to_string(),
                message: "Not Found".to_string(),
            },
        }),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            // The pipeline reports fraud-source failures as `Internal`
            AppError::ExternalService(_)
            | AppError::Config(_)
            | AppError::Serialization(_)
            | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded".to_string(),
            ),
        };
        let error_type = self.kind();

        if status.is_server_error() {
            error!(error_type = %error_type, error = %self, "Server error");
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                r#type: error_type.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn error_body(err: AppError) -> (StatusCode, ErrorResponse) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_validation_error_is_unprocessable() {
        let (status, body) = error_body(AppError::Validation(ValidationError::InvalidField {
            field: "currency".to_string(),
            message: "Currency must be one of: MXN, USD, EUR".to_string(),
        }))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.r#type, "validation_error");
        assert!(body.error.message.contains("MXN, USD, EUR"));
    }

    #[tokio::test]
    async fn test_internal_error_is_masked() {
        let (status, body) =
            error_body(AppError::Internal("fraud engine exploded at 10.0.0.3".to_string())).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.r#type, "internal_error");
        assert_eq!(body.error.message, "Internal server error");
    }

    #[tokio::test]
    async fn test_external_errors_are_masked() {
        let (status, body) = error_body(AppError::ExternalService(
            crate::domain::ExternalServiceError::Network("refused by 10.0.0.9".to_string()),
        ))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.r#type, "external_service_error");
        assert_eq!(body.error.message, "Internal server error");
    }

    #[tokio::test]
    async fn test_payload_too_large_response() {
        let (status, body) = error_body(AppError::PayloadTooLarge(MAX_BODY_BYTES)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body.error.r#type, "payload_too_large");
        assert!(body.error.message.contains("65536"));
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let (status, body) = error_body(AppError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body.error.r#type, "rate_limited");
    }
}
