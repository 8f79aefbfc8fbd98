//! Router construction, request metrics and rate limiting middleware.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock as _, DefaultClock},
    state::{InMemoryState, NotKeyed},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::app::AppState;
use crate::domain::{ConfigError, ErrorDetail, RateLimitResponse, parse_setting};

use super::handlers::{
    ApiDoc, MAX_BODY_BYTES, health_check_handler, metrics_handler, not_found_handler,
    readiness_handler, root_handler, stats_handler, validate_transaction_handler,
};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Probe endpoints exempt from rate limiting
const RATE_LIMIT_EXEMPT: [&str; 3] = ["/health", "/ready", "/metrics"];

/// Routed endpoints, used as metric labels
const ENDPOINTS: [&str; 6] = [
    "/",
    "/health",
    "/ready",
    "/metrics",
    "/api/v1/validate",
    "/api/v1/stats",
];

/// Metric label for requests outside the route table
const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Global rate limit configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Sustained requests per second
    pub requests_per_second: u32,
    /// Maximum burst above the sustained rate
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 50,
            burst_size: 100,
        }
    }
}

impl RateLimitConfig {
    /// Load from `RATE_LIMIT_RPS` and `RATE_LIMIT_BURST`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            requests_per_second: positive(&lookup, "RATE_LIMIT_RPS")?
                .unwrap_or(defaults.requests_per_second),
            burst_size: positive(&lookup, "RATE_LIMIT_BURST")?.unwrap_or(defaults.burst_size),
        })
    }

    fn quota(&self) -> Quota {
        let rps = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(rps);
        Quota::per_second(rps).allow_burst(burst)
    }
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<u32>, ConfigError> {
    match parse_setting::<u32>(name, lookup(name))? {
        Some(0) => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: "must be greater than 0".to_string(),
        }),
        value => Ok(value),
    }
}

/// Create the application router without rate limiting
pub fn create_router(state: Arc<AppState>) -> Router {
    build_router(state, None)
}

/// Create the application router with a global rate limiter
pub fn create_router_with_rate_limit(state: Arc<AppState>, config: RateLimitConfig) -> Router {
    let limiter = Arc::new(RateLimiter::direct(config.quota()));
    build_router(state, Some(limiter))
}

fn build_router(state: Arc<AppState>, limiter: Option<Arc<DirectRateLimiter>>) -> Router {
    let request_timeout = state.request_timeout;

    let api_routes = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check_handler))
        .route("/ready", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/validate", post(validate_transaction_handler))
        .route("/api/v1/stats", get(stats_handler))
        .fallback(not_found_handler)
        .with_state(Arc::clone(&state));

    let mut router = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_routes);

    if let Some(limiter) = limiter {
        router = router.layer(middleware::from_fn_with_state(limiter, rate_limit));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Applied one at a time: CORS and timeout need a `Default` response body
    router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(middleware::from_fn_with_state(state, track_request_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Records request count, latency and in-flight gauge for every request,
/// including rate-limited, timed-out and unrouted ones
async fn track_request_metrics(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path();
    let endpoint = ENDPOINTS
        .into_iter()
        .find(|endpoint| *endpoint == path)
        .unwrap_or(UNMATCHED_ENDPOINT);

    let _in_flight = state.metrics.track_in_flight();
    let started = Instant::now();
    let response = next.run(request).await;

    state.metrics.request_finished(
        &method,
        endpoint,
        response.status().as_u16(),
        started.elapsed(),
    );
    response
}

async fn rate_limit(
    State(limiter): State<Arc<DirectRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if RATE_LIMIT_EXEMPT.contains(&request.uri().path()) {
        return next.run(request).await;
    }

    match limiter.check() {
        Ok(()) => next.run(request).await,
        Err(not_until) => {
            let wait = not_until.wait_time_from(limiter.clock().now());
            let retry_after = wait.as_secs().max(1);
            warn!(path = %request.uri().path(), retry_after, "Rate limit exceeded");

            let body = RateLimitResponse {
                error: ErrorDetail {
                    r#type: "rate_limited".to_string(),
                    message: "Rate limit exceeded".to_string(),
                },
                retry_after,
            };
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_after.to_string())],
                Json(body),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<RateLimitConfig, ConfigError> {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        RateLimitConfig::from_vars(|k| vars.get(k).map(|v| v.to_string()))
    }

    #[test]
    fn test_rate_limit_config_from_vars() {
        let config = config_from(&[("RATE_LIMIT_RPS", "5")]).unwrap();

        assert_eq!(config.requests_per_second, 5);
        assert_eq!(config.burst_size, RateLimitConfig::default().burst_size);
        assert_eq!(config_from(&[]).unwrap(), RateLimitConfig::default());
    }

    #[test]
    fn test_rate_limit_config_rejects_malformed_values() {
        for vars in [
            [("RATE_LIMIT_RPS", "x")],
            [("RATE_LIMIT_RPS", "-3")],
            [("RATE_LIMIT_BURST", "0")],
        ] {
            let err = config_from(&vars).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { name, .. } if name == vars[0].0),
                "{err}"
            );
        }
    }

    #[test]
    fn test_quota_allows_configured_burst() {
        let config = RateLimitConfig {
            requests_per_second: 1,
            burst_size: 3,
        };
        let limiter = RateLimiter::direct(config.quota());

        for _ in 0..3 {
            assert!(limiter.check().is_ok());
        }
        assert!(limiter.check().is_err());
    }
}
