//! Application entry point.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use transaction_validator::api::{RateLimitConfig, create_router, create_router_with_rate_limit};
use transaction_validator::app::{AppState, DEFAULT_REQUEST_TIMEOUT_SECS, ServiceInfo};
use transaction_validator::domain::{ConfigError, FraudScoreSource, parse_setting};
use transaction_validator::infra::{
    FaultInjectingFraudSource, HttpFraudScoreSource, HttpFraudSourceConfig, LatencyProfile,
    SimulatedFraudScoreSource,
};

/// Application configuration
struct Config {
    host: String,
    port: u16,
    info: ServiceInfo,
    /// External risk engine; the simulated source is used when absent
    fraud_engine: Option<HttpFraudSourceConfig>,
    /// Simulated latency for the built-in source
    simulated_latency: Option<LatencyProfile>,
    /// Probability of an injected fraud-source failure (0 disables)
    fraud_fault_rate: f64,
    enable_rate_limiting: bool,
    rate_limit_config: RateLimitConfig,
    request_timeout: Duration,
    json_logs: bool,
}

impl Config {
    fn from_env() -> Result<Self, ConfigError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_var("PORT", 8000u16)?;
        let info = ServiceInfo {
            version: env::var("APP_VERSION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            environment: env::var("ENVIRONMENT")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "production".to_string()),
        };

        let fraud_fault_rate = parse_var("FRAUD_FAULT_RATE", 0.0f64)?;
        if !(0.0..=1.0).contains(&fraud_fault_rate) {
            return Err(ConfigError::InvalidValue {
                name: "FRAUD_FAULT_RATE".to_string(),
                message: format!("must be within [0, 1], got {fraud_fault_rate}"),
            });
        }

        let enable_rate_limiting = env::var("ENABLE_RATE_LIMITING")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);
        let request_timeout =
            Duration::from_secs(parse_var("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?);
        let json_logs = env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            host,
            port,
            info,
            fraud_engine: HttpFraudSourceConfig::from_env()?,
            simulated_latency: LatencyProfile::from_env()?,
            fraud_fault_rate,
            enable_rate_limiting,
            rate_limit_config: RateLimitConfig::from_env()?,
            request_timeout,
            json_logs,
        })
    }
}

/// Parse an optional variable, rejecting values that are set but malformed
fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(parse_setting(name, env::var(name).ok())?.unwrap_or(default))
}

fn init_tracing(json_logs: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_fraud_source(config: &mut Config) -> Result<Arc<dyn FraudScoreSource>> {
    let source: Arc<dyn FraudScoreSource> = match config.fraud_engine.take() {
        Some(engine) => {
            info!("   ✓ Fraud engine client created ({})", engine.base_url);
            Arc::new(HttpFraudScoreSource::new(engine)?)
        }
        None => {
            let mut simulated = SimulatedFraudScoreSource::new();
            if let Some(latency) = config.simulated_latency.take() {
                info!(
                    "   ✓ Simulated fraud source with {}-{}ms latency",
                    latency.min_ms, latency.max_ms
                );
                simulated = simulated.with_latency(latency);
            } else {
                warn!("   ⚠ Simulated fraud source (no FRAUD_ENGINE_URL configured)");
            }
            Arc::new(simulated)
        }
    };

    if config.fraud_fault_rate > 0.0 {
        warn!(
            "   ⚠ Fault injection enabled ({:.2}% of fraud samples fail)",
            config.fraud_fault_rate * 100.0
        );
        return Ok(Arc::new(FaultInjectingFraudSource::new(
            source,
            config.fraud_fault_rate,
        )));
    }
    Ok(source)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let mut config = Config::from_env()?;
    init_tracing(config.json_logs);

    info!(
        "🏗️  PayFlow MX Transaction Validator v{} ({})",
        config.info.version, config.info.environment
    );

    let fraud_source = build_fraud_source(&mut config)?;

    let app_state = AppState::new(fraud_source)
        .with_service_info(config.info.clone())
        .with_request_timeout(config.request_timeout);
    let app_state = Arc::new(app_state);

    let router = if config.enable_rate_limiting {
        info!(
            "   ✓ Rate limiting enabled ({} rps, burst {})",
            config.rate_limit_config.requests_per_second, config.rate_limit_config.burst_size
        );
        create_router_with_rate_limit(app_state, config.rate_limit_config.clone())
    } else {
        info!("   ○ Rate limiting disabled");
        create_router(app_state)
    };

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Server starting on http://{}", addr);
    info!("📖 Swagger UI available at http://{}/docs", addr);
    info!("📄 OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
