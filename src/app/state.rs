//! Application state management.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{Clock, FraudScoreSource, SystemClock, ValidationObserver};
use crate::infra::ValidationMetrics;

use super::service::AppService;

/// Default per-request timeout applied by the router
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Static descriptor reported by `GET /` and `GET /api/v1/stats`
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub version: String,
    pub environment: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "production".to_string(),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AppService>,
    pub metrics: Arc<ValidationMetrics>,
    pub fraud_source: Arc<dyn FraudScoreSource>,
    pub info: ServiceInfo,
    pub request_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create a new application state using the system clock
    #[must_use]
    pub fn new(fraud_source: Arc<dyn FraudScoreSource>) -> Self {
        let metrics = Arc::new(ValidationMetrics::new());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let info = ServiceInfo::default();
        let service = Self::build_service(&fraud_source, &clock, &metrics, &info);
        Self {
            service,
            metrics,
            fraud_source,
            info,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            clock,
        }
    }

    /// Replace the clock (builder pattern)
    /// This rebuilds the service so results are stamped with the new clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self.service =
            Self::build_service(&self.fraud_source, &self.clock, &self.metrics, &self.info);
        self
    }

    /// Set the reported version and environment (builder pattern)
    #[must_use]
    pub fn with_service_info(mut self, info: ServiceInfo) -> Self {
        self.info = info;
        self.service =
            Self::build_service(&self.fraud_source, &self.clock, &self.metrics, &self.info);
        self
    }

    /// Set the per-request timeout (builder pattern)
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn build_service(
        fraud_source: &Arc<dyn FraudScoreSource>,
        clock: &Arc<dyn Clock>,
        metrics: &Arc<ValidationMetrics>,
        info: &ServiceInfo,
    ) -> Arc<AppService> {
        let observer: Arc<dyn ValidationObserver> = metrics.clone();
        Arc::new(AppService::new(
            Arc::clone(fraud_source),
            Arc::clone(clock),
            observer,
            info.version.clone(),
        ))
    }
}
