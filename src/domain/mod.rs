//! Domain layer containing core business types, rule checks, scoring and traits.

pub mod checks;
pub mod error;
pub mod scorer;
pub mod traits;
pub mod types;

pub use checks::{
    AMOUNT_HARD_LIMIT, FRAUD_PASS_THRESHOLD, FRAUD_WARNING_THRESHOLD, HIGH_VALUE_THRESHOLD,
    HIGH_VALUE_WARNING, LOW_RISK_MIN_SCORE, MEDIUM_RISK_MIN_SCORE, UNUSUAL_PATTERNS_WARNING,
};
pub use error::{AppError, ConfigError, ExternalServiceError, ValidationError, parse_setting};
pub use traits::{Clock, FraudScoreSource, NoopObserver, SystemClock, ValidationObserver};
pub use types::{
    CheckName, CheckResults, ComponentChecks, Currency, ErrorDetail, ErrorResponse,
    HealthResponse, HealthStatus, RateLimitResponse, ReadinessDependencies, ReadinessResponse,
    RiskLevel, ServiceInfoResponse, StatsResponse, Transaction, ValidateTransactionRequest,
    ValidationResult,
};
