//! Domain types with validation support.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::checks::{LOW_RISK_MIN_SCORE, MEDIUM_RISK_MIN_SCORE};

/// Currencies accepted by the service
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Mexican peso
    Mxn,
    /// US dollar
    Usd,
    /// Euro
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Mxn, Currency::Usd, Currency::Eur];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mxn => "MXN",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }

    /// Whether `code` names one of the supported currencies
    #[must_use]
    pub fn is_supported(code: &str) -> bool {
        code.parse::<Currency>().is_ok()
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MXN" => Ok(Self::Mxn),
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            _ => Err(format!("Invalid currency: {}", s)),
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction handed to the validation pipeline.
///
/// Values reaching the pipeline have already passed structural validation,
/// but the fields stay plain so the business rules can be exercised on
/// any input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Transaction {
    #[schema(example = "TX-001")]
    pub transaction_id: String,
    #[schema(example = 1000.5)]
    pub amount: f64,
    /// ISO 4217 currency code
    #[schema(example = "MXN")]
    pub currency: String,
    #[schema(example = "1234567890")]
    pub sender_account: String,
    #[schema(example = "0987654321")]
    pub receiver_account: String,
    pub timestamp: DateTime<Utc>,
    pub description: Option<String>,
}

impl Transaction {
    #[must_use]
    pub fn new(
        transaction_id: impl Into<String>,
        amount: f64,
        currency: Currency,
        sender_account: impl Into<String>,
        receiver_account: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            amount,
            currency: currency.as_str().to_string(),
            sender_account: sender_account.into(),
            receiver_account: receiver_account.into(),
            timestamp: Utc::now(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Wire request for `POST /api/v1/validate`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ValidateTransactionRequest {
    /// Caller-supplied transaction identifier
    #[validate(length(min = 1, message = "Transaction ID is required"))]
    #[schema(example = "TX-001")]
    pub transaction_id: String,
    /// Transaction amount, greater than 0 and at most 1,000,000
    #[validate(range(
        exclusive_min = 0.0,
        max = 1_000_000.0,
        message = "Amount must be greater than 0 and not exceed 1,000,000"
    ))]
    #[schema(example = 1000.5)]
    pub amount: f64,
    /// One of MXN, USD, EUR
    #[serde(default = "default_currency")]
    #[validate(custom(function = "validate_currency"))]
    #[schema(example = "MXN")]
    pub currency: String,
    #[schema(example = "1234567890")]
    pub sender_account: String,
    #[schema(example = "0987654321")]
    pub receiver_account: String,
    /// Defaults to the time the request is received
    pub timestamp: Option<DateTime<Utc>>,
    #[validate(length(max = 500, message = "Description must not exceed 500 characters"))]
    #[schema(example = "Pago de prueba")]
    pub description: Option<String>,
}

fn default_currency() -> String {
    Currency::Mxn.as_str().to_string()
}

fn validate_currency(currency: &str) -> Result<(), validator::ValidationError> {
    if Currency::is_supported(currency) {
        return Ok(());
    }
    let mut err = validator::ValidationError::new("unsupported_currency");
    err.message = Some("Currency must be one of: MXN, USD, EUR".into());
    Err(err)
}

impl ValidateTransactionRequest {
    #[must_use]
    pub fn new(
        transaction_id: impl Into<String>,
        amount: f64,
        currency: impl Into<String>,
        sender_account: impl Into<String>,
        receiver_account: impl Into<String>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            amount,
            currency: currency.into(),
            sender_account: sender_account.into(),
            receiver_account: receiver_account.into(),
            timestamp: None,
            description: None,
        }
    }

    /// Convert into a pipeline transaction, stamping `now` when no timestamp was sent
    #[must_use]
    pub fn into_transaction(self, now: DateTime<Utc>) -> Transaction {
        Transaction {
            transaction_id: self.transaction_id,
            amount: self.amount,
            currency: self.currency,
            sender_account: self.sender_account,
            receiver_account: self.receiver_account,
            timestamp: self.timestamp.unwrap_or(now),
            description: self.description,
        }
    }
}

/// Names of the rule checks, in execution order
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    AmountWithinLimits,
    ValidSender,
    ValidReceiver,
    DifferentAccounts,
    FraudCheck,
    Compliance,
}

impl CheckName {
    /// Every check, in the order the pipeline runs them
    pub const ALL: [CheckName; 6] = [
        CheckName::AmountWithinLimits,
        CheckName::ValidSender,
        CheckName::ValidReceiver,
        CheckName::DifferentAccounts,
        CheckName::FraudCheck,
        CheckName::Compliance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AmountWithinLimits => "amount_within_limits",
            Self::ValidSender => "valid_sender",
            Self::ValidReceiver => "valid_receiver",
            Self::DifferentAccounts => "different_accounts",
            Self::FraudCheck => "fraud_check",
            Self::Compliance => "compliance",
        }
    }
}

impl std::fmt::Display for CheckName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of each rule check keyed by check name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckResults(BTreeMap<CheckName, bool>);

impl CheckResults {
    pub(crate) fn record(&mut self, check: CheckName, passed: bool) {
        self.0.insert(check, passed);
    }

    #[must_use]
    pub fn get(&self, check: CheckName) -> Option<bool> {
        self.0.get(&check).copied()
    }

    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.0.values().filter(|passed| **passed).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CheckName, bool)> + '_ {
        self.0.iter().map(|(name, passed)| (*name, *passed))
    }
}

impl FromIterator<(CheckName, bool)> for CheckResults {
    fn from_iter<I: IntoIterator<Item = (CheckName, bool)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Coarse risk classification derived from the validation score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tier for a score in [0, 100]; lower bounds are inclusive
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= LOW_RISK_MIN_SCORE {
            Self::Low
        } else if score >= MEDIUM_RISK_MIN_SCORE {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Verdict returned for a validated transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct ValidationResult {
    #[schema(example = "TX-001")]
    pub transaction_id: String,
    /// True only when every check passed
    pub is_valid: bool,
    /// Percentage of checks passed, 0 to 100
    #[schema(example = 100.0)]
    pub validation_score: f64,
    pub risk_level: RiskLevel,
    /// Outcome per check name
    #[schema(value_type = Object)]
    pub checks_passed: CheckResults,
    /// Human-readable warnings in check execution order
    pub warnings: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ValidationResult {
    /// Metric label for the validation outcome
    pub fn outcome(&self) -> &'static str {
        if self.is_valid { "approved" } else { "rejected" }
    }
}

/// Health status enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All systems operational
    Healthy,
    /// Some dependencies unavailable but the API still answers
    Degraded,
    /// Critical systems unavailable
    Unhealthy,
}

/// Per-component status reported by the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComponentChecks {
    #[schema(example = "ok")]
    pub api: String,
    #[schema(example = "ok")]
    pub fraud_engine: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    #[schema(example = "1.0.0")]
    pub version: String,
    pub checks: ComponentChecks,
}

impl HealthResponse {
    #[must_use]
    pub fn new(fraud_engine: HealthStatus, version: impl Into<String>, now: DateTime<Utc>) -> Self {
        let status = match fraud_engine {
            HealthStatus::Healthy => HealthStatus::Healthy,
            _ => HealthStatus::Degraded,
        };
        let fraud_engine = match fraud_engine {
            HealthStatus::Healthy => "ok",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unavailable",
        };
        Self {
            status,
            timestamp: now,
            version: version.into(),
            checks: ComponentChecks {
                api: "ok".to_string(),
                fraud_engine: fraud_engine.to_string(),
            },
        }
    }
}

/// Readiness probe dependencies
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadinessDependencies {
    #[schema(example = "connected")]
    pub fraud_engine: String,
}

/// Readiness probe response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub dependencies: ReadinessDependencies,
}

impl ReadinessResponse {
    #[must_use]
    pub fn new(fraud_engine_ready: bool) -> Self {
        Self {
            ready: fraud_engine_ready,
            dependencies: ReadinessDependencies {
                fraud_engine: if fraud_engine_ready {
                    "connected".to_string()
                } else {
                    "unavailable".to_string()
                },
            },
        }
    }
}

/// Service descriptor returned by `GET /`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfoResponse {
    #[schema(example = "PayFlow MX - Transaction Validator")]
    pub service: String,
    #[schema(example = "1.0.0")]
    pub version: String,
    #[schema(example = "operational")]
    pub status: String,
    #[schema(example = "production")]
    pub environment: String,
}

/// Service statistics returned by `GET /api/v1/stats`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    #[schema(example = "transaction-validator")]
    pub service: String,
    #[schema(example = "operational")]
    pub uptime: String,
    #[schema(example = "1.0.0")]
    pub version: String,
    #[schema(example = "/metrics")]
    pub metrics_endpoint: String,
    #[schema(example = "/health")]
    pub health_endpoint: String,
}

/// Error response structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Error type identifier
    #[schema(example = "validation_error")]
    pub r#type: String,
    /// Human-readable error message
    #[schema(example = "Currency must be one of: MXN, USD, EUR")]
    pub message: String,
}

/// Rate limit exceeded response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RateLimitResponse {
    /// Error details
    pub error: ErrorDetail,
    /// Seconds until rate limit resets
    #[schema(example = 1)]
    pub retry_after: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn valid_request() -> ValidateTransactionRequest {
        ValidateTransactionRequest::new("TX-001", 1000.50, "MXN", "1234567890", "0987654321")
    }

    #[test]
    fn test_currency_display_and_parsing() {
        for currency in Currency::ALL {
            assert_eq!(currency.to_string(), currency.as_str());
            assert_eq!(Currency::from_str(currency.as_str()).unwrap(), currency);
        }
        assert!(Currency::from_str("JPY").is_err());
        assert!(Currency::from_str("mxn").is_err());
    }

    #[test]
    fn test_request_validation_accepts_reference_transaction() {
        assert!(valid_request().validate().is_ok());
    }

    #[test]
    fn test_request_validation_rejects_structural_errors() {
        let mut req = valid_request();
        req.currency = "JPY".to_string();
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.amount = 2_000_000.0;
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.amount = 0.0;
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.amount = -1000.0;
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.transaction_id = String::new();
        assert!(req.validate().is_err());

        let mut req = valid_request();
        req.description = Some("x".repeat(501));
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_request_validation_boundaries() {
        let mut req = valid_request();
        req.amount = 1_000_000.0;
        assert!(req.validate().is_ok());

        let mut req = valid_request();
        req.description = Some("ñ".repeat(500));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_request_currency_defaults_to_mxn() {
        let req: ValidateTransactionRequest = serde_json::from_value(serde_json::json!({
            "transaction_id": "TX-010",
            "amount": 10.0,
            "sender_account": "1234567890",
            "receiver_account": "0987654321"
        }))
        .unwrap();
        assert_eq!(req.currency, "MXN");
        assert!(req.timestamp.is_none());
    }

    #[test]
    fn test_into_transaction_defaults_timestamp() {
        let now = Utc::now();
        let tx = valid_request().into_transaction(now);
        assert_eq!(tx.timestamp, now);

        let sent = DateTime::parse_from_rfc3339("2025-12-10T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut req = valid_request();
        req.timestamp = Some(sent);
        assert_eq!(req.into_transaction(now).timestamp, sent);
    }

    #[test]
    fn test_risk_level_tier_boundaries() {
        assert_eq!(RiskLevel::from_score(100.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(90.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(89.999), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(70.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(69.999), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::High);
    }

    #[test]
    fn test_check_results_serialize_with_snake_case_keys() {
        let results: CheckResults = [
            (CheckName::AmountWithinLimits, true),
            (CheckName::DifferentAccounts, false),
        ]
        .into_iter()
        .collect();

        let json = serde_json::to_value(&results).unwrap();
        assert_eq!(json["amount_within_limits"], true);
        assert_eq!(json["different_accounts"], false);
        assert_eq!(results.passed_count(), 1);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_check_names_are_in_execution_order() {
        let names: Vec<&str> = CheckName::ALL.iter().map(CheckName::as_str).collect();
        assert_eq!(
            names,
            vec![
                "amount_within_limits",
                "valid_sender",
                "valid_receiver",
                "different_accounts",
                "fraud_check",
                "compliance"
            ]
        );
    }

    #[test]
    fn test_health_response_degrades_without_fraud_engine() {
        let health = HealthResponse::new(HealthStatus::Unhealthy, "1.0.0", Utc::now());
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.checks.api, "ok");
        assert_eq!(health.checks.fraud_engine, "unavailable");

        let health = HealthResponse::new(HealthStatus::Healthy, "1.0.0", Utc::now());
        assert_eq!(health.status, HealthStatus::Healthy);
    }
}
