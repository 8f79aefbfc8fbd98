//! Fraud-score source backed by an external risk engine over HTTP.
//!
//! The engine receives the transaction fields on `POST {base_url}/score` and
//! answers with `{"fraud_score": <0..1>}`. Connectivity is probed with
//! `GET {base_url}/health`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::domain::{
    AppError, ConfigError, ExternalServiceError, FraudScoreSource, Transaction, parse_setting,
};

/// Default request timeout for the risk engine
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Connection settings for the external risk engine
#[derive(Debug)]
pub struct HttpFraudSourceConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub timeout: Duration,
}

impl HttpFraudSourceConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load from `FRAUD_ENGINE_URL`, `FRAUD_ENGINE_API_KEY` and
    /// `FRAUD_ENGINE_TIMEOUT_SECS`. Returns `None` when no URL is configured.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_vars(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let Some(base_url) = lookup("FRAUD_ENGINE_URL").filter(|u| !u.is_empty()) else {
            return Ok(None);
        };
        let api_key = lookup("FRAUD_ENGINE_API_KEY")
            .filter(|k| !k.is_empty())
            .map(SecretString::from);
        let timeout = parse_setting::<u64>(
            "FRAUD_ENGINE_TIMEOUT_SECS",
            lookup("FRAUD_ENGINE_TIMEOUT_SECS"),
        )?
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Some(Self {
            base_url,
            api_key,
            timeout: Duration::from_secs(timeout),
        }))
    }
}

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    transaction_id: &'a str,
    amount: f64,
    currency: &'a str,
    sender_account: &'a str,
    receiver_account: &'a str,
}

/// Response body of the risk engine
#[derive(Debug, Deserialize)]
pub struct ScoreResponse {
    pub fraud_score: f64,
}

/// Fraud-score source calling an external risk engine
#[derive(Debug)]
pub struct HttpFraudScoreSource {
    http_client: Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl HttpFraudScoreSource {
    pub fn new(config: HttpFraudSourceConfig) -> Result<Self, AppError> {
        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(AppError::Config(ConfigError::InvalidValue {
                name: "FRAUD_ENGINE_URL".to_string(),
                message: format!("expected an http(s) URL, got '{}'", config.base_url),
            }));
        }

        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                AppError::ExternalService(ExternalServiceError::Configuration(e.to_string()))
            })?;

        Ok(Self {
            http_client,
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn map_request_error(e: reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::ExternalService(ExternalServiceError::Timeout(e.to_string()))
        } else {
            AppError::ExternalService(ExternalServiceError::Network(e.to_string()))
        }
    }
}

#[async_trait]
impl FraudScoreSource for HttpFraudScoreSource {
    #[instrument(skip(self, transaction), fields(transaction_id = %transaction.transaction_id))]
    async fn sample(&self, transaction: &Transaction) -> Result<f64, AppError> {
        let url = format!("{}/score", self.base_url);
        let body = ScoreRequest {
            transaction_id: &transaction.transaction_id,
            amount: transaction.amount,
            currency: &transaction.currency,
            sender_account: &transaction.sender_account,
            receiver_account: &transaction.receiver_account,
        };

        debug!(url = %url, "Requesting fraud score");

        let mut request = self.http_client.post(&url).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Fraud engine request failed");
            Self::map_request_error(e)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Fraud engine returned error");
            return Err(AppError::ExternalService(ExternalServiceError::ApiError {
                status_code: status.as_u16(),
                message: body,
            }));
        }

        let parsed: ScoreResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse fraud engine response");
            AppError::ExternalService(ExternalServiceError::ParseError(e.to_string()))
        })?;

        if !(0.0..=1.0).contains(&parsed.fraud_score) {
            return Err(AppError::ExternalService(ExternalServiceError::ParseError(
                format!("fraud_score {} outside [0, 1]", parsed.fraud_score),
            )));
        }

        debug!(fraud_score = parsed.fraud_score, "Fraud score received");
        Ok(parsed.fraud_score)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_request_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::ExternalService(ExternalServiceError::Unavailable(
                format!("fraud engine health returned {}", response.status()),
            )))
        }
    }
}
