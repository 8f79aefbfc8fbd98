//! Randomized fraud-score source for development and load testing.
//!
//! Draws a uniform score in `[0, 1)` for every transaction. When a latency
//! profile is configured, each sample also sleeps for a random delay, with
//! an occasional "peak hour" penalty on top.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use crate::domain::{AppError, ConfigError, FraudScoreSource, Transaction, parse_setting};

/// Simulated latency applied before a score is returned
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyProfile {
    /// Minimum base delay in milliseconds
    pub min_ms: u64,
    /// Maximum base delay in milliseconds
    pub max_ms: u64,
    /// Probability in `[0, 1]` that a sample hits peak-hour latency
    pub peak_probability: f64,
    /// Extra delay range added during peak hours, in milliseconds
    pub peak_extra_ms: (u64, u64),
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            min_ms: 50,
            max_ms: 150,
            peak_probability: 0.3,
            peak_extra_ms: (100, 300),
        }
    }
}

impl LatencyProfile {
    /// Load from `SIMULATED_LATENCY_MIN_MS` / `SIMULATED_LATENCY_MAX_MS`.
    ///
    /// Returns `None` when neither variable is set, which disables latency
    /// simulation entirely.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_vars(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        let min_ms =
            parse_setting::<u64>("SIMULATED_LATENCY_MIN_MS", lookup("SIMULATED_LATENCY_MIN_MS"))?;
        let max_ms =
            parse_setting::<u64>("SIMULATED_LATENCY_MAX_MS", lookup("SIMULATED_LATENCY_MAX_MS"))?;
        if min_ms.is_none() && max_ms.is_none() {
            return Ok(None);
        }

        let defaults = Self::default();
        let min_ms = min_ms.unwrap_or(defaults.min_ms);
        let max_ms = max_ms.unwrap_or(defaults.max_ms).max(min_ms);
        Ok(Some(Self {
            min_ms,
            max_ms,
            ..defaults
        }))
    }

    fn sample_delay(&self) -> Duration {
        let mut rng = rand::thread_rng();
        let mut delay_ms = rng.gen_range(self.min_ms..=self.max_ms.max(self.min_ms));
        if rng.gen_bool(self.peak_probability.clamp(0.0, 1.0)) {
            let (lo, hi) = self.peak_extra_ms;
            delay_ms += rng.gen_range(lo..=hi.max(lo));
        }
        Duration::from_millis(delay_ms)
    }
}

/// Fraud-score source returning uniformly random scores
#[derive(Debug, Clone, Default)]
pub struct SimulatedFraudScoreSource {
    latency: Option<LatencyProfile>,
}

impl SimulatedFraudScoreSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_latency(mut self, latency: LatencyProfile) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl FraudScoreSource for SimulatedFraudScoreSource {
    async fn sample(&self, transaction: &Transaction) -> Result<f64, AppError> {
        if let Some(latency) = &self.latency {
            let delay = latency.sample_delay();
            debug!(
                transaction_id = %transaction.transaction_id,
                delay_ms = delay.as_millis() as u64,
                "Simulating fraud engine latency"
            );
            tokio::time::sleep(delay).await;
        }

        let score: f64 = rand::thread_rng().gen_range(0.0..1.0);
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Currency;
    use std::collections::HashMap;

    fn tx() -> Transaction {
        Transaction::new("TX-S", 10.0, Currency::Eur, "1234567890", "0987654321")
    }

    #[tokio::test]
    async fn test_simulated_scores_are_in_unit_interval() {
        let source = SimulatedFraudScoreSource::new();
        for _ in 0..200 {
            let score = source.sample(&tx()).await.unwrap();
            assert!((0.0..1.0).contains(&score));
        }
    }

    #[tokio::test]
    async fn test_latency_profile_delays_sample() {
        let profile = LatencyProfile {
            min_ms: 20,
            max_ms: 20,
            peak_probability: 0.0,
            peak_extra_ms: (0, 0),
        };
        let source = SimulatedFraudScoreSource::new().with_latency(profile);

        let started = std::time::Instant::now();
        source.sample(&tx()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_latency_profile_from_vars() {
        let empty: HashMap<&str, &str> = HashMap::new();
        let profile = LatencyProfile::from_vars(|k| empty.get(k).map(|v| v.to_string()));
        assert!(profile.unwrap().is_none());

        let vars = HashMap::from([
            ("SIMULATED_LATENCY_MIN_MS", "80"),
            ("SIMULATED_LATENCY_MAX_MS", "40"),
        ]);
        let profile = LatencyProfile::from_vars(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap()
            .unwrap();
        assert_eq!(profile.min_ms, 80);
        assert_eq!(profile.max_ms, 80);
        assert_eq!(profile.peak_probability, 0.3);
    }

    #[test]
    fn test_latency_profile_rejects_malformed_value() {
        let vars = HashMap::from([("SIMULATED_LATENCY_MIN_MS", "x")]);
        let result = LatencyProfile::from_vars(|k| vars.get(k).map(|v| v.to_string()));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name, .. }) if name == "SIMULATED_LATENCY_MIN_MS"
        ));
    }
}
