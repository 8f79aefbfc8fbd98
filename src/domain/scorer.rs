//! Aggregation of check outcomes into a score and risk tier.

use super::types::{CheckResults, RiskLevel};

/// Score, tier and validity derived from a set of check outcomes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub validation_score: f64,
    pub risk_level: RiskLevel,
    pub is_valid: bool,
}

/// Score a non-empty set of check results.
///
/// An empty set scores 0 and is never valid.
#[must_use]
pub fn score(results: &CheckResults) -> Score {
    let total = results.len();
    let passed = results.passed_count();
    let validation_score = if total == 0 {
        0.0
    } else {
        100.0 * passed as f64 / total as f64
    };

    Score {
        validation_score,
        risk_level: RiskLevel::from_score(validation_score),
        is_valid: total > 0 && passed == total,
    }
}
