//! Rule checks applied to every transaction.
//!
//! Each check is a pure function of the transaction (plus the fraud score
//! sampled once per validation). Checks never observe each other's outcome,
//! so the order only affects the sequence of warnings.

use super::types::{CheckName, Currency, Transaction};

/// Amounts above this fail `amount_within_limits`
pub const AMOUNT_HARD_LIMIT: f64 = 1_000_000.0;

/// Amounts above this emit a high-value warning
pub const HIGH_VALUE_THRESHOLD: f64 = 500_000.0;

/// Fraud scores strictly below this pass `fraud_check`
pub const FRAUD_PASS_THRESHOLD: f64 = 0.15;

/// Fraud scores at or above this emit a warning, even when the check passes
pub const FRAUD_WARNING_THRESHOLD: f64 = 0.10;

/// Minimum account identifier length, in characters
pub const MIN_ACCOUNT_LENGTH: usize = 10;

/// Lowest score classified as low risk
pub const LOW_RISK_MIN_SCORE: f64 = 90.0;

/// Lowest score classified as medium risk
pub const MEDIUM_RISK_MIN_SCORE: f64 = 70.0;

pub const HIGH_VALUE_WARNING: &str = "high-value transaction requires additional approval";
pub const UNUSUAL_PATTERNS_WARNING: &str = "unusual patterns detected";

/// Inputs shared by all checks for a single validation
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub transaction: &'a Transaction,
    pub fraud_score: f64,
}

/// Result of running one check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub passed: bool,
    pub warning: Option<&'static str>,
}

impl CheckOutcome {
    fn pass_if(passed: bool) -> Self {
        Self {
            passed,
            warning: None,
        }
    }

    fn warn_if(mut self, condition: bool, warning: &'static str) -> Self {
        if condition {
            self.warning = Some(warning);
        }
        self
    }
}

/// Run a single named check
#[must_use]
pub fn evaluate(check: CheckName, ctx: &CheckContext<'_>) -> CheckOutcome {
    let tx = ctx.transaction;
    match check {
        CheckName::AmountWithinLimits => check_amount(tx.amount),
        CheckName::ValidSender => check_account(&tx.sender_account),
        CheckName::ValidReceiver => check_account(&tx.receiver_account),
        CheckName::DifferentAccounts => {
            CheckOutcome::pass_if(tx.sender_account != tx.receiver_account)
        }
        CheckName::FraudCheck => check_fraud_score(ctx.fraud_score),
        CheckName::Compliance => CheckOutcome::pass_if(Currency::is_supported(&tx.currency)),
    }
}

fn check_amount(amount: f64) -> CheckOutcome {
    CheckOutcome::pass_if(amount <= AMOUNT_HARD_LIMIT)
        .warn_if(amount > HIGH_VALUE_THRESHOLD, HIGH_VALUE_WARNING)
}

fn check_account(account: &str) -> CheckOutcome {
    CheckOutcome::pass_if(account.chars().count() >= MIN_ACCOUNT_LENGTH)
}

fn check_fraud_score(score: f64) -> CheckOutcome {
    CheckOutcome::pass_if(score < FRAUD_PASS_THRESHOLD)
        .warn_if(score >= FRAUD_WARNING_THRESHOLD, UNUSUAL_PATTERNS_WARNING)
}
