//! Prints randomized validation requests for manual and load testing.
//!
//! Usage: `generate_transaction [--count N] [--high-value]`
//!
//! Each line is a JSON body ready to POST to `/api/v1/validate`.

use anyhow::{Context, Result};
use rand::Rng;
use rand::seq::SliceRandom;
use transaction_validator::domain::{Currency, HIGH_VALUE_THRESHOLD, ValidateTransactionRequest};
use uuid::Uuid;

fn random_account(rng: &mut impl Rng) -> String {
    format!("ACC{:09}", rng.gen_range(0..1_000_000_000u32))
}

fn generate(rng: &mut impl Rng, high_value: bool) -> ValidateTransactionRequest {
    let id = format!("TX-{}", Uuid::new_v4());
    let amount = if high_value {
        rng.gen_range(HIGH_VALUE_THRESHOLD..=1_000_000.0f64).round()
    } else {
        f64::from(rng.gen_range(100..100_100u32))
    };
    let currency = Currency::ALL
        .choose(rng)
        .copied()
        .unwrap_or(Currency::Mxn);

    let mut request = ValidateTransactionRequest::new(
        id.clone(),
        amount,
        currency.as_str(),
        random_account(rng),
        random_account(rng),
    );
    request.description = Some(format!("Load test transaction {id}"));
    request
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let high_value = args.iter().any(|arg| arg == "--high-value");
    let count = match args.iter().position(|arg| arg == "--count") {
        Some(idx) => args
            .get(idx + 1)
            .context("--count requires a value")?
            .parse::<usize>()
            .context("--count must be a positive integer")?,
        None => 1,
    };

    let mut rng = rand::thread_rng();
    for _ in 0..count {
        let request = generate(&mut rng, high_value);
        println!("{}", serde_json::to_string(&request)?);
    }
    Ok(())
}
