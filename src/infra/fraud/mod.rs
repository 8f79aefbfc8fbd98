//! Fraud-score source implementations.

pub mod fault;
pub mod http;
pub mod simulated;

pub use fault::FaultInjectingFraudSource;
pub use http::{HttpFraudScoreSource, HttpFraudSourceConfig};
pub use simulated::{LatencyProfile, SimulatedFraudScoreSource};
