//! Infrastructure layer implementations.

pub mod fraud;
pub mod metrics;

pub use fraud::{
    FaultInjectingFraudSource, HttpFraudScoreSource, HttpFraudSourceConfig, LatencyProfile,
    SimulatedFraudScoreSource,
};
pub use metrics::{InFlightGuard, ValidationMetrics};
