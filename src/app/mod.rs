//! Application layer containing the validation pipeline and shared state.

pub mod pipeline;
pub mod service;
pub mod state;

pub use pipeline::ValidationPipeline;
pub use service::AppService;
pub use state::{AppState, DEFAULT_REQUEST_TIMEOUT_SECS, ServiceInfo};
