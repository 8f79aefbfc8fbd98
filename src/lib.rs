//! Transaction validation service.
//!
//! Runs electronic transactions through six rule checks, derives a
//! validation score and risk tier, and exposes the verdict over HTTP.

pub mod api;
pub mod app;
pub mod domain;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
