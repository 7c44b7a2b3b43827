//! Common test utilities and infrastructure
//!
//! This module provides shared test utilities, fixtures, and helpers
//! used across the acceptance integration suites.

pub mod fake_alertmanager;
pub mod helpers;

// Re-export commonly used items for convenience
pub use fake_alertmanager::FakeAlertmanager;
pub use helpers::Pipeline;
