//! Shared types for the Alertmanager acceptance harness
//!
//! Contains the wire-level data exchanged with the system under test:
//! alerts and silences pushed through its API, and the notification
//! payloads it delivers to webhook receivers.

pub mod errors;
pub mod logging;
pub mod messages;
pub mod types;

pub use errors::*;
pub use types::*;

pub use messages::{ApiResponse, ApiStatus, SilenceCreated, WebhookMessage};
