//! Message types exchanged with the system under test
//!
//! - `api`: response envelopes of the alert and silence API
//! - `webhook`: notification payloads delivered to webhook receivers

pub mod api;
pub mod webhook;

pub use api::{ApiResponse, ApiStatus, SilenceCreated};
pub use webhook::WebhookMessage;
