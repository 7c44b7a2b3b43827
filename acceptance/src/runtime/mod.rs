//! Runtime Management
//!
//! This module handles the out-of-process instances and the notification
//! endpoints they deliver to.

pub mod address;
pub mod api_client;
pub mod instance;
pub mod output;
pub mod webhook;

// Re-export main types
pub use address::free_address;
pub use api_client::{AlertmanagerApi, ApiClient, MockAlertmanagerApi};
pub use instance::{ControlSignal, ManagedInstance};
pub use output::CapturedOutput;
pub use webhook::{ReceivedNotification, WebhookReceiver};
