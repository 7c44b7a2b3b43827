//! Harness error types

use std::path::PathBuf;
use std::time::Duration;

use shared::SharedError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("Failed to allocate listen address: {0}")]
    AddressAllocation(#[source] std::io::Error),

    #[error("Configuration artifact {operation} failed for {}: {source}", .path.display())]
    ConfigArtifact {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to launch {}: {source}", .binary.display())]
    ProcessLaunch {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Instance {instance} is already running")]
    AlreadyRunning { instance: String },

    #[error("Instance {instance} is not running")]
    NotRunning { instance: String },

    #[error("Failed to send {signal} to {instance}: {message}")]
    Signal {
        instance: String,
        signal: &'static str,
        message: String,
    },

    #[error("Request to {url} failed with status {status}: {body}")]
    ApiStatus { url: String, status: u16, body: String },

    #[error("Silence {silence} has no identifier yet; it must be set before it is referenced")]
    MissingSilenceId { silence: String },

    #[error("Silence identifier changed from {previous} to {current}")]
    SilenceIdChanged { previous: String, current: String },

    #[error("Invalid relative time: {at}")]
    InvalidTime { at: f64 },

    #[error("Scheduled action panicked: {message}")]
    ActionPanicked { message: String },

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("Test did not finish within {0:?}")]
    Timeout(Duration),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;
