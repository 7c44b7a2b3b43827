//! Shared error types for the acceptance harness

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("API returned error ({error_type}): {message}")]
    ApiError { error_type: String, message: String },

    #[error("API response carried no data")]
    MissingData,
}

pub type SharedResult<T> = Result<T, SharedError>;
