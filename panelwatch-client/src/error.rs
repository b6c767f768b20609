//! Error types for the dashboard backend client.

use thiserror::Error;

/// Errors that can occur when talking to the dashboard backend.
///
/// The client never retries internally; callers decide retry policy.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The backend responded with a non-success status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The transport-level request failed.
    #[error("Network error: {0}")]
    Network(String),

    /// The response body could not be parsed.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Timeout waiting for the backend.
    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}
