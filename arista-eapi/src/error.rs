//! Error types for the eAPI client.

use thiserror::Error;

/// Errors returned while talking to a device over eAPI.
#[derive(Debug, Error)]
pub enum EapiError {
    #[error("No connection profile for target {0:?}")]
    UnknownTarget(String),

    #[error("Invalid endpoint for {target:?}: {message}")]
    InvalidEndpoint { target: String, message: String },

    #[error("Connection profile {profile:?} {problem}")]
    InvalidProfile { profile: String, problem: String },

    #[error("Failed to reach {endpoint}: {source}")]
    Unreachable {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Authentication rejected by {endpoint} (HTTP {status})")]
    Unauthorized { endpoint: String, status: u16 },

    #[error("HTTP error from {endpoint}: status {status}")]
    Http { endpoint: String, status: u16 },

    #[error("Command failed with code {code}: {message}")]
    Command {
        code: i64,
        message: String,
        errors: Vec<String>,
    },

    #[error("Malformed eAPI response: {0}")]
    Protocol(String),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl EapiError {
    /// Whether the device could not be reached or refused our credentials.
    ///
    /// Everything else means the device answered but the batch did not
    /// produce usable results.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            EapiError::UnknownTarget(_)
                | EapiError::InvalidEndpoint { .. }
                | EapiError::Unreachable { .. }
                | EapiError::Unauthorized { .. }
        )
    }
}

/// Result type alias using [`EapiError`].
pub type Result<T> = std::result::Result<T, EapiError>;
