//! Probe request errors.

use arista_eapi::EapiError;
use axum::http::StatusCode;
use thiserror::Error;

use crate::collection::MetricsError;
use crate::prober::{ModuleKind, UnknownModule};
use crate::stats::Outcome;

/// Why a probe request produced no metrics.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Target parameter is missing")]
    MissingTarget,

    #[error(transparent)]
    UnknownModule(#[from] UnknownModule),

    #[error("Failed to connect to {target:?}")]
    Connection {
        target: String,
        #[source]
        source: EapiError,
    },

    #[error("Failed to run arista command")]
    Execution {
        #[source]
        source: EapiError,
    },

    #[error("Failed to decode {module} output")]
    Decode {
        module: ModuleKind,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to build metrics: {0}")]
    Metrics(#[from] MetricsError),
}

impl ScrapeError {
    /// Classify a device error raised while the batch was in flight.
    pub fn from_device(target: &str, source: EapiError) -> Self {
        if source.is_connection_error() {
            ScrapeError::Connection {
                target: target.to_string(),
                source,
            }
        } else {
            ScrapeError::Execution { source }
        }
    }

    /// Errors caused by the request itself rather than the device.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ScrapeError::MissingTarget | ScrapeError::UnknownModule(_)
        )
    }

    pub fn status(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            ScrapeError::MissingTarget | ScrapeError::UnknownModule(_) => Outcome::ClientError,
            ScrapeError::Connection { .. } => Outcome::ConnectionError,
            ScrapeError::Execution { .. }
            | ScrapeError::Decode { .. }
            | ScrapeError::Metrics(_) => Outcome::ExecutionError,
        }
    }
}
