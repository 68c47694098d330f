//! Provider error types.
//!
//! Every failure raised while resolving, contacting or decoding the Calamari
//! microservice is a [`ProviderError`]. Only premise checks downgrade these to
//! data; every other path propagates them to the lifecycle caller.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Provider error type
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Missing or invalid host registration / endpoint settings. Never retried.
    #[error("{message}")]
    Configuration { message: String },

    /// The microservice answered with a 4xx status.
    #[error("HTTP client error status {status} ({status_text}): {headers:?}")]
    ClientStatus {
        status: u16,
        status_text: String,
        headers: HeaderMap,
    },

    /// The microservice answered with a 5xx status.
    #[error("HTTP server error status {status} ({status_text}): {headers:?}")]
    ServerStatus {
        status: u16,
        status_text: String,
        headers: HeaderMap,
    },

    /// No response was received (connection refused, DNS, timeout, ...).
    #[error("I/O error on request: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// The description document could not be decoded.
    #[error("malformed description document: {0}")]
    Decode(#[from] serde_json::Error),

    /// An operation needed the transport client before `initialize()` built it.
    #[error("provider is not initialized")]
    NotInitialized,
}

impl ProviderError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        ProviderError::Configuration {
            message: message.into(),
        }
    }

    /// Classify a non-success status. Returns `None` for statuses that are
    /// neither client nor server errors.
    pub fn from_status(status: StatusCode, headers: HeaderMap) -> Option<Self> {
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let code = status.as_u16();

        if status.is_client_error() {
            Some(ProviderError::ClientStatus {
                status: code,
                status_text,
                headers,
            })
        } else if status.is_server_error() {
            Some(ProviderError::ServerStatus {
                status: code,
                status_text,
                headers,
            })
        } else {
            None
        }
    }

    /// Get the HTTP status code if the microservice answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::ClientStatus { status, .. } => Some(*status),
            ProviderError::ServerStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ProviderError::Configuration { .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(source: reqwest::Error) -> Self {
        ProviderError::Transport { source }
    }
}
