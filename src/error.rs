//! Error types for the relay and their mapping to HTTP replies.

use crate::http::{RelayResponse, StatusCode};
use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T, E = RelayError> = std::result::Result<T, E>;

/// Failures that can end a single relay invocation.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("{0}")]
    MissingConfig(String),

    #[error("Upstream did not respond within {timeout_ms}ms")]
    UpstreamTimeout { timeout_ms: u64 },

    #[error("Upstream request failed: {0}")]
    Upstream(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Request body too large")]
    BodyTooLarge,

    #[error("Failed to read request body: {0}")]
    BodyRead(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::MissingConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::UpstreamTimeout { .. }
            | RelayError::Upstream(_)
            | RelayError::Serialization(_) => StatusCode::BAD_GATEWAY,
            RelayError::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            RelayError::BodyRead(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Build the JSON error reply for this failure. CORS headers are added
    /// by the caller.
    pub fn into_response(self) -> RelayResponse {
        let status = self.status();
        let body = match &self {
            RelayError::MethodNotAllowed(_) => serde_json::json!({ "error": "Only POST allowed" }),
            RelayError::UpstreamTimeout { .. }
            | RelayError::Upstream(_)
            | RelayError::Serialization(_) => serde_json::json!({
                "error": "Proxy error",
                "message": self.to_string(),
            }),
            RelayError::MissingConfig(_) | RelayError::BodyTooLarge | RelayError::BodyRead(_) => {
                serde_json::json!({ "error": self.to_string() })
            }
        };

        // Serializing a `json!` literal cannot fail.
        RelayResponse::json(status, &body)
            .unwrap_or_else(|_| RelayResponse::text(status, self.to_string()))
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        // Drop the URL so query-string secrets never reach the caller.
        RelayError::Upstream(err.without_url().to_string())
    }
}

/// Invalid values found while loading configuration at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}
