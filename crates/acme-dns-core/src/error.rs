//! Error types for the ACME DNS webhook
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for ACME DNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single entry of the provider's `errors` list
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ApiErrorDetail {
    /// Machine-readable code (e.g. `INVALID_DATA`)
    #[serde(default)]
    pub error_code: String,
    /// Human-readable text; some provider errors carry a nested object here
    #[serde(default)]
    pub error_text: serde_json::Value,
}

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced a readable response
    #[error("{operation} for {fqdn} failed: {message}")]
    Transport {
        /// API operation (e.g. `getData`)
        operation: &'static str,
        /// Domain the call was made for
        fqdn: String,
        /// Underlying cause
        message: String,
    },

    /// The provider answered with a non-200 status
    #[error("{operation} for {fqdn}: non 200 response: {status} {body}")]
    Status {
        /// API operation
        operation: &'static str,
        /// Domain the call was made for
        fqdn: String,
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The provider answered 200 but reported `result: false`
    #[error("{operation} for {fqdn}: got result status in response: {status}, errors: {errors:?}, body: {body}")]
    Rejected {
        /// API operation
        operation: &'static str,
        /// Domain the call was made for
        fqdn: String,
        /// `answer.status` reported by the provider
        status: String,
        /// `answer.errors` reported by the provider, if any
        errors: Vec<ApiErrorDetail>,
        /// Raw response body
        body: String,
    },

    /// The response body did not match the expected envelope
    #[error("{operation} for {fqdn}: unmarshal response: {message}")]
    Decode {
        /// API operation
        operation: &'static str,
        /// Domain the call was made for
        fqdn: String,
        /// Parser message
        message: String,
    },

    /// A credential key could not be found in its secret
    #[error("key {key:?} not found in secret \"{namespace}/{secret}\"")]
    KeyNotFound {
        /// Key inside the secret
        key: String,
        /// Secret name
        secret: String,
        /// Namespace of the secret
        namespace: String,
    },

    /// Credential source failures other than a missing key
    #[error("Credential error: {0}")]
    Credentials(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Record store errors
    #[error("Record store error: {0}")]
    Store(String),

    /// Listener lifecycle errors (already running, not running, bind failure)
    #[error("Server error: {0}")]
    Server(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(
        operation: &'static str,
        fqdn: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Transport {
            operation,
            fqdn: fqdn.into(),
            message: message.to_string(),
        }
    }

    /// Create a decode error
    pub fn decode(
        operation: &'static str,
        fqdn: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Decode {
            operation,
            fqdn: fqdn.into(),
            message: message.to_string(),
        }
    }

    /// Create a credential error
    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a record store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a server lifecycle error
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the provider itself refused the call (as opposed to the call never arriving)
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Status { .. } | Self::Rejected { .. })
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_carries_body() {
        let err = Error::Status {
            operation: "changeRecords",
            fqdn: "example.com".to_string(),
            status: 403,
            body: "forbidden".to_string(),
        };

        let msg = err.to_string();
        assert!(msg.contains("changeRecords"));
        assert!(msg.contains("example.com"));
        assert!(msg.contains("403"));
        assert!(msg.contains("forbidden"));
        assert!(err.is_provider_failure());
    }

    #[test]
    fn test_key_not_found_message() {
        let err = Error::KeyNotFound {
            key: "login".to_string(),
            secret: "beget-creds".to_string(),
            namespace: "cert-manager".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "key \"login\" not found in secret \"cert-manager/beget-creds\""
        );
        assert!(!err.is_provider_failure());
    }
}
