//! Error types for the connect crate.

use thiserror::Error;

use crate::session::ConnectionState;

/// Result type alias for connect operations.
pub type Result<T> = std::result::Result<T, ConnectError>;

/// Errors that can occur while talking to the backend or driving a connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// HTTP client error (request never completed)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON we expected
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend could not be reached for another reason
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Structured error response from the backend
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Operation not allowed in the current connection state
    #[error("Cannot {action} while connection is {state}")]
    InvalidTransition {
        action: &'static str,
        state: ConnectionState,
    },

    /// Credentials rejected by the credential policy
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error(transparent)]
    Core(#[from] knowguide_core::Error),
}

impl ConnectError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create an invalid credentials error
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::InvalidCredentials(message.into())
    }

    /// True when the request never produced a usable response.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ConnectError::Http(_) | ConnectError::Json(_) | ConnectError::Unavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(ConnectError::unavailable("connection refused").is_transport());
        assert!(serde_json::from_str::<serde_json::Value>("<html>")
            .map_err(ConnectError::from)
            .unwrap_err()
            .is_transport());
        assert!(!ConnectError::api(400, "bad").is_transport());
        assert!(!ConnectError::invalid_credentials("empty").is_transport());
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = ConnectError::InvalidTransition {
            action: "submit",
            state: ConnectionState::Connecting,
        };
        assert_eq!(err.to_string(), "Cannot submit while connection is connecting");
    }
}
