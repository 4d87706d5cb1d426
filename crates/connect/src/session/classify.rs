//! Interpretation of login status payloads.

use serde::Serialize;

use super::models::LoginStatus;

/// Marker the backend puts in its status message when a second factor is demanded.
pub const MFA_MARKER: &str = "MFA";

/// What a status payload means for the connection flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoginClassification {
    LoggedIn,
    /// The provider wants a second factor the backend cannot supply
    MfaPending,
    StillWaiting { message: Option<String> },
}

/// Maps a status payload to a [`LoginClassification`].
pub trait StatusClassifier: Send + Sync {
    fn classify(&self, status: &LoginStatus) -> LoginClassification;
}

/// Classifies by the `logged_in` flag, then by the MFA marker in the message.
#[derive(Debug, Clone, Default)]
pub struct MessageStatusClassifier;

impl StatusClassifier for MessageStatusClassifier {
    fn classify(&self, status: &LoginStatus) -> LoginClassification {
        if status.logged_in {
            return LoginClassification::LoggedIn;
        }
        match status.message.as_deref() {
            Some(message) if message.contains(MFA_MARKER) => LoginClassification::MfaPending,
            Some(message) if !message.is_empty() => LoginClassification::StillWaiting {
                message: Some(message.to_string()),
            },
            _ => LoginClassification::StillWaiting { message: None },
        }
    }
}

/// Classify with the default message-based rule.
pub fn classify(status: &LoginStatus) -> LoginClassification {
    MessageStatusClassifier.classify(status)
}
