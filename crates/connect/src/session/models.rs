//! Request and response models for the brokerage login flow.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Brokerage login credentials.
///
/// Held in memory only for the duration of one connection attempt and sent
/// nowhere except the session start request.
#[derive(Clone, Default, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Outcome of `POST /api/connect-superhero` once a JSON body was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStartReply {
    Started,
    /// The backend refused; `error` is its message when it sent one
    Rejected { error: Option<String> },
}

/// Body of `GET /api/superhero-status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginStatus {
    #[serde(default)]
    pub logged_in: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl LoginStatus {
    pub fn waiting(message: impl Into<String>) -> Self {
        Self {
            logged_in: false,
            message: Some(message.into()),
        }
    }

    pub fn logged_in() -> Self {
        Self {
            logged_in: true,
            message: None,
        }
    }
}

/// Body of `GET /api/superhero-holdings`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingsPayload {
    /// Unstructured page text; its presence signals success
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Holdings retrieved after a successful login.
///
/// Only the raw text is available; extracting tickers and quantities from it
/// is left to a [`HoldingsHandler`](super::HoldingsHandler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsSnapshot {
    pub raw_text: String,
    pub message: Option<String>,
    pub fetched_at: DateTime<Utc>,
}
