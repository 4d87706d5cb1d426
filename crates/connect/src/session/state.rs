//! Connection states and the user-facing messages attached to them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const STARTING_SESSION_MESSAGE: &str = "Starting secure session...";
pub const SESSION_STARTED_MESSAGE: &str = "Session started. secure login in progress...";
pub const BACKEND_OFFLINE_MESSAGE: &str = "Connection failed. Backend may be offline.";
pub const SESSION_START_FAILED_MESSAGE: &str = "Failed to start session";
pub const LOGGED_IN_MESSAGE: &str = "Successfully logged in! Fetching holdings...";
pub const MFA_REQUIRED_MESSAGE: &str =
    "MFA Required. (Auto-MFA not yet implemented, please retry without MFA or check logs)";
pub const LOGGING_IN_MESSAGE: &str = "Logging in...";
pub const HOLDINGS_SYNCED_MESSAGE: &str = "Holdings synced from Superhero!";
pub const HOLDINGS_FAILED_MESSAGE: &str = "Failed to fetch holdings after login.";
pub const LOGIN_TIMEOUT_MESSAGE: &str = "Login timed out. Please start the connection again.";

/// State of the brokerage connection. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Nothing in progress
    #[default]
    Idle,
    /// Collecting credentials
    Input,
    /// Session start request in flight
    Connecting,
    /// Session started, polling for login completion
    WaitingForLogin,
    /// Login detected
    Connected,
    /// Attempt failed; can be restarted
    Error,
}

impl ConnectionState {
    pub const ALL: [ConnectionState; 6] = [
        ConnectionState::Idle,
        ConnectionState::Input,
        ConnectionState::Connecting,
        ConnectionState::WaitingForLogin,
        ConnectionState::Connected,
        ConnectionState::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Input => "input",
            ConnectionState::Connecting => "connecting",
            ConnectionState::WaitingForLogin => "waiting_for_login",
            ConnectionState::Connected => "connected",
            ConnectionState::Error => "error",
        }
    }

    /// Whether a request or the poll loop is outstanding in this state.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::WaitingForLogin
        )
    }

    /// Whether the attempt has reached an end state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::Error)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of the holdings fetch that follows a successful login.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HoldingsSyncStatus {
    #[default]
    NotStarted,
    InFlight,
    Synced,
    Failed,
}

/// What the presentation layer sees after every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
    pub state: ConnectionState,
    /// Human-readable status, may be empty
    pub message: String,
    /// Identifier of the current connection attempt, set on submit
    pub attempt_id: Option<Uuid>,
    pub holdings: HoldingsSyncStatus,
    pub changed_at: DateTime<Utc>,
}
