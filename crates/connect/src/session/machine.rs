//! Transition core of the connection flow.
//!
//! [`ConnectionMachine`] performs no I/O. Each event either mutates the state
//! and returns the [`Effect`]s the caller must carry out, or is rejected. The
//! controller owns the only instance and executes the effects.
//!
//! Internal events carry the attempt number they belong to. Events from an
//! older attempt, or arriving in a state that no longer expects them, are
//! dropped without error.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::classify::LoginClassification;
use super::models::Credentials;
use super::state::{
    ConnectionSnapshot, ConnectionState, HoldingsSyncStatus, HOLDINGS_FAILED_MESSAGE,
    HOLDINGS_SYNCED_MESSAGE, LOGGED_IN_MESSAGE, LOGGING_IN_MESSAGE, LOGIN_TIMEOUT_MESSAGE,
    MFA_REQUIRED_MESSAGE, SESSION_STARTED_MESSAGE, STARTING_SESSION_MESSAGE,
};
use crate::error::{ConnectError, Result};

/// Inputs to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineEvent {
    /// User opens the credential form
    Start,
    /// User closes the form (or dismisses an error)
    Cancel,
    /// User edits the credential form
    EnterCredentials(Credentials),
    /// User submits the entered credentials
    Submit,
    SessionStarted {
        attempt: u64,
    },
    SessionFailed {
        attempt: u64,
        message: String,
    },
    Status {
        attempt: u64,
        classification: LoginClassification,
    },
    PollExhausted {
        attempt: u64,
    },
    HoldingsSynced {
        attempt: u64,
    },
    HoldingsFailed {
        attempt: u64,
    },
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Issue the session start request
    BeginSession {
        attempt: u64,
        credentials: Credentials,
    },
    StartPolling {
        attempt: u64,
    },
    /// Cancel the live poll handle
    StopPolling,
    FetchHoldings {
        attempt: u64,
    },
}

/// Result of handling one event.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Outcome {
    pub effects: Vec<Effect>,
    /// Whether state, message or holdings status changed
    pub changed: bool,
}

#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    message: String,
    draft: Credentials,
    attempt: u64,
    attempt_id: Option<Uuid>,
    polling: bool,
    holdings: HoldingsSyncStatus,
    changed_at: DateTime<Utc>,
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionMachine {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Idle,
            message: String::new(),
            draft: Credentials::default(),
            attempt: 0,
            attempt_id: None,
            polling: false,
            holdings: HoldingsSyncStatus::NotStarted,
            changed_at: Utc::now(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Credentials entered so far in the current form.
    pub fn draft(&self) -> &Credentials {
        &self.draft
    }

    /// Number of the current (or last) connection attempt.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn holdings(&self) -> HoldingsSyncStatus {
        self.holdings
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        ConnectionSnapshot {
            state: self.state,
            message: self.message.clone(),
            attempt_id: self.attempt_id,
            holdings: self.holdings,
            changed_at: self.changed_at,
        }
    }

    pub fn handle(&mut self, event: MachineEvent) -> Result<Outcome> {
        let before = (self.state, self.message.clone(), self.holdings);
        let mut effects = Vec::new();

        match event {
            MachineEvent::Start => {
                self.require("start", &[ConnectionState::Idle, ConnectionState::Error])?;
                self.draft = Credentials::default();
                self.holdings = HoldingsSyncStatus::NotStarted;
                self.enter(ConnectionState::Input, "", &mut effects);
            }
            MachineEvent::Cancel => {
                self.require("cancel", &[ConnectionState::Input, ConnectionState::Error])?;
                self.draft = Credentials::default();
                self.enter(ConnectionState::Idle, "", &mut effects);
            }
            MachineEvent::EnterCredentials(credentials) => {
                self.require("enter credentials", &[ConnectionState::Input])?;
                self.draft = credentials;
            }
            MachineEvent::Submit => {
                self.require("submit", &[ConnectionState::Input])?;
                self.attempt += 1;
                self.attempt_id = Some(Uuid::new_v4());
                let credentials = std::mem::take(&mut self.draft);
                self.enter(
                    ConnectionState::Connecting,
                    STARTING_SESSION_MESSAGE,
                    &mut effects,
                );
                effects.push(Effect::BeginSession {
                    attempt: self.attempt,
                    credentials,
                });
            }
            MachineEvent::SessionStarted { attempt } => {
                if self.expects(attempt, ConnectionState::Connecting) {
                    self.enter(
                        ConnectionState::WaitingForLogin,
                        SESSION_STARTED_MESSAGE,
                        &mut effects,
                    );
                }
            }
            MachineEvent::SessionFailed { attempt, message } => {
                if self.expects(attempt, ConnectionState::Connecting) {
                    self.enter(ConnectionState::Error, &message, &mut effects);
                }
            }
            MachineEvent::Status {
                attempt,
                classification,
            } => {
                if self.expects(attempt, ConnectionState::WaitingForLogin) {
                    match classification {
                        LoginClassification::LoggedIn => {
                            self.enter(ConnectionState::Connected, LOGGED_IN_MESSAGE, &mut effects);
                            self.holdings = HoldingsSyncStatus::InFlight;
                            effects.push(Effect::FetchHoldings { attempt });
                        }
                        LoginClassification::MfaPending => {
                            self.message = MFA_REQUIRED_MESSAGE.to_string();
                        }
                        LoginClassification::StillWaiting { message } => {
                            self.message = message
                                .filter(|m| !m.is_empty())
                                .unwrap_or_else(|| LOGGING_IN_MESSAGE.to_string());
                        }
                    }
                }
            }
            MachineEvent::PollExhausted { attempt } => {
                if self.expects(attempt, ConnectionState::WaitingForLogin) {
                    self.enter(ConnectionState::Error, LOGIN_TIMEOUT_MESSAGE, &mut effects);
                }
            }
            MachineEvent::HoldingsSynced { attempt } => {
                if self.expects_holdings(attempt) {
                    self.holdings = HoldingsSyncStatus::Synced;
                    self.message = HOLDINGS_SYNCED_MESSAGE.to_string();
                }
            }
            MachineEvent::HoldingsFailed { attempt } => {
                if self.expects_holdings(attempt) {
                    self.holdings = HoldingsSyncStatus::Failed;
                    self.message = HOLDINGS_FAILED_MESSAGE.to_string();
                }
            }
        }

        let changed = before != (self.state, self.message.clone(), self.holdings);
        if changed {
            self.changed_at = Utc::now();
        }
        Ok(Outcome { effects, changed })
    }

    fn require(&self, action: &'static str, allowed: &[ConnectionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(ConnectError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }

    fn expects(&self, attempt: u64, state: ConnectionState) -> bool {
        attempt == self.attempt && self.state == state
    }

    fn expects_holdings(&self, attempt: u64) -> bool {
        self.expects(attempt, ConnectionState::Connected)
            && self.holdings == HoldingsSyncStatus::InFlight
    }

    /// Move to `next`. Polling is stopped before leaving `waiting_for_login`
    /// and started on entering it.
    fn enter(&mut self, next: ConnectionState, message: &str, effects: &mut Vec<Effect>) {
        let polls = next == ConnectionState::WaitingForLogin;
        if self.polling && !polls {
            effects.push(Effect::StopPolling);
            self.polling = false;
        }
        self.state = next;
        self.message = message.to_string();
        if polls && !self.polling {
            self.polling = true;
            effects.push(Effect::StartPolling {
                attempt: self.attempt,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waiting_machine() -> ConnectionMachine {
        let mut machine = ConnectionMachine::new();
        machine.handle(MachineEvent::Start).unwrap();
        machine
            .handle(MachineEvent::EnterCredentials(Credentials::new("jane", "pw")))
            .unwrap();
        machine.handle(MachineEvent::Submit).unwrap();
        machine
            .handle(MachineEvent::SessionStarted { attempt: 1 })
            .unwrap();
        machine
    }

    #[test]
    fn test_happy_path_effects() {
        let mut machine = ConnectionMachine::new();
        assert_eq!(machine.state(), ConnectionState::Idle);

        let outcome = machine.handle(MachineEvent::Start).unwrap();
        assert!(outcome.effects.is_empty());
        assert_eq!(machine.state(), ConnectionState::Input);

        machine
            .handle(MachineEvent::EnterCredentials(Credentials::new("jane", "pw")))
            .unwrap();
        let outcome = machine.handle(MachineEvent::Submit).unwrap();
        assert_eq!(
            outcome.effects,
            vec![Effect::BeginSession {
                attempt: 1,
                credentials: Credentials::new("jane", "pw"),
            }]
        );
        assert_eq!(machine.state(), ConnectionState::Connecting);
        assert_eq!(machine.message(), STARTING_SESSION_MESSAGE);
        assert!(machine.draft().is_empty());

        let outcome = machine
            .handle(MachineEvent::SessionStarted { attempt: 1 })
            .unwrap();
        assert_eq!(outcome.effects, vec![Effect::StartPolling { attempt: 1 }]);
        assert_eq!(machine.message(), SESSION_STARTED_MESSAGE);
        assert!(machine.is_polling());

        let outcome = machine
            .handle(MachineEvent::Status {
                attempt: 1,
                classification: LoginClassification::LoggedIn,
            })
            .unwrap();
        assert_eq!(
            outcome.effects,
            vec![Effect::StopPolling, Effect::FetchHoldings { attempt: 1 }]
        );
        assert_eq!(machine.state(), ConnectionState::Connected);
        assert_eq!(machine.holdings(), HoldingsSyncStatus::InFlight);
        assert!(!machine.is_polling());

        machine
            .handle(MachineEvent::HoldingsSynced { attempt: 1 })
            .unwrap();
        assert_eq!(machine.message(), HOLDINGS_SYNCED_MESSAGE);
        assert_eq!(machine.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_status_messages() {
        let mut machine = waiting_machine();

        machine
            .handle(MachineEvent::Status {
                attempt: 1,
                classification: LoginClassification::StillWaiting {
                    message: Some("Verifying".to_string()),
                },
            })
            .unwrap();
        assert_eq!(machine.message(), "Verifying");

        machine
            .handle(MachineEvent::Status {
                attempt: 1,
                classification: LoginClassification::MfaPending,
            })
            .unwrap();
        assert_eq!(machine.message(), MFA_REQUIRED_MESSAGE);

        machine
            .handle(MachineEvent::Status {
                attempt: 1,
                classification: LoginClassification::StillWaiting { message: None },
            })
            .unwrap();
        assert_eq!(machine.message(), LOGGING_IN_MESSAGE);
        assert_eq!(machine.state(), ConnectionState::WaitingForLogin);
        assert!(machine.is_polling());
    }

    #[test]
    fn test_second_login_detection_is_ignored() {
        let mut machine = waiting_machine();
        let logged_in = MachineEvent::Status {
            attempt: 1,
            classification: LoginClassification::LoggedIn,
        };
        let first = machine.handle(logged_in.clone()).unwrap();
        assert_eq!(first.effects.len(), 2);

        let second = machine.handle(logged_in).unwrap();
        assert_eq!(second, Outcome::default());
    }

    #[test]
    fn test_submit_outside_input_is_rejected() {
        let mut machine = ConnectionMachine::new();
        let err = machine.handle(MachineEvent::Submit).unwrap_err();
        assert!(matches!(
            err,
            ConnectError::InvalidTransition {
                action: "submit",
                state: ConnectionState::Idle
            }
        ));

        let mut machine = waiting_machine();
        assert!(machine.handle(MachineEvent::Submit).is_err());
        assert_eq!(machine.attempt(), 1);
        assert_eq!(machine.state(), ConnectionState::WaitingForLogin);
    }

    #[test]
    fn test_session_failure_and_restart() {
        let mut machine = ConnectionMachine::new();
        machine.handle(MachineEvent::Start).unwrap();
        machine.handle(MachineEvent::Submit).unwrap();
        let outcome = machine
            .handle(MachineEvent::SessionFailed {
                attempt: 1,
                message: "Invalid login".to_string(),
            })
            .unwrap();
        assert!(outcome.effects.is_empty());
        assert_eq!(machine.state(), ConnectionState::Error);
        assert_eq!(machine.message(), "Invalid login");

        machine.handle(MachineEvent::Start).unwrap();
        assert_eq!(machine.state(), ConnectionState::Input);
        assert_eq!(machine.message(), "");
    }

    #[test]
    fn test_stale_attempt_events_are_dropped() {
        let mut machine = ConnectionMachine::new();
        machine.handle(MachineEvent::Start).unwrap();
        machine.handle(MachineEvent::Submit).unwrap();
        machine
            .handle(MachineEvent::SessionFailed {
                attempt: 1,
                message: "nope".to_string(),
            })
            .unwrap();
        machine.handle(MachineEvent::Start).unwrap();
        machine.handle(MachineEvent::Submit).unwrap();

        let outcome = machine
            .handle(MachineEvent::SessionStarted { attempt: 1 })
            .unwrap();
        assert_eq!(outcome, Outcome::default());
        assert_eq!(machine.state(), ConnectionState::Connecting);
        assert_eq!(machine.attempt(), 2);
    }

    #[test]
    fn test_cancel_discards_draft() {
        let mut machine = ConnectionMachine::new();
        machine.handle(MachineEvent::Start).unwrap();
        machine
            .handle(MachineEvent::EnterCredentials(Credentials::new("jane", "pw")))
            .unwrap();
        machine.handle(MachineEvent::Cancel).unwrap();
        assert_eq!(machine.state(), ConnectionState::Idle);
        assert!(machine.draft().is_empty());

        machine.handle(MachineEvent::Start).unwrap();
        let outcome = machine.handle(MachineEvent::Submit).unwrap();
        assert_eq!(
            outcome.effects,
            vec![Effect::BeginSession {
                attempt: 1,
                credentials: Credentials::default(),
            }]
        );
    }

    #[test]
    fn test_poll_exhaustion_times_out() {
        let mut machine = waiting_machine();
        let outcome = machine
            .handle(MachineEvent::PollExhausted { attempt: 1 })
            .unwrap();
        assert_eq!(outcome.effects, vec![Effect::StopPolling]);
        assert_eq!(machine.state(), ConnectionState::Error);
        assert_eq!(machine.message(), LOGIN_TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_holdings_failure_keeps_connected() {
        let mut machine = waiting_machine();
        machine
            .handle(MachineEvent::Status {
                attempt: 1,
                classification: LoginClassification::LoggedIn,
            })
            .unwrap();
        machine
            .handle(MachineEvent::HoldingsFailed { attempt: 1 })
            .unwrap();
        assert_eq!(machine.state(), ConnectionState::Connected);
        assert_eq!(machine.holdings(), HoldingsSyncStatus::Failed);
        assert_eq!(machine.message(), HOLDINGS_FAILED_MESSAGE);

        // A late success does not overwrite the recorded failure
        let outcome = machine
            .handle(MachineEvent::HoldingsSynced { attempt: 1 })
            .unwrap();
        assert!(!outcome.changed);
    }

    #[test]
    fn test_connected_is_terminal() {
        let mut machine = waiting_machine();
        machine
            .handle(MachineEvent::Status {
                attempt: 1,
                classification: LoginClassification::LoggedIn,
            })
            .unwrap();
        assert!(machine.handle(MachineEvent::Start).is_err());
        assert!(machine.handle(MachineEvent::Cancel).is_err());
        assert!(machine.handle(MachineEvent::Submit).is_err());
    }
}
