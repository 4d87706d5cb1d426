//! Connection controller: owns the connection state and the poll handle.
//!
//! The controller is the only writer of the [`ConnectionMachine`] and the
//! only owner of the [`PollHandle`]. User actions and backend callbacks both
//! go through the same lock, so transitions are totally ordered. Background
//! tasks (session start, polling, holdings fetch) hold a weak reference and
//! stop mattering once the controller is dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::{debug, info, warn};

use super::classify::{MessageStatusClassifier, StatusClassifier};
use super::fetcher::{fetch_holdings, FetchOutcome, HoldingsHandler, NoOpHoldingsHandler};
use super::initiator::{initiate_session, InitiationOutcome};
use super::machine::{ConnectionMachine, Effect, MachineEvent};
use super::models::Credentials;
use super::observer::{ConnectionObserver, NoOpObserver};
use super::poller::{PollConfig, PollControl, PollEvent, PollHandle, StatusPoller};
use super::policy::{AcceptAnyCredentials, CredentialPolicy};
use super::state::{ConnectionSnapshot, ConnectionState};
use super::traits::SessionApi;
use crate::error::{ConnectError, Result};

/// Collaborators and settings of a [`ConnectionController`].
#[derive(Clone)]
pub struct ControllerOptions {
    pub poll: PollConfig,
    pub classifier: Arc<dyn StatusClassifier>,
    pub policy: Arc<dyn CredentialPolicy>,
    pub holdings_handler: Arc<dyn HoldingsHandler>,
    pub observer: Arc<dyn ConnectionObserver>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            classifier: Arc::new(MessageStatusClassifier),
            policy: Arc::new(AcceptAnyCredentials),
            holdings_handler: Arc::new(NoOpHoldingsHandler),
            observer: Arc::new(NoOpObserver),
        }
    }
}

impl ControllerOptions {
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn StatusClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn CredentialPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_holdings_handler(mut self, handler: Arc<dyn HoldingsHandler>) -> Self {
        self.holdings_handler = handler;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ConnectionObserver>) -> Self {
        self.observer = observer;
        self
    }
}

struct Inner {
    machine: ConnectionMachine,
    poll: Option<PollHandle>,
}

struct Shared {
    api: Arc<dyn SessionApi>,
    options: ControllerOptions,
    inner: Mutex<Inner>,
}

/// Drives one brokerage connection at a time.
///
/// `submit` spawns work on the tokio runtime and must be called from within
/// one.
///
/// # Example
///
/// ```ignore
/// let client = Arc::new(ConnectApiClient::new(&base_url, timeout)?);
/// let controller = ConnectionController::new(client, ControllerOptions::default());
/// controller.start()?;
/// controller.submit(Credentials::new("jane@example.com", "secret"))?;
/// ```
pub struct ConnectionController {
    shared: Arc<Shared>,
}

impl ConnectionController {
    pub fn new(api: Arc<dyn SessionApi>, options: ControllerOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                api,
                options,
                inner: Mutex::new(Inner {
                    machine: ConnectionMachine::new(),
                    poll: None,
                }),
            }),
        }
    }

    /// Open the credential form. Allowed from `idle` and `error`.
    pub fn start(&self) -> Result<()> {
        self.shared.dispatch(MachineEvent::Start)
    }

    /// Close the credential form, discarding anything entered.
    pub fn cancel(&self) -> Result<()> {
        self.shared.dispatch(MachineEvent::Cancel)
    }

    /// Store credentials typed into the form without submitting them.
    pub fn enter_credentials(&self, credentials: Credentials) -> Result<()> {
        self.shared.dispatch(MachineEvent::EnterCredentials(credentials))
    }

    /// Submit `credentials` and start a session in the background.
    ///
    /// Returns as soon as the controller is `connecting`. Rejected with
    /// [`ConnectError::InvalidTransition`] outside `input`, and with
    /// [`ConnectError::InvalidCredentials`] when the policy refuses them.
    pub fn submit(&self, credentials: Credentials) -> Result<()> {
        self.shared.submit(Some(credentials))
    }

    /// Submit whatever was last passed to [`enter_credentials`](Self::enter_credentials).
    pub fn submit_entered(&self) -> Result<()> {
        self.shared.submit(None)
    }

    pub fn snapshot(&self) -> ConnectionSnapshot {
        self.shared.lock().machine.snapshot()
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.lock().machine.state()
    }

    /// Whether a poll loop is currently running.
    pub fn is_polling(&self) -> bool {
        self.shared
            .lock()
            .poll
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(self: &Arc<Self>, event: MachineEvent) -> Result<()> {
        let mut inner = self.lock();
        self.apply(&mut inner, event)
    }

    fn submit(self: &Arc<Self>, credentials: Option<Credentials>) -> Result<()> {
        let mut inner = self.lock();
        let state = inner.machine.state();
        if state != ConnectionState::Input {
            return Err(ConnectError::InvalidTransition {
                action: "submit",
                state,
            });
        }
        if let Some(credentials) = credentials {
            self.apply(&mut inner, MachineEvent::EnterCredentials(credentials))?;
        }
        self.options.policy.validate(inner.machine.draft())?;
        self.apply(&mut inner, MachineEvent::Submit)
    }

    fn apply(self: &Arc<Self>, inner: &mut Inner, event: MachineEvent) -> Result<()> {
        let outcome = inner.machine.handle(event)?;
        for effect in outcome.effects {
            self.execute(inner, effect);
        }
        if outcome.changed {
            let snapshot = inner.machine.snapshot();
            debug!(
                "[Connection] {} - {}",
                snapshot.state,
                if snapshot.message.is_empty() {
                    "(no message)"
                } else {
                    snapshot.message.as_str()
                }
            );
            self.options.observer.on_change(&snapshot);
        }
        Ok(())
    }

    fn execute(self: &Arc<Self>, inner: &mut Inner, effect: Effect) {
        match effect {
            Effect::BeginSession {
                attempt,
                credentials,
            } => {
                let weak = Arc::downgrade(self);
                let api = self.api.clone();
                tokio::spawn(async move {
                    let outcome = initiate_session(api.as_ref(), &credentials).await;
                    drop(credentials);
                    let event = match outcome {
                        InitiationOutcome::Started => MachineEvent::SessionStarted { attempt },
                        InitiationOutcome::Failed { message } => {
                            MachineEvent::SessionFailed { attempt, message }
                        }
                    };
                    Self::deliver(&weak, event);
                });
            }
            Effect::StartPolling { attempt } => {
                if let Some(previous) = inner.poll.take() {
                    warn!("[Connection] Replacing a live poll handle");
                    previous.cancel();
                }
                let poller = StatusPoller::new(
                    self.api.clone(),
                    self.options.classifier.clone(),
                    self.options.poll.clone(),
                );
                let weak = Arc::downgrade(self);
                let handle =
                    poller.spawn(move |event| Self::on_poll_event(&weak, attempt, event));
                inner.poll = Some(handle);
            }
            Effect::StopPolling => {
                if let Some(handle) = inner.poll.take() {
                    debug!("[Connection] Stopping status polling");
                    handle.cancel();
                }
            }
            Effect::FetchHoldings { attempt } => {
                let weak = Arc::downgrade(self);
                let api = self.api.clone();
                let handler = self.options.holdings_handler.clone();
                tokio::spawn(async move {
                    let event = match fetch_holdings(api.as_ref()).await {
                        FetchOutcome::Synced(holdings) => {
                            handler.on_holdings(&holdings);
                            MachineEvent::HoldingsSynced { attempt }
                        }
                        FetchOutcome::Failed { .. } => MachineEvent::HoldingsFailed { attempt },
                    };
                    Self::deliver(&weak, event);
                });
            }
        }
    }

    fn on_poll_event(weak: &Weak<Self>, attempt: u64, event: PollEvent) -> PollControl {
        let Some(shared) = weak.upgrade() else {
            return PollControl::Stop;
        };
        let event = match event {
            PollEvent::Status(classification) => MachineEvent::Status {
                attempt,
                classification,
            },
            PollEvent::Exhausted => MachineEvent::PollExhausted { attempt },
        };

        let mut inner = shared.lock();
        if let Err(e) = shared.apply(&mut inner, event) {
            warn!("[Connection] Poll update rejected: {}", e);
        }
        if inner.machine.is_polling() && inner.machine.attempt() == attempt {
            PollControl::Continue
        } else {
            PollControl::Stop
        }
    }

    fn deliver(weak: &Weak<Self>, event: MachineEvent) {
        match weak.upgrade() {
            Some(shared) => {
                if let Err(e) = shared.dispatch(event) {
                    warn!("[Connection] Background update rejected: {}", e);
                }
            }
            None => info!("[Connection] Controller dropped, discarding {:?}", event),
        }
    }
}
