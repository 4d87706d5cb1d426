//! KnowAndGuide Connect - backend client and brokerage connection flow.
//!
//! This crate talks to the KnowAndGuide backend: it requests portfolio
//! recommendations and drives the brokerage login flow (session start,
//! login-status polling, holdings retrieval) through an explicit state
//! machine.

pub mod client;
pub mod error;
pub mod session;

// Re-export commonly used types
pub use client::{ConnectApiClient, DEFAULT_TIMEOUT_SECS};
pub use error::{ConnectError, Result};
pub use session::{
    ChannelObserver, ConnectionController, ConnectionObserver, ConnectionSnapshot,
    ConnectionState, ControllerOptions, Credentials, HoldingsHandler, HoldingsSnapshot,
    HoldingsSyncStatus, PollConfig, RequireNonEmptyCredentials, SessionApi,
};
