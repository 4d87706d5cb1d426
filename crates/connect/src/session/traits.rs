//! Traits defining the contract with the login backend.

use async_trait::async_trait;

use super::models::{Credentials, HoldingsPayload, LoginStatus, SessionStartReply};
use crate::error::Result;

/// Backend operations used by the connection flow.
///
/// An `Err` from any method means the call did not yield a usable response.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Start a remote login session with the given credentials
    async fn start_session(&self, credentials: &Credentials) -> Result<SessionStartReply>;

    /// Query whether the remote login has completed
    async fn login_status(&self) -> Result<LoginStatus>;

    /// Retrieve holdings once logged in
    async fn holdings(&self) -> Result<HoldingsPayload>;
}
