//! Credential checks applied before a session is started.

use super::models::Credentials;
use crate::error::{ConnectError, Result};

/// Decides whether credentials may be submitted.
pub trait CredentialPolicy: Send + Sync {
    fn validate(&self, credentials: &Credentials) -> Result<()>;
}

/// Lets everything through, including empty fields.
///
/// Callers are expected to validate their own input when using this policy.
#[derive(Debug, Clone, Default)]
pub struct AcceptAnyCredentials;

impl CredentialPolicy for AcceptAnyCredentials {
    fn validate(&self, _credentials: &Credentials) -> Result<()> {
        Ok(())
    }
}

/// Requires a non-blank username and a non-empty password.
#[derive(Debug, Clone, Default)]
pub struct RequireNonEmptyCredentials;

impl CredentialPolicy for RequireNonEmptyCredentials {
    fn validate(&self, credentials: &Credentials) -> Result<()> {
        if credentials.username.trim().is_empty() {
            return Err(ConnectError::invalid_credentials("username is required"));
        }
        if credentials.password.is_empty() {
            return Err(ConnectError::invalid_credentials("password is required"));
        }
        Ok(())
    }
}
