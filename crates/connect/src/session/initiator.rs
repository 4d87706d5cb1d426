//! Session start: one request, mapped to the next connection state.

use log::{info, warn};

use super::models::{Credentials, SessionStartReply};
use super::state::{BACKEND_OFFLINE_MESSAGE, SESSION_START_FAILED_MESSAGE};
use super::traits::SessionApi;
use crate::error::Result;

/// How a session start request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitiationOutcome {
    Started,
    Failed { message: String },
}

/// Issue the session start request.
pub async fn initiate_session(api: &dyn SessionApi, credentials: &Credentials) -> InitiationOutcome {
    info!("[Session] Starting remote login session");
    interpret_session_reply(api.start_session(credentials).await)
}

/// Map a session start result to an outcome.
///
/// Transport failures get the offline message; backend refusals surface the
/// backend's own text when it is non-empty.
pub fn interpret_session_reply(reply: Result<SessionStartReply>) -> InitiationOutcome {
    match reply {
        Ok(SessionStartReply::Started) => {
            info!("[Session] Remote session started");
            InitiationOutcome::Started
        }
        Ok(SessionStartReply::Rejected { error }) => {
            let message = error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| SESSION_START_FAILED_MESSAGE.to_string());
            warn!("[Session] Backend refused session: {}", message);
            InitiationOutcome::Failed { message }
        }
        Err(e) => {
            warn!("[Session] Session start request failed: {}", e);
            InitiationOutcome::Failed {
                message: BACKEND_OFFLINE_MESSAGE.to_string(),
            }
        }
    }
}
