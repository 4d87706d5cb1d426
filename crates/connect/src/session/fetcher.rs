//! Holdings retrieval after a successful login.

use chrono::Utc;
use log::{info, warn};

use super::models::HoldingsSnapshot;
use super::traits::SessionApi;

/// Receives holdings fetched after login.
///
/// This is where raw holdings text would be turned into tickers and
/// quantities. The controller calls it once per successful fetch, never while
/// holding its own lock.
pub trait HoldingsHandler: Send + Sync {
    fn on_holdings(&self, holdings: &HoldingsSnapshot);
}

#[derive(Debug, Clone, Default)]
pub struct NoOpHoldingsHandler;

impl HoldingsHandler for NoOpHoldingsHandler {
    fn on_holdings(&self, _holdings: &HoldingsSnapshot) {
        // No-op
    }
}

/// How the holdings fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Synced(HoldingsSnapshot),
    Failed { reason: String },
}

/// Fetch holdings once. A payload without `raw_text` counts as a failure.
pub async fn fetch_holdings(api: &dyn SessionApi) -> FetchOutcome {
    match api.holdings().await {
        Ok(payload) => match payload.raw_text {
            Some(raw_text) => {
                info!("[Session] Holdings fetched ({} bytes)", raw_text.len());
                FetchOutcome::Synced(HoldingsSnapshot {
                    raw_text,
                    message: payload.message,
                    fetched_at: Utc::now(),
                })
            }
            None => {
                let reason = payload
                    .error
                    .unwrap_or_else(|| "holdings response had no raw_text".to_string());
                warn!("[Session] Holdings unavailable: {}", reason);
                FetchOutcome::Failed { reason }
            }
        },
        Err(e) => {
            warn!("[Session] Holdings request failed: {}", e);
            FetchOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
