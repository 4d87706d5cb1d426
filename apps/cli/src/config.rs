use std::str::FromStr;
use std::time::Duration;

use knowguide_connect::session::{PollConfig, DEFAULT_POLL_INTERVAL_MS};
use knowguide_connect::DEFAULT_TIMEOUT_SECS;
use knowguide_core::api_base::{is_production_build, resolve_api_base_url};

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = DEFAULT_TIMEOUT_SECS * 1000;

pub struct Config {
    pub api_url: String,
    pub request_timeout: Duration,
    pub poll: PollConfig,
}

impl Config {
    /// Read settings from the process environment. `.env` must already be loaded.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply a `--api-url` flag. A blank value keeps the configured URL.
    pub fn with_api_url_override(mut self, url: Option<&str>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.api_url = resolve_api_base_url(Some(url), is_production_build());
        }
        self
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = resolve_api_base_url(lookup("KG_API_URL").as_deref(), is_production_build());
        let timeout_ms =
            parse_nonzero_or(&lookup, "KG_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS);
        let interval_ms = parse_nonzero_or(&lookup, "KG_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS);

        let mut poll = PollConfig::default().with_interval(Duration::from_millis(interval_ms));
        if let Some(max_ticks) = parse_opt::<u32>(&lookup, "KG_POLL_MAX_TICKS") {
            poll = poll.with_max_ticks(max_ticks);
        }
        if let Some(secs) = parse_opt::<u64>(&lookup, "KG_POLL_MAX_WAIT_SECS") {
            poll = poll.with_max_wait(Duration::from_secs(secs));
        }

        Self {
            api_url,
            request_timeout: Duration::from_millis(timeout_ms),
            poll,
        }
    }
}

fn parse_opt<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

fn parse_nonzero_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    match parse_opt::<u64>(lookup, key) {
        Some(0) => {
            tracing::warn!("Ignoring {}=0, using {}", key, default);
            default
        }
        Some(value) => value,
        None => default,
    }
}
