//! Login status polling.
//!
//! Ticks are driven by the clock: the n-th query is scheduled `n * interval`
//! after polling began. Only one query is ever in flight; a tick that comes
//! due while a slow query is outstanding is skipped rather than stacked.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::classify::{LoginClassification, StatusClassifier};
use super::traits::SessionApi;

/// Default delay between two status queries.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Shortest delay allowed between two status queries.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for status polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two status queries.
    pub interval: Duration,
    /// Stop after this many queries without a login.
    pub max_ticks: Option<u32>,
    /// Stop once this much time has passed without a login.
    pub max_wait: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_ticks: None,
            max_wait: None,
        }
    }
}

impl PollConfig {
    /// Set the delay between queries, raised to [`MIN_POLL_INTERVAL`] if shorter.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: u32) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Interval actually used by the poll loop.
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_POLL_INTERVAL)
    }

    fn budget_spent(&self, ticks: u32, elapsed: Duration) -> bool {
        self.max_ticks.is_some_and(|max| ticks >= max)
            || self.max_wait.is_some_and(|max| elapsed >= max)
    }
}

/// Something the poll loop reports to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    Status(LoginClassification),
    /// The configured tick or time budget ran out
    Exhausted,
}

/// Whether the poll loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollControl {
    Continue,
    Stop,
}

/// Handle to a running poll loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stop the loop. Safe to call from inside the loop itself.
    pub fn cancel(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Queries login status on a fixed cadence.
pub struct StatusPoller {
    api: Arc<dyn SessionApi>,
    classifier: Arc<dyn StatusClassifier>,
    config: PollConfig,
}

impl StatusPoller {
    pub fn new(
        api: Arc<dyn SessionApi>,
        classifier: Arc<dyn StatusClassifier>,
        config: PollConfig,
    ) -> Self {
        Self {
            api,
            classifier,
            config,
        }
    }

    /// Run the loop on the tokio runtime.
    pub fn spawn<F>(self, sink: F) -> PollHandle
    where
        F: FnMut(PollEvent) -> PollControl + Send + 'static,
    {
        PollHandle {
            task: tokio::spawn(self.run(sink)),
        }
    }

    /// Poll until `sink` asks to stop or the budget runs out.
    ///
    /// A failed query is logged and the tick skipped; it never ends the loop.
    pub async fn run<F>(self, mut sink: F)
    where
        F: FnMut(PollEvent) -> PollControl + Send,
    {
        let period = self.config.effective_interval();
        let started = Instant::now();

        if self.config.budget_spent(0, Duration::ZERO) {
            warn!("[Poller] Poll budget is empty, giving up before the first query");
            sink(PollEvent::Exhausted);
            return;
        }

        let mut ticker = interval_at(started + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks: u32 = 0;

        info!("[Poller] Polling login status every {:?}", period);

        loop {
            ticker.tick().await;
            ticks += 1;

            match self.api.login_status().await {
                Ok(status) => {
                    let classification = self.classifier.classify(&status);
                    debug!("[Poller] Tick {}: {:?}", ticks, classification);
                    if sink(PollEvent::Status(classification)) == PollControl::Stop {
                        debug!("[Poller] Stopped after {} ticks", ticks);
                        return;
                    }
                }
                Err(e) => warn!("[Poller] Tick {} skipped, status query failed: {}", ticks, e),
            }

            if self.config.budget_spent(ticks, started.elapsed()) {
                warn!(
                    "[Poller] Giving up after {} ticks ({:?})",
                    ticks,
                    started.elapsed()
                );
                sink(PollEvent::Exhausted);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_config_default() {
        let config = PollConfig::default();
        assert_eq!(config.interval, Duration::from_millis(2000));
        assert!(config.max_ticks.is_none());
        assert!(config.max_wait.is_none());
        assert!(!config.budget_spent(u32::MAX, Duration::from_secs(86_400)));
    }

    #[test]
    fn test_budget() {
        let config = PollConfig::default()
            .with_max_ticks(3)
            .with_max_wait(Duration::from_secs(60));
        assert!(!config.budget_spent(2, Duration::from_secs(4)));
        assert!(config.budget_spent(3, Duration::from_secs(6)));
        assert!(config.budget_spent(1, Duration::from_secs(60)));
    }

    #[test]
    fn test_zero_interval_is_raised() {
        let config = PollConfig::default().with_interval(Duration::ZERO);
        assert_eq!(config.interval, MIN_POLL_INTERVAL);

        let config = PollConfig {
            interval: Duration::ZERO,
            ..PollConfig::default()
        };
        assert_eq!(config.effective_interval(), MIN_POLL_INTERVAL);
        assert_eq!(
            PollConfig::default().effective_interval(),
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        );
    }

    #[test]
    fn test_empty_budget_is_spent_before_first_tick() {
        assert!(PollConfig::default()
            .with_max_ticks(0)
            .budget_spent(0, Duration::ZERO));
        assert!(!PollConfig::default()
            .with_max_ticks(1)
            .budget_spent(0, Duration::ZERO));
    }
}
