//! Post-deployment readiness polling
//!
//! Replaces fixed sleeps with a bounded exponential backoff: probe, wait,
//! double the wait up to a ceiling, stop at the deadline. Running out of
//! time yields a warning value, never an error.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ReadinessConfig;
use crate::domain::Readiness;
use crate::error::ReadinessTimeout;
use crate::infrastructure::{ProbeOutcome, ReadinessProbe};

/// Deadline and interval bounds for one readiness poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_wait: Duration,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl BackoffPolicy {
    pub fn new(max_wait: Duration, initial_interval: Duration, max_interval: Duration) -> Self {
        Self {
            max_wait,
            initial_interval,
            max_interval: max_interval.max(initial_interval),
        }
    }

    fn next_interval(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max_interval)
    }
}

impl From<&ReadinessConfig> for BackoffPolicy {
    fn from(config: &ReadinessConfig) -> Self {
        Self::new(
            config.max_wait(),
            config.initial_interval(),
            config.max_interval(),
        )
    }
}

pub struct ReadinessChecker {
    probe: Arc<dyn ReadinessProbe>,
    policy: BackoffPolicy,
}

impl ReadinessChecker {
    pub fn new(probe: Arc<dyn ReadinessProbe>, policy: BackoffPolicy) -> Self {
        Self { probe, policy }
    }

    /// Poll `url` until it answers, the deadline passes, or `cancel` fires
    pub async fn wait_until_ready(&self, url: &str, cancel: &CancellationToken) -> Readiness {
        let start = Instant::now();
        let deadline = start + self.policy.max_wait;
        let mut interval = self.policy.initial_interval;
        let mut attempts = 0u32;
        let mut last_observation = String::from("no response");

        loop {
            attempts += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Readiness::Cancelled,
                outcome = self.probe.probe(url) => outcome,
                _ = tokio::time::sleep_until(deadline) => {
                    debug!(url = %url, attempt = attempts, "Readiness request still pending at the deadline");
                    break;
                }
            };

            match outcome {
                ProbeOutcome::Ready { status } => {
                    let elapsed = start.elapsed();
                    info!(
                        url = %url,
                        status,
                        attempts,
                        "Site is ready after {}",
                        humantime::format_duration(round_to_millis(elapsed))
                    );
                    return Readiness::Ready {
                        status,
                        attempts,
                        elapsed,
                    };
                }
                ProbeOutcome::NotReady { observation } => {
                    debug!(url = %url, attempt = attempts, "Not ready yet: {}", observation);
                    last_observation = observation;
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }

            let pause = interval.min(deadline - now);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Readiness::Cancelled,
                _ = tokio::time::sleep(pause) => {}
            }
            interval = self.policy.next_interval(interval);
        }

        let timeout = ReadinessTimeout {
            url: url.to_string(),
            waited: round_to_millis(start.elapsed()),
            attempts,
            last_observation,
        };
        warn!("{}", timeout);
        Readiness::TimedOut(timeout)
    }
}

fn round_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}
