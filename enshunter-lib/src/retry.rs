//! Rate-limited retry client.
//!
//! Wraps one oracle call per identifier with bounded retries and a pacing
//! delay. Every attempt goes through the run's [`DeadlineGovernor`].
//! Delays are taken from a [`BackoffPolicy`] and executed by an injected
//! [`Sleeper`] so tests can run without wall-clock waits.

use crate::deadline::DeadlineGovernor;
use crate::error::HuntError;
use crate::protocols::Oracle;
use crate::sinks::{MessageSink, SilentMessages};
use crate::types::{CheckResult, Identifier, Outcome, ScanConfig};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Delays applied around oracle attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub rate_limit: Duration,
    pub max_retries: u32,
}

impl BackoffPolicy {
    pub fn new(rate_limit: Duration, max_retries: u32) -> Self {
        Self {
            rate_limit,
            max_retries,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.rate_limit, config.max_retries)
    }

    /// Total attempts allowed for one identifier.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after failed attempt `attempt` (0-based) before the next one.
    ///
    /// A flat `2 × rate_limit` for every attempt; it does not grow.
    pub fn retry_delay(&self, _attempt: u32) -> Duration {
        self.rate_limit.saturating_mul(2)
    }

    /// Delay after a result is produced, before the worker pulls again.
    pub fn pacing_delay(&self) -> Duration {
        self.rate_limit
    }
}

/// Delay mechanism used by the retry client.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Oracle wrapper applying retries and pacing.
#[derive(Clone)]
pub struct RetryClient {
    oracle: Arc<dyn Oracle>,
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
    messages: Arc<dyn MessageSink>,
}

impl RetryClient {
    pub fn new(oracle: Arc<dyn Oracle>, policy: BackoffPolicy) -> Self {
        Self {
            oracle,
            policy,
            sleeper: Arc::new(TokioSleeper),
            messages: Arc::new(SilentMessages),
        }
    }

    /// Replace the delay mechanism.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Report retries to `messages`.
    pub fn with_messages(mut self, messages: Arc<dyn MessageSink>) -> Self {
        self.messages = messages;
        self
    }

    /// Check one identifier.
    ///
    /// Attempt 0 is issued immediately. Every failure, the final one
    /// included, is followed by `retry_delay`. The loop stops at the first
    /// success or after `max_retries` retries, keeping the last error. Once the deadline has passed the remaining attempts still
    /// run and fail fast.
    pub async fn check(&self, identifier: Identifier, governor: &DeadlineGovernor) -> CheckResult {
        let total = self.policy.attempts();
        let mut attempts = 0;
        let mut answer = None;
        let mut last_error = None;

        for attempt in 0..total {
            if let Some(error) = &last_error {
                self.messages.retrying(&identifier, attempt, error);
            }
            attempts += 1;

            match governor.guard(self.oracle.available(identifier.label())).await {
                Ok(available) => {
                    answer = Some(available);
                    break;
                }
                Err(error) => {
                    tracing::debug!(
                        identifier = %identifier,
                        attempt,
                        error = %error,
                        "oracle call failed"
                    );
                    last_error = Some(error);
                    let delay = self.policy.retry_delay(attempt);
                    tracing::trace!(identifier = %identifier, delay_ms = delay.as_millis() as u64, "backing off");
                    self.sleeper.sleep(delay).await;
                }
            }
        }

        let outcome = match (answer, last_error) {
            (Some(true), _) => Outcome::Available,
            (Some(false), _) => Outcome::Unavailable,
            (None, Some(error)) => Outcome::Failed(error),
            (None, None) => Outcome::Failed(HuntError::internal("no attempt was made")),
        };

        if let Outcome::Failed(error) = &outcome {
            tracing::debug!(identifier = %identifier, attempts, error = %error, "giving up on identifier");
        }

        CheckResult {
            identifier,
            outcome,
            attempts,
        }
    }

    /// Per-worker pacing delay between consecutive jobs.
    pub async fn pace(&self) {
        self.sleeper.sleep(self.policy.pacing_delay()).await;
    }
}
