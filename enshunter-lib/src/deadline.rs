//! Run-wide deadline shared by every oracle call.
//!
//! One governor is created per scan. All calls go through [`DeadlineGovernor::guard`],
//! which races the call against the deadline and the cancellation token.
//! When the deadline passes every in-flight call returns at once and every
//! later call fails immediately.

use crate::error::HuntError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Stand-in deadline for budgets too large to represent as an instant.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Clone)]
pub struct DeadlineGovernor {
    started: Instant,
    deadline: Instant,
    token: CancellationToken,
}

impl DeadlineGovernor {
    /// Start the clock: the deadline is `budget` from now, capped at
    /// roughly thirty years.
    pub fn new(budget: Duration) -> Self {
        let started = Instant::now();
        let deadline = started
            .checked_add(budget.min(FAR_FUTURE))
            .unwrap_or(started);
        Self {
            started,
            deadline,
            token: CancellationToken::new(),
        }
    }

    /// Time left before expiry (zero once expired).
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline passed or the run was cancelled.
    pub fn is_expired(&self) -> bool {
        self.token.is_cancelled() || Instant::now() >= self.deadline
    }

    /// Cancel every outstanding and future call.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            tracing::info!("scan cancelled");
            self.token.cancel();
        }
    }

    /// Token observers can wait on; cancelled at expiry.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Run `call` bounded by the deadline.
    ///
    /// Fails fast with `HuntError::Deadline` once expired.
    pub async fn guard<T, F>(&self, call: F) -> Result<T, HuntError>
    where
        F: Future<Output = Result<T, HuntError>>,
    {
        if self.is_expired() {
            self.token.cancel();
            return Err(self.expired_error());
        }

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(self.expired_error()),
            _ = tokio::time::sleep_until(self.deadline) => {
                tracing::debug!("scan deadline reached");
                self.token.cancel();
                Err(self.expired_error())
            }
            result = call => result,
        }
    }

    fn expired_error(&self) -> HuntError {
        HuntError::deadline(self.deadline.saturating_duration_since(self.started))
    }
}
