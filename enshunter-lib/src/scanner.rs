//! Scan orchestration.
//!
//! [`Scanner`] wires the pipeline together for one run:
//! identifiers → job queue → worker pool (retry client, deadline governor)
//! → result stream → aggregator → output sink and counters.

use crate::aggregator::{Aggregator, OutputSink};
use crate::deadline::DeadlineGovernor;
use crate::error::HuntError;
use crate::protocols::Oracle;
use crate::queue::JobQueue;
use crate::retry::{BackoffPolicy, RetryClient, Sleeper, TokioSleeper};
use crate::sinks::{MessageSink, NoopProgress, ProgressSink, SilentMessages};
use crate::types::{Identifier, ScanConfig, ScanSummary};
use crate::worker::WorkerPool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Runs availability scans against one oracle.
///
/// # Example
///
/// ```rust,no_run
/// use enshunter_lib::{load_identifiers_from_file, OutputSink, RegistrarClient, ScanConfig, Scanner};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let oracle = RegistrarClient::connect(
///         RegistrarClient::infura_endpoint("my-project-id"),
///         Duration::from_secs(30),
///     )
///     .await?;
///     let identifiers = load_identifiers_from_file("names.txt", ".eth")?;
///     let output = Arc::new(OutputSink::create("available.txt")?);
///
///     let scanner = Scanner::new(ScanConfig::default(), Arc::new(oracle));
///     let summary = scanner.scan(identifiers, output).await?;
///     println!("{} of {} available", summary.available, summary.checked);
///     Ok(())
/// }
/// ```
pub struct Scanner {
    config: ScanConfig,
    oracle: Arc<dyn Oracle>,
    sleeper: Arc<dyn Sleeper>,
    progress: Arc<dyn ProgressSink>,
    messages: Arc<dyn MessageSink>,
}

impl Scanner {
    pub fn new(config: ScanConfig, oracle: Arc<dyn Oracle>) -> Self {
        Self {
            config,
            oracle,
            sleeper: Arc::new(TokioSleeper),
            progress: Arc::new(NoopProgress),
            messages: Arc::new(SilentMessages),
        }
    }

    /// Replace the delay mechanism used for retries and pacing.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_messages(mut self, messages: Arc<dyn MessageSink>) -> Self {
        self.messages = messages;
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// A fresh governor for this scanner's deadline, started now.
    pub fn governor(&self) -> DeadlineGovernor {
        DeadlineGovernor::new(self.config.deadline)
    }

    /// Scan `identifiers`, writing available ones to `output`.
    ///
    /// # Errors
    ///
    /// Only `HuntError::NoInput` for an empty list. Per-identifier failures
    /// are counted in the summary.
    pub async fn scan(
        &self,
        identifiers: Vec<Identifier>,
        output: Arc<OutputSink>,
    ) -> Result<ScanSummary, HuntError> {
        self.scan_with(identifiers, output, self.governor()).await
    }

    /// Like [`Scanner::scan`] with a caller-held governor, so the caller can
    /// cancel the run.
    pub async fn scan_with(
        &self,
        identifiers: Vec<Identifier>,
        output: Arc<OutputSink>,
        governor: DeadlineGovernor,
    ) -> Result<ScanSummary, HuntError> {
        if identifiers.is_empty() {
            return Err(HuntError::no_input("scan request"));
        }

        let started = Instant::now();
        let total = identifiers.len();
        tracing::info!(
            total,
            workers = self.config.workers,
            rate_limit_ms = self.config.rate_limit.as_millis() as u64,
            max_retries = self.config.max_retries,
            deadline_secs = self.config.deadline.as_secs_f64(),
            "starting scan"
        );

        self.progress.start(total as u64);

        let queue = Arc::new(JobQueue::filled(identifiers));
        let (results_tx, results_rx) = mpsc::channel(total);

        let client = RetryClient::new(self.oracle.clone(), BackoffPolicy::from_config(&self.config))
            .with_sleeper(self.sleeper.clone())
            .with_messages(self.messages.clone());

        let pool = WorkerPool::spawn(
            self.config.workers,
            queue,
            client,
            governor.clone(),
            results_tx,
        );
        let barrier = tokio::spawn(pool.join());

        let aggregator = Aggregator::new(output, self.progress.clone(), self.messages.clone());
        let consumed = aggregator.run(results_rx).await;

        match barrier.await {
            Ok(sent) if sent as u64 != consumed => {
                tracing::error!(sent, consumed, "result count mismatch");
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "worker pool supervisor failed"),
        }

        self.progress.finish();

        let counters = aggregator.counters();
        let summary = ScanSummary {
            total: total as u64,
            checked: counters.checked(),
            available: counters.available(),
            unavailable: counters.unavailable(),
            errored: counters.errored(),
            elapsed: started.elapsed(),
            deadline_expired: governor.is_expired(),
        };

        tracing::info!(
            checked = summary.checked,
            available = summary.available,
            errored = summary.errored,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            deadline_expired = summary.deadline_expired,
            "scan finished"
        );

        Ok(summary)
    }
}
