//! Fixed-size worker pool.
//!
//! Each worker loops: pull a job, check it through the retry client, send
//! the result, pace. The pool keeps one extra result sender that is only
//! dropped after every worker has been joined, so the result stream closes
//! strictly after the last worker is done.

use crate::deadline::DeadlineGovernor;
use crate::error::HuntError;
use crate::queue::JobQueue;
use crate::retry::RetryClient;
use crate::types::{CheckResult, Outcome};
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct WorkerPool {
    handles: Vec<JoinHandle<usize>>,
    closer: Option<mpsc::Sender<CheckResult>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks draining `queue` into `results`.
    pub fn spawn(
        workers: usize,
        queue: Arc<JobQueue>,
        client: RetryClient,
        governor: DeadlineGovernor,
        results: mpsc::Sender<CheckResult>,
    ) -> Self {
        let workers = workers.max(1);
        let handles = (0..workers)
            .map(|id| {
                tokio::spawn(run_worker(
                    id,
                    queue.clone(),
                    client.clone(),
                    governor.clone(),
                    results.clone(),
                ))
            })
            .collect();

        Self {
            handles,
            closer: Some(results),
        }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker, then close the result stream.
    ///
    /// Returns the number of results the workers sent. A panic inside a
    /// check becomes a `Failed` result; a worker that dies anyway is logged
    /// and the jobs it had not pulled are drained by the others.
    pub async fn join(mut self) -> usize {
        let mut sent = 0;
        for (id, outcome) in join_all(self.handles.drain(..)).await.into_iter().enumerate() {
            match outcome {
                Ok(count) => sent += count,
                Err(e) => tracing::error!(worker = id, error = %e, "worker terminated abnormally"),
            }
        }
        self.closer.take();
        sent
    }
}

async fn run_worker(
    id: usize,
    queue: Arc<JobQueue>,
    client: RetryClient,
    governor: DeadlineGovernor,
    results: mpsc::Sender<CheckResult>,
) -> usize {
    let mut sent = 0;

    while let Some(identifier) = queue.next().await {
        tracing::trace!(worker = id, identifier = %identifier, "picked up job");
        let result = match AssertUnwindSafe(client.check(identifier.clone(), &governor))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => {
                let reason = panic_reason(payload.as_ref());
                tracing::error!(worker = id, identifier = %identifier, reason = %reason, "check panicked");
                CheckResult {
                    identifier,
                    outcome: Outcome::Failed(HuntError::internal(format!(
                        "check panicked: {}",
                        reason
                    ))),
                    attempts: 1,
                }
            }
        };

        if results.send(result).await.is_err() {
            tracing::warn!(worker = id, "result stream closed; stopping worker");
            break;
        }
        sent += 1;

        client.pace().await;
    }

    tracing::debug!(worker = id, sent, "worker finished");
    sent
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
