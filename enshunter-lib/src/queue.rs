//! Bounded job queue shared by the worker pool.
//!
//! The queue is sized to the number of identifiers so the single producer
//! never waits. It is filled and closed up front; workers then drain it
//! through a shared receiver until it reports empty-and-closed.

use crate::types::Identifier;
use tokio::sync::{mpsc, Mutex};

/// Single-producer, multi-consumer queue of pending identifiers.
#[derive(Debug)]
pub struct JobQueue {
    receiver: Mutex<mpsc::Receiver<Identifier>>,
    len: usize,
}

impl JobQueue {
    /// Enqueue every identifier and close the producer side.
    pub fn filled(identifiers: Vec<Identifier>) -> Self {
        let len = identifiers.len();
        let (sender, receiver) = mpsc::channel(len.max(1));

        for identifier in identifiers {
            // Capacity equals the job count, so this never hits a full buffer.
            if let Err(e) = sender.try_send(identifier) {
                tracing::error!(error = %e, "job queue rejected an identifier");
            }
        }
        drop(sender);

        Self {
            receiver: Mutex::new(receiver),
            len,
        }
    }

    /// Pull the next job.
    ///
    /// Returns `None` once the queue is empty and closed. Each job is
    /// handed to exactly one caller.
    pub async fn next(&self) -> Option<Identifier> {
        self.receiver.lock().await.recv().await
    }

    /// Number of jobs the queue was filled with.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::normalize_identifier;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn ids(count: usize) -> Vec<Identifier> {
        (0..count)
            .filter_map(|i| normalize_identifier(&format!("name{}", i), ".eth"))
            .collect()
    }

    #[tokio::test]
    async fn test_drains_in_order_then_closes() {
        let queue = JobQueue::filled(ids(3));
        assert_eq!(queue.len(), 3);

        assert_eq!(queue.next().await.unwrap().as_str(), "name0.eth");
        assert_eq!(queue.next().await.unwrap().as_str(), "name1.eth");
        assert_eq!(queue.next().await.unwrap().as_str(), "name2.eth");
        assert!(queue.next().await.is_none());
        assert!(queue.next().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_queue_is_closed() {
        let queue = JobQueue::filled(Vec::new());
        assert!(queue.is_empty());
        assert!(queue.next().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_each_job_delivered_once() {
        let queue = Arc::new(JobQueue::filled(ids(500)));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let queue = queue.clone();
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(id) = queue.next().await {
                    seen.push(id.to_string());
                    tokio::task::yield_now().await;
                }
                seen
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }

        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), 500);
        assert_eq!(unique.len(), 500);
    }
}
