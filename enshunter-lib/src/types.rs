//! Core data types for availability scans.
//!
//! This module defines the identifiers flowing through the pipeline, the
//! per-identifier results, the immutable scan configuration and the final
//! summary.

use crate::error::HuntError;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Suffix every identifier is qualified with before it is checked.
pub const DEFAULT_SUFFIX: &str = ".eth";

/// A normalized candidate name.
///
/// Always trimmed, non-empty and suffix-qualified (e.g. `alice.eth`).
/// The oracle is queried with the bare label (`alice`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier {
    name: String,
    #[serde(skip)]
    label_len: usize,
}

impl Identifier {
    /// Build an identifier from an already-trimmed, non-empty candidate.
    pub(crate) fn qualified(trimmed: &str, suffix: &str) -> Self {
        if !suffix.is_empty() && trimmed.ends_with(suffix) {
            Self {
                name: trimmed.to_string(),
                label_len: trimmed.len() - suffix.len(),
            }
        } else {
            Self {
                name: format!("{}{}", trimmed, suffix),
                label_len: trimmed.len(),
            }
        }
    }

    /// The full, suffix-qualified name.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The name without its suffix, as sent to the oracle.
    pub fn label(&self) -> &str {
        &self.name[..self.label_len]
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Final outcome of checking one identifier.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The oracle confirmed the name can be registered
    Available,

    /// The oracle reported the name as taken
    Unavailable,

    /// Every attempt failed; holds the last observed error
    Failed(HuntError),
}

impl Outcome {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Result of checking one identifier.
///
/// Produced exactly once per job, by exactly one worker.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub identifier: Identifier,
    pub outcome: Outcome,
    /// Number of oracle calls issued for this identifier
    pub attempts: u32,
}

/// Configuration for one scan.
///
/// Built once before the pipeline starts and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Number of concurrent workers
    /// Default: 5, Range: 1-100
    pub workers: usize,

    /// Pacing interval between calls issued by one worker
    /// Default: 100ms
    pub rate_limit: Duration,

    /// Retries after the first failed attempt
    /// Default: 3
    pub max_retries: u32,

    /// Global deadline bounding every oracle call of the run
    /// Default: 30 seconds
    pub deadline: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            rate_limit: Duration::from_millis(100),
            max_retries: 3,
            deadline: Duration::from_secs(30),
        }
    }
}

impl ScanConfig {
    /// Set the worker count, clamped to 1-100.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.clamp(1, 100);
        self
    }

    /// Set the per-worker pacing interval.
    pub fn with_rate_limit(mut self, rate_limit: Duration) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Set the number of retries after a failed attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the global scan deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}

/// Totals reported at the end of a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    /// Identifiers submitted to the job queue
    pub total: u64,
    pub checked: u64,
    pub available: u64,
    pub unavailable: u64,
    pub errored: u64,
    /// Wall-clock duration of the scan
    pub elapsed: Duration,
    /// Whether the deadline expired (or the scan was cancelled) before completion
    pub deadline_expired: bool,
}

impl ScanSummary {
    /// `checked == available + unavailable + errored`
    pub fn is_consistent(&self) -> bool {
        self.checked == self.available + self.unavailable + self.errored
    }
}
