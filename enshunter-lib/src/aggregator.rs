//! Result aggregation and durable output.
//!
//! A single aggregator drains the result stream. It bumps the shared
//! counters, appends available identifiers to the output sink and ticks
//! the progress sink once per result.

use crate::error::HuntError;
use crate::sinks::{MessageSink, ProgressSink};
use crate::types::{CheckResult, Identifier, Outcome};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Scan counters, updated with atomic increments.
///
/// Reads while a scan is running are best-effort.
#[derive(Debug, Default)]
pub struct Counters {
    checked: AtomicU64,
    available: AtomicU64,
    unavailable: AtomicU64,
    errored: AtomicU64,
}

impl Counters {
    pub fn checked(&self) -> u64 {
        self.checked.load(Ordering::Acquire)
    }

    pub fn available(&self) -> u64 {
        self.available.load(Ordering::Acquire)
    }

    pub fn unavailable(&self) -> u64 {
        self.unavailable.load(Ordering::Acquire)
    }

    pub fn errored(&self) -> u64 {
        self.errored.load(Ordering::Acquire)
    }

    fn record(&self, outcome: &Outcome) {
        let bucket = match outcome {
            Outcome::Available => &self.available,
            Outcome::Unavailable => &self.unavailable,
            Outcome::Failed(_) => &self.errored,
        };
        bucket.fetch_add(1, Ordering::AcqRel);
        self.checked.fetch_add(1, Ordering::AcqRel);
    }
}

struct OutputState {
    writer: Box<dyn Write + Send>,
    written: HashSet<String>,
}

/// Append-only sink for available identifiers.
///
/// One line per identifier, never repeated. Every append is written and
/// flushed while holding the lock.
pub struct OutputSink {
    path: Option<PathBuf>,
    state: Mutex<OutputState>,
}

impl OutputSink {
    /// Create (or truncate) the output file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, HuntError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            HuntError::file_error(
                path.to_string_lossy(),
                format!("Failed to create output file: {}", e),
            )
        })?;

        let mut sink = Self::from_writer(BufWriter::new(file));
        sink.path = Some(path.to_path_buf());
        Ok(sink)
    }

    /// Wrap an arbitrary writer.
    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            path: None,
            state: Mutex::new(OutputState {
                writer: Box::new(writer),
                written: HashSet::new(),
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append `identifier` as one line.
    ///
    /// Returns `Ok(false)` if it was already written.
    pub fn append(&self, identifier: &Identifier) -> Result<bool, HuntError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| HuntError::internal("output lock poisoned"))?;

        if state.written.contains(identifier.as_str()) {
            return Ok(false);
        }

        let line = format!("{}\n", identifier);
        state.writer.write_all(line.as_bytes()).map_err(|e| self.write_error(e))?;
        state.writer.flush().map_err(|e| self.write_error(e))?;
        state.written.insert(identifier.as_str().to_string());
        Ok(true)
    }

    /// Number of distinct lines written so far.
    pub fn written(&self) -> usize {
        self.state.lock().map(|s| s.written.len()).unwrap_or(0)
    }

    fn write_error(&self, err: std::io::Error) -> HuntError {
        let path = self
            .path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| "<output>".to_string());
        HuntError::file_error(path, format!("Failed to write output: {}", err))
    }
}

impl std::fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSink")
            .field("path", &self.path)
            .field("written", &self.written())
            .finish()
    }
}

/// Single consumer of the result stream.
pub struct Aggregator {
    counters: Arc<Counters>,
    output: Arc<OutputSink>,
    progress: Arc<dyn ProgressSink>,
    messages: Arc<dyn MessageSink>,
}

impl Aggregator {
    pub fn new(
        output: Arc<OutputSink>,
        progress: Arc<dyn ProgressSink>,
        messages: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            output,
            progress,
            messages,
        }
    }

    pub fn counters(&self) -> Arc<Counters> {
        self.counters.clone()
    }

    /// Account for one result.
    pub fn consume(&self, result: CheckResult) {
        self.counters.record(&result.outcome);

        match &result.outcome {
            Outcome::Failed(error) => {
                self.messages.failed(&result.identifier, error);
            }
            Outcome::Available => {
                self.messages.available(&result.identifier);
                if let Err(error) = self.output.append(&result.identifier) {
                    tracing::warn!(identifier = %result.identifier, error = %error, "failed to record available identifier");
                    self.messages.write_failed(&result.identifier, &error);
                }
            }
            Outcome::Unavailable => {
                self.messages.unavailable(&result.identifier);
            }
        }

        if let Err(error) = self.progress.tick() {
            tracing::warn!(error = %error, "progress update failed");
        }
    }

    /// Drain `results` until every sender is gone. Returns the number consumed.
    pub async fn run(&self, mut results: mpsc::Receiver<CheckResult>) -> u64 {
        let mut consumed = 0;
        while let Some(result) = results.recv().await {
            self.consume(result);
            consumed += 1;
        }
        consumed
    }
}
