//! # ENSHunter Library
//!
//! Bulk availability checks for ENS names against the registrar controller,
//! under a per-worker rate limit, bounded retries and one global deadline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use enshunter_lib::{load_identifiers_from_file, OutputSink, RegistrarClient, ScanConfig, Scanner};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let endpoint = RegistrarClient::infura_endpoint("my-project-id");
//!     let oracle = RegistrarClient::connect(endpoint, Duration::from_secs(30)).await?;
//!
//!     let config = ScanConfig::default()
//!         .with_workers(10)
//!         .with_rate_limit(Duration::from_millis(200));
//!
//!     let names = load_identifiers_from_file("names.txt", ".eth")?;
//!     let output = Arc::new(OutputSink::create("available.txt")?);
//!     let summary = Scanner::new(config, Arc::new(oracle)).scan(names, output).await?;
//!
//!     println!("checked {} / available {}", summary.checked, summary.available);
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! - **Loader**: trims, skips blanks, appends the `.eth` suffix
//! - **Job queue**: bounded, filled up front, drained by the workers
//! - **Retry client**: up to `max_retries + 1` attempts, flat `2 × rate_limit` backoff, pacing after each job
//! - **Worker pool**: fixed number of tokio tasks behind a join barrier
//! - **Deadline governor**: one cancellation context shared by every call
//! - **Aggregator**: atomic counters, flushed, de-duplicated output lines

pub use aggregator::{Aggregator, Counters, OutputSink};
pub use config::{
    load_env_config, load_env_config_from, validate_timeout, validate_workers, ConfigManager,
    DefaultsConfig, EnvConfig, FileConfig, CONFIG_DIR,
};
pub use deadline::DeadlineGovernor;
pub use error::HuntError;
pub use loader::{load_identifiers, load_identifiers_from_file, normalize_identifier};
pub use protocols::{Oracle, RegistrarClient, REGISTRAR_CONTROLLER};
pub use queue::JobQueue;
pub use retry::{BackoffPolicy, RetryClient, Sleeper, TokioSleeper};
pub use scanner::Scanner;
pub use sinks::{MessageSink, NoopProgress, ProgressSink, SilentMessages};
pub use types::{CheckResult, Identifier, Outcome, ScanConfig, ScanSummary, DEFAULT_SUFFIX};
pub use worker::WorkerPool;

mod aggregator;
mod config;
mod deadline;
mod error;
mod loader;
mod protocols;
mod queue;
mod retry;
mod scanner;
mod sinks;
mod types;
mod worker;

pub type Result<T> = std::result::Result<T, HuntError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
