//! Capabilities the pipeline reports through.
//!
//! The scanner never writes to the terminal itself. Front ends plug in a
//! [`ProgressSink`] for the per-result tick and a [`MessageSink`] for
//! per-identifier messages; tests use the no-op versions.

use crate::error::HuntError;
use crate::types::Identifier;

/// Receives one tick per consumed result.
pub trait ProgressSink: Send + Sync {
    /// Called once before the first tick.
    fn start(&self, _total: u64) {}

    /// Advance by one result.
    ///
    /// A returned error is logged by the aggregator and otherwise ignored.
    fn tick(&self) -> Result<(), HuntError>;

    /// Called once after the last tick.
    fn finish(&self) {}
}

/// Receives per-identifier events. Every method defaults to doing nothing.
pub trait MessageSink: Send + Sync {
    fn retrying(&self, _identifier: &Identifier, _attempt: u32, _error: &HuntError) {}

    fn available(&self, _identifier: &Identifier) {}

    fn unavailable(&self, _identifier: &Identifier) {}

    fn failed(&self, _identifier: &Identifier, _error: &HuntError) {}

    /// The identifier was available but could not be written to the output.
    fn write_failed(&self, _identifier: &Identifier, _error: &HuntError) {}
}

/// Progress sink that discards ticks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn tick(&self) -> Result<(), HuntError> {
        Ok(())
    }
}

/// Message sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentMessages;

impl MessageSink for SilentMessages {}
