//! Terminal output for the enshunter CLI.
//!
//! Banner, verbose per-name messages, the `[n/total]` progress line and
//! the final summary. Uses only the `console` crate.

use console::{style, Term};
use enshunter_lib::{HuntError, Identifier, MessageSink, ProgressSink, ScanSummary};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

// ── Banner ───────────────────────────────────────────────────────────────────

pub fn print_banner() {
    println!(
        "{} {}",
        style("ENSHunter").green().bold(),
        style(format!("v{} initialized", env!("CARGO_PKG_VERSION"))).dim()
    );
}

pub fn print_start(count: usize, workers: usize) {
    println!(
        "Starting ENSHunter - checking {} name{} with {} worker{}",
        style(count).cyan(),
        if count == 1 { "" } else { "s" },
        style(workers).cyan(),
        if workers == 1 { "" } else { "s" },
    );
}

pub fn print_info(message: &str) {
    println!("{}", style(message).cyan());
}

pub fn print_success(message: &str) {
    println!("{}", style(message).green().bold());
}

pub fn print_warning(message: &str) {
    eprintln!("{}", style(message).yellow());
}

pub fn print_fatal(message: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), message);
}

pub fn print_hint(message: &str) {
    eprintln!("{} {}", style("Hint:").cyan(), style(message).dim());
}

// ── Progress ─────────────────────────────────────────────────────────────────

/// `[n/total]` counter redrawn on stderr; silent when stderr is not a TTY.
pub struct ConsoleProgress {
    term: Term,
    enabled: bool,
    total: AtomicU64,
    done: AtomicU64,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let term = Term::stderr();
        let enabled = term.is_term();
        Self {
            term,
            enabled,
            total: AtomicU64::new(0),
            done: AtomicU64::new(0),
        }
    }

    fn redraw(&self, done: u64) -> io::Result<()> {
        let total = self.total.load(Ordering::Relaxed).max(1);
        let percent = done * 100 / total;
        self.term.clear_line()?;
        self.term.write_str(&format!(
            "{} {}",
            style(format!("[{}/{}]", done, total)).dim(),
            style(format!("{}%", percent)).cyan()
        ))
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn start(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
    }

    fn tick(&self) -> Result<(), HuntError> {
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if !self.enabled {
            return Ok(());
        }
        self.redraw(done)
            .map_err(|e| HuntError::internal(format!("progress redraw failed: {}", e)))
    }

    fn finish(&self) {
        if self.enabled {
            let _ = self.term.clear_line();
        }
    }
}

// ── Messages ─────────────────────────────────────────────────────────────────

/// Per-name messages, printed only in verbose mode (write failures always).
pub struct ConsoleMessages {
    verbose: bool,
}

impl ConsoleMessages {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn clear_progress(&self) {
        let term = Term::stderr();
        if term.is_term() {
            let _ = term.clear_line();
        }
    }
}

impl MessageSink for ConsoleMessages {
    fn retrying(&self, identifier: &Identifier, attempt: u32, error: &HuntError) {
        if self.verbose {
            self.clear_progress();
            println!(
                "{} {}",
                style(format!("Retry {} for {}", attempt, identifier)).cyan(),
                style(format!("({})", error)).dim()
            );
        }
    }

    fn available(&self, identifier: &Identifier) {
        if self.verbose {
            self.clear_progress();
            println!("{}", style(format!("{} is available", identifier)).green().bold());
        }
    }

    fn unavailable(&self, identifier: &Identifier) {
        if self.verbose {
            self.clear_progress();
            println!("{} is not available", identifier);
        }
    }

    fn failed(&self, identifier: &Identifier, error: &HuntError) {
        if self.verbose {
            self.clear_progress();
            println!(
                "{}",
                style(format!("Error checking {}: {}", identifier, error)).red().bold()
            );
        }
    }

    fn write_failed(&self, identifier: &Identifier, error: &HuntError) {
        self.clear_progress();
        eprintln!(
            "{}",
            style(format!("Error writing {} to output: {}", identifier, error)).red().bold()
        );
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

pub fn print_summary(summary: &ScanSummary, output_path: &str) {
    println!();
    if summary.deadline_expired && summary.checked > 0 && summary.errored > 0 {
        println!(
            "{}",
            style("Deadline reached before every name could be checked").yellow()
        );
    }
    println!("{}", style("Scan completed!").green().bold());
    println!("Total names checked: {}", style(summary.checked).cyan());
    println!("Available names: {}", style(summary.available).green());
    println!("Taken names: {}", summary.unavailable);
    let errors = if summary.errored > 0 {
        style(summary.errored).red()
    } else {
        style(summary.errored).green()
    };
    println!("Errors: {}", errors);
    println!("Elapsed: {:.1}s", summary.elapsed.as_secs_f64());
    println!("Available names saved to: {}", style(output_path).cyan());
}
