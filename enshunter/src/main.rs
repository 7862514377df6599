//! ENSHunter CLI Application
//!
//! Reads candidate names from a file, checks each one against the ENS
//! registrar controller and writes the available ones to an output file.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use enshunter_lib::{
    load_env_config, load_identifiers_from_file, validate_timeout, validate_workers,
    ConfigManager, DefaultsConfig, EnvConfig, FileConfig, HuntError, OutputSink, RegistrarClient,
    ScanConfig, Scanner, DEFAULT_SUFFIX,
};
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Timeout for the connection probe and each JSON-RPC request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// CLI arguments for enshunter
#[derive(Parser, Debug)]
#[command(name = "enshunter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bulk ENS name availability scanner")]
#[command(
    long_about = "Check a list of names against the ENS registrar controller.\n\nRuns a fixed pool of workers with per-worker pacing, bounded retries and one global deadline. Available names are written to the output file as they are found."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Infura project ID (or INFURA_KEY in the environment / .env)
    #[arg(long = "infura", value_name = "PROJECT_ID", help_heading = "Connection")]
    pub infura: Option<String>,

    /// JSON-RPC endpoint to use instead of Infura mainnet
    #[arg(long = "rpc-url", value_name = "URL", help_heading = "Connection")]
    pub rpc_url: Option<String>,

    /// Input file with names to check (one per line)
    #[arg(
        short = 'i',
        long = "input",
        value_name = "FILE",
        default_value = "esn.txt",
        help_heading = "Files"
    )]
    pub input: String,

    /// Output file for available names
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        default_value = "ens_available.txt",
        help_heading = "Files"
    )]
    pub output: String,

    /// Number of concurrent workers (default: 5, max: 100)
    #[arg(short = 'w', long = "workers", value_name = "N", help_heading = "Performance")]
    pub workers: Option<usize>,

    /// Pause between requests per worker, in milliseconds (default: 100)
    #[arg(short = 'r', long = "rate", value_name = "MS", help_heading = "Performance")]
    pub rate: Option<u64>,

    /// Retries after a failed check (default: 3)
    #[arg(long = "retries", value_name = "N", help_heading = "Performance")]
    pub retries: Option<u32>,

    /// Global deadline for the whole scan, in seconds (default: 30)
    #[arg(short = 't', long = "timeout", value_name = "SECS", help_heading = "Performance")]
    pub timeout: Option<u64>,

    /// Use a specific config file instead of automatic discovery
    #[arg(short = 'c', long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Save the effective settings to ~/.enshunter/config.toml
    #[arg(long = "save-config", help_heading = "Configuration")]
    pub save_config: bool,

    /// Print a line for every name checked
    #[arg(short = 'v', long = "verbose", help_heading = "Debugging")]
    pub verbose: bool,

    /// Show debug logs on stderr
    #[arg(short = 'd', long = "debug", help_heading = "Debugging")]
    pub debug: bool,
}

/// Effective settings after layering flags, environment and config files.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    infura_key: Option<String>,
    rpc_url: Option<String>,
    workers: usize,
    rate_limit_ms: u64,
    retries: u32,
    timeout_secs: u64,
}

impl Settings {
    /// JSON-RPC endpoint; an explicit URL wins over the Infura key.
    fn endpoint(&self) -> Result<String, HuntError> {
        match (&self.rpc_url, &self.infura_key) {
            (Some(url), _) => Ok(url.clone()),
            (None, Some(key)) => Ok(RegistrarClient::infura_endpoint(key)),
            (None, None) => Err(HuntError::MissingCredential),
        }
    }

    fn scan_config(&self) -> ScanConfig {
        ScanConfig::default()
            .with_workers(self.workers)
            .with_rate_limit(Duration::from_millis(self.rate_limit_ms))
            .with_max_retries(self.retries)
            .with_deadline(Duration::from_secs(self.timeout_secs))
    }

    fn to_file_config(&self) -> FileConfig {
        FileConfig {
            defaults: Some(DefaultsConfig {
                infura_key: self.infura_key.clone(),
                rpc_url: self.rpc_url.clone(),
                workers: Some(self.workers),
                rate_limit: Some(self.rate_limit_ms),
                retries: Some(self.retries),
                timeout: Some(self.timeout_secs),
            }),
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_tracing(args.debug);

    if let Err(e) = run(args).await {
        ui::print_fatal(&e.to_string());
        if let Some(hint) = failure_hint(e.as_ref()) {
            ui::print_hint(hint);
        }
        process::exit(1);
    }
}

/// Extra guidance for failures that are not plain setup mistakes.
fn failure_hint(error: &(dyn std::error::Error + 'static)) -> Option<&'static str> {
    match error.downcast_ref::<HuntError>() {
        Some(e) if !e.is_fatal() => {
            Some("Check the RPC endpoint or Infura key, and re-run with --debug for request details")
        }
        _ => None,
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn validate_args(args: &Args) -> Result<(), String> {
    validate_workers(args.workers).map_err(|e| e.to_string())?;
    validate_timeout(args.timeout).map_err(|e| e.to_string())?;

    if args.input.trim().is_empty() {
        return Err("Input file path cannot be empty".to_string());
    }
    if args.output.trim().is_empty() {
        return Err("Output file path cannot be empty".to_string());
    }
    if let Some(key) = &args.infura {
        if key.trim().is_empty() {
            return Err("Infura project ID cannot be empty".to_string());
        }
    }

    Ok(())
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; credentials may come from anywhere else.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!(error = %e, "failed to read .env file");
        }
    }

    let env_config = load_env_config();
    let file_config = load_file_config(&args, &env_config)?;
    let settings = resolve_settings(&args, &env_config, &file_config);
    tracing::debug!(
        workers = settings.workers,
        rate_limit_ms = settings.rate_limit_ms,
        retries = settings.retries,
        timeout_secs = settings.timeout_secs,
        custom_endpoint = settings.rpc_url.is_some(),
        "resolved settings"
    );

    if args.save_config {
        let path = ConfigManager::default_config_path();
        match ConfigManager::new(args.verbose).save(&path, &settings.to_file_config()) {
            Ok(()) => ui::print_info(&format!("Configuration saved to {}", path.display())),
            Err(e) => ui::print_warning(&format!("Could not save configuration: {}", e)),
        }
    }

    let endpoint = settings.endpoint()?;
    let identifiers = load_identifiers_from_file(&args.input, DEFAULT_SUFFIX)?;

    ui::print_banner();

    let oracle = RegistrarClient::connect(endpoint, REQUEST_TIMEOUT)
        .await
        .map_err(|e| {
            HuntError::network_with_source("Failed to connect to Ethereum", e.to_string())
        })?;
    ui::print_success("Connected to Ethereum network");

    let output = Arc::new(OutputSink::create(&args.output)?);

    let config = settings.scan_config();
    ui::print_start(identifiers.len(), config.workers);

    let scanner = Scanner::new(config, Arc::new(oracle))
        .with_progress(Arc::new(ui::ConsoleProgress::new()))
        .with_messages(Arc::new(ui::ConsoleMessages::new(args.verbose)));

    let governor = scanner.governor();
    let interrupt = {
        let governor = governor.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ui::print_warning("Interrupted, finishing up...");
                governor.cancel();
            }
        })
    };

    let result = scanner.scan_with(identifiers, output, governor).await;
    interrupt.abort();

    let summary = result?;
    ui::print_summary(&summary, &args.output);

    Ok(())
}

/// `--config` wins over `ENSHUNTER_CONFIG`; otherwise discover files.
fn load_file_config(args: &Args, env_config: &EnvConfig) -> Result<FileConfig, HuntError> {
    let manager = ConfigManager::new(args.verbose);
    match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => manager.load_file(path),
        None => manager.discover_and_load(),
    }
}

/// Layer flags over environment over config file over built-in defaults.
fn resolve_settings(args: &Args, env: &EnvConfig, file: &FileConfig) -> Settings {
    let file = file.defaults.clone().unwrap_or_default();
    let defaults = ScanConfig::default();

    Settings {
        infura_key: args
            .infura
            .clone()
            .or_else(|| env.infura_key.clone())
            .or(file.infura_key),
        rpc_url: args
            .rpc_url
            .clone()
            .or_else(|| env.rpc_url.clone())
            .or(file.rpc_url),
        workers: args
            .workers
            .or(env.workers)
            .or(file.workers)
            .unwrap_or(defaults.workers),
        rate_limit_ms: args
            .rate
            .or(env.rate_limit)
            .or(file.rate_limit)
            .unwrap_or(defaults.rate_limit.as_millis() as u64),
        retries: args
            .retries
            .or(env.retries)
            .or(file.retries)
            .unwrap_or(defaults.max_retries),
        timeout_secs: args
            .timeout
            .or(env.timeout)
            .or(file.timeout)
            .unwrap_or(defaults.deadline.as_secs()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_args() -> Args {
        Args {
            infura: None,
            rpc_url: None,
            input: "esn.txt".to_string(),
            output: "ens_available.txt".to_string(),
            workers: None,
            rate: None,
            retries: None,
            timeout: None,
            config: None,
            save_config: false,
            verbose: false,
            debug: false,
        }
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let settings =
            resolve_settings(&create_test_args(), &EnvConfig::default(), &FileConfig::default());
        assert_eq!(settings.workers, 5);
        assert_eq!(settings.rate_limit_ms, 100);
        assert_eq!(settings.retries, 3);
        assert_eq!(settings.timeout_secs, 30);
        assert!(matches!(
            settings.endpoint(),
            Err(HuntError::MissingCredential)
        ));
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let mut args = create_test_args();
        args.workers = Some(40);

        let env = EnvConfig {
            workers: Some(20),
            retries: Some(1),
            infura_key: Some("from-env".to_string()),
            ..Default::default()
        };
        let file = FileConfig {
            defaults: Some(DefaultsConfig {
                workers: Some(10),
                retries: Some(7),
                rate_limit: Some(250),
                infura_key: Some("from-file".to_string()),
                ..Default::default()
            }),
        };

        let settings = resolve_settings(&args, &env, &file);
        assert_eq!(settings.workers, 40);
        assert_eq!(settings.retries, 1);
        assert_eq!(settings.rate_limit_ms, 250);
        assert_eq!(settings.infura_key.as_deref(), Some("from-env"));
        assert_eq!(
            settings.endpoint().unwrap(),
            "https://mainnet.infura.io/v3/from-env"
        );
    }

    #[test]
    fn test_rpc_url_wins_over_infura_key() {
        let mut args = create_test_args();
        args.infura = Some("key".to_string());
        args.rpc_url = Some("http://127.0.0.1:8545".to_string());

        let settings = resolve_settings(&args, &EnvConfig::default(), &FileConfig::default());
        assert_eq!(settings.endpoint().unwrap(), "http://127.0.0.1:8545");
    }

    #[test]
    fn test_scan_config_from_settings() {
        let mut args = create_test_args();
        args.rate = Some(0);
        args.timeout = Some(5);
        args.retries = Some(0);

        let config =
            resolve_settings(&args, &EnvConfig::default(), &FileConfig::default()).scan_config();
        assert_eq!(config.rate_limit, Duration::ZERO);
        assert_eq!(config.deadline, Duration::from_secs(5));
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn test_failure_hint_only_for_runtime_errors() {
        let connect = HuntError::network_with_source("Failed to connect to Ethereum", "refused");
        assert!(failure_hint(&connect).is_some());

        assert!(failure_hint(&HuntError::MissingCredential).is_none());
        assert!(failure_hint(&HuntError::no_input("esn.txt")).is_none());

        let other: Box<dyn std::error::Error> = "plain".into();
        assert!(failure_hint(other.as_ref()).is_none());
    }

    #[test]
    fn test_validate_args() {
        assert!(validate_args(&create_test_args()).is_ok());

        let mut args = create_test_args();
        args.workers = Some(0);
        assert!(validate_args(&args).unwrap_err().contains("between 1 and 100"));

        let mut args = create_test_args();
        args.workers = Some(101);
        assert!(validate_args(&args).is_err());

        let mut args = create_test_args();
        args.timeout = Some(0);
        assert!(validate_args(&args).is_err());

        let mut args = create_test_args();
        args.infura = Some("  ".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_settings_round_trip_through_file_config() {
        let mut args = create_test_args();
        args.infura = Some("abc".to_string());
        args.workers = Some(9);

        let settings = resolve_settings(&args, &EnvConfig::default(), &FileConfig::default());
        let defaults = settings.to_file_config().defaults.unwrap();
        assert_eq!(defaults.infura_key.as_deref(), Some("abc"));
        assert_eq!(defaults.workers, Some(9));
        assert_eq!(defaults.timeout, Some(30));
    }
}
