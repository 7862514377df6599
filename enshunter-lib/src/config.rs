//! Configuration file parsing and management.
//!
//! Settings come from TOML files and `ENSHUNTER_*` environment variables.
//! The front end merges them with command-line flags in this order, highest
//! first: flags, environment, local file, global file, built-in defaults.

use crate::error::HuntError;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-user configuration directory under `$HOME`.
pub const CONFIG_DIR: &str = ".enshunter";

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Default values for CLI options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default configuration values that map to CLI options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DefaultsConfig {
    /// Infura project id used to build the RPC endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infura_key: Option<String>,

    /// Explicit JSON-RPC endpoint (takes precedence over `infura_key`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,

    /// Number of concurrent workers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Pacing interval in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<u64>,

    /// Retries after a failed attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u32>,

    /// Global deadline in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Configuration discovery, loading and persistence.
pub struct ConfigManager {
    /// Whether to log discovery details
    pub verbose: bool,
}

impl ConfigManager {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, HuntError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HuntError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            HuntError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)
            .map_err(|e| HuntError::config(format!("Failed to parse TOML configuration: {}", e)))?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// The global file (`~/.enshunter/config.toml`) is loaded first, then a
    /// local `./enshunter.toml` overrides it field by field.
    pub fn discover_and_load(&self) -> Result<FileConfig, HuntError> {
        let mut merged = FileConfig::default();
        let mut loaded = Vec::new();

        for path in [self.get_global_config_path(), self.get_local_config_path()]
            .into_iter()
            .flatten()
        {
            let config = self.load_file(&path)?;
            merged = self.merge_configs(merged, config);
            loaded.push(path);
        }

        if self.verbose {
            for path in &loaded {
                tracing::info!(path = %path.display(), "loaded configuration file");
            }
        }

        Ok(merged)
    }

    /// Write `config` to `path`, creating parent directories as needed.
    pub fn save<P: AsRef<Path>>(&self, path: P, config: &FileConfig) -> Result<(), HuntError> {
        let path = path.as_ref();
        self.validate_config(config)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    HuntError::file_error(
                        parent.to_string_lossy(),
                        format!("Failed to create configuration directory: {}", e),
                    )
                })?;
            }
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| HuntError::config(format!("Failed to serialize configuration: {}", e)))?;

        fs::write(path, content).map_err(|e| {
            HuntError::file_error(
                path.to_string_lossy(),
                format!("Failed to write configuration file: {}", e),
            )
        })
    }

    /// Where `--save-config` writes: `~/.enshunter/config.toml`, or
    /// `.enshunter/config.toml` relative to the working directory when no
    /// home directory is known.
    pub fn default_config_path() -> PathBuf {
        match env::var_os("HOME") {
            Some(home) => Path::new(&home).join(CONFIG_DIR).join("config.toml"),
            None => Path::new(CONFIG_DIR).join("config.toml"),
        }
    }

    fn get_local_config_path(&self) -> Option<PathBuf> {
        let path = Path::new("./enshunter.toml");
        path.exists().then(|| path.to_path_buf())
    }

    fn get_global_config_path(&self) -> Option<PathBuf> {
        env::var_os("HOME")?;
        let path = Self::default_config_path();
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(lower), Some(higher)) => Some(DefaultsConfig {
                    infura_key: higher.infura_key.or(lower.infura_key),
                    rpc_url: higher.rpc_url.or(lower.rpc_url),
                    workers: higher.workers.or(lower.workers),
                    rate_limit: higher.rate_limit.or(lower.rate_limit),
                    retries: higher.retries.or(lower.retries),
                    timeout: higher.timeout.or(lower.timeout),
                }),
                (lower, higher) => higher.or(lower),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), HuntError> {
        if let Some(defaults) = &config.defaults {
            validate_workers(defaults.workers)?;
            validate_timeout(defaults.timeout)?;

            if let Some(key) = &defaults.infura_key {
                if key.trim().is_empty() {
                    return Err(HuntError::config("infura_key cannot be empty"));
                }
            }
        }
        Ok(())
    }
}

/// Workers must be between 1 and 100.
pub fn validate_workers(workers: Option<usize>) -> Result<(), HuntError> {
    match workers {
        Some(w) if w == 0 || w > 100 => Err(HuntError::config("Workers must be between 1 and 100")),
        _ => Ok(()),
    }
}

/// The deadline must be at least one second.
pub fn validate_timeout(timeout: Option<u64>) -> Result<(), HuntError> {
    match timeout {
        Some(0) => Err(HuntError::config("Timeout must be at least 1 second")),
        _ => Ok(()),
    }
}

/// Settings taken from the environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub infura_key: Option<String>,
    pub rpc_url: Option<String>,
    pub workers: Option<usize>,
    pub rate_limit: Option<u64>,
    pub retries: Option<u32>,
    pub timeout: Option<u64>,
    pub config: Option<String>,
}

/// Load configuration from the process environment.
///
/// Reads `INFURA_KEY`, `ENSHUNTER_RPC_URL`, `ENSHUNTER_WORKERS`,
/// `ENSHUNTER_RATE_LIMIT`, `ENSHUNTER_RETRIES`, `ENSHUNTER_TIMEOUT` and
/// `ENSHUNTER_CONFIG`. The tuning values also accept the plain `WORKERS`,
/// `RATE_LIMIT`, `RETRIES` and `TIMEOUT` names used by older `.env` files;
/// the prefixed name wins. Invalid values are logged and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|name| env::var(name).ok())
}

/// Same as [`load_env_config`] with a custom variable lookup.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let tuning = |name: &str| {
        non_empty(&format!("ENSHUNTER_{}", name)).or_else(|| non_empty(name))
    };

    let mut env_config = EnvConfig {
        infura_key: non_empty("INFURA_KEY"),
        rpc_url: non_empty("ENSHUNTER_RPC_URL"),
        config: non_empty("ENSHUNTER_CONFIG"),
        ..Default::default()
    };

    if let Some(val) = tuning("WORKERS") {
        match val.trim().parse::<usize>() {
            Ok(w) if validate_workers(Some(w)).is_ok() => env_config.workers = Some(w),
            _ => tracing::warn!(value = %val, "invalid worker count in environment, must be 1-100"),
        }
    }

    if let Some(val) = tuning("RATE_LIMIT") {
        match val.trim().parse::<u64>() {
            Ok(ms) => env_config.rate_limit = Some(ms),
            Err(_) => tracing::warn!(value = %val, "invalid rate limit in environment, expected milliseconds"),
        }
    }

    if let Some(val) = tuning("RETRIES") {
        match val.trim().parse::<u32>() {
            Ok(r) => env_config.retries = Some(r),
            Err(_) => tracing::warn!(value = %val, "invalid retry count in environment"),
        }
    }

    if let Some(val) = tuning("TIMEOUT") {
        match val.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => env_config.timeout = Some(secs),
            _ => tracing::warn!(value = %val, "invalid timeout in environment, expected seconds"),
        }
    }

    env_config
}
