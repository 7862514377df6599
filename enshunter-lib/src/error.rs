//! Error handling for availability scans.
//!
//! This module defines a single error type covering setup failures (missing
//! credentials, unreadable files, bad configuration) and the per-identifier
//! failures that the oracle can produce during a scan.

use std::fmt;
use std::time::Duration;

/// Main error type for scanning operations.
///
/// Setup errors are fatal and abort before the pipeline starts. Oracle errors
/// are recovered locally: they are retried, then recorded against a single
/// identifier without aborting the run.
#[derive(Debug, Clone)]
pub enum HuntError {
    /// No API credential was supplied from any configuration source
    MissingCredential,

    /// The input produced no identifiers after normalization
    NoInput {
        source: String,
    },

    /// Configuration errors (invalid settings, unparsable files, etc.)
    ConfigError {
        message: String,
    },

    /// File I/O errors for the input list, output file or config file
    FileError {
        path: String,
        message: String,
    },

    /// Transport-level failures talking to the oracle
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// The oracle answered with a JSON-RPC error object
    RpcError {
        code: i64,
        message: String,
    },

    /// The oracle answered with something we could not decode
    ParseError {
        message: String,
    },

    /// The shared scan deadline expired (or the scan was cancelled)
    Deadline {
        after: Duration,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl HuntError {
    /// Create a new "no input" error.
    pub fn no_input<S: Into<String>>(source: S) -> Self {
        Self::NoInput {
            source: source.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new network error.
    pub fn network<M: Into<String>>(message: M) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new JSON-RPC error.
    pub fn rpc<M: Into<String>>(code: i64, message: M) -> Self {
        Self::RpcError {
            code,
            message: message.into(),
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Create a new deadline error.
    pub fn deadline(after: Duration) -> Self {
        Self::Deadline { after }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether another attempt against the oracle could succeed.
    ///
    /// Deadline errors are not retryable: once the shared deadline has passed
    /// every further attempt fails fast.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::RpcError { .. } | Self::ParseError { .. }
        )
    }

    /// Whether this error was caused by the deadline governor.
    pub fn is_deadline(&self) -> bool {
        matches!(self, Self::Deadline { .. })
    }

    /// Whether this error aborts the whole run rather than one identifier.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential
                | Self::NoInput { .. }
                | Self::ConfigError { .. }
                | Self::FileError { .. }
        )
    }
}

impl fmt::Display for HuntError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCredential => write!(
                f,
                "Infura Project ID is required. Use --infura, set INFURA_KEY in .env, or add infura_key to the config file"
            ),
            Self::NoInput { source } => write!(f, "No identifiers found in {}", source),
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::FileError { path, message } => write!(f, "File error at '{}': {}", path, message),
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::RpcError { code, message } => write!(f, "RPC error {}: {}", code, message),
            Self::ParseError { message } => write!(f, "Parse error: {}", message),
            Self::Deadline { after } => write!(f, "Deadline exceeded after {:?}", after),
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for HuntError {}

impl From<reqwest::Error> for HuntError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network_with_source("Request timed out", err.to_string())
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else if err.is_decode() {
            Self::parse(format!("Malformed response body: {}", err))
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for HuntError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("JSON parsing failed: {}", err))
    }
}

impl From<std::io::Error> for HuntError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
