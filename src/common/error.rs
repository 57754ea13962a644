//! Error types for the benchmark orchestrator
//!
//! Configuration errors are all detected before any external process
//! starts; everything after launch maps an external tool failure to a
//! typed variant so a calling harness can pick its own policy.

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the orchestrator
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    #[error("Unsupported architecture '{name}'. Supported architectures: {supported}")]
    UnsupportedArchitecture { name: String, supported: String },

    #[error("Run config file is required. Pass one with --config <path>")]
    MissingConfig,

    #[error("Image config file is required. Pass one with --imgconfig <path>")]
    MissingImageConfig,

    #[error("Failed to parse config file '{path}': {error}")]
    ConfigParse { path: String, error: String },

    #[error("Benchmark path '{0}' is missing or not a directory")]
    MissingBenchmarkPath(String),

    #[error("Plugin path '{0}' is missing or not a regular file")]
    MissingPluginPath(String),

    #[error("Port number '{0}' is not a valid TCP port")]
    InvalidPort(String),

    // === Launch Errors ===
    #[error("Failed to launch emulator '{program}': {error}")]
    LaunchFailed { program: String, error: String },

    // === Readiness Errors ===
    #[error("Guest did not become reachable on port {port} within {secs} seconds ({attempts} attempts)")]
    BootTimeout { port: u16, secs: u64, attempts: u32 },

    #[error("Readiness wait cancelled")]
    Cancelled,

    // === Deployment / Remote Execution Errors ===
    #[error("'{0}' not found in PATH. Install it to deploy into the guest")]
    ToolNotFound(String),

    #[error("Benchmark transfer into the guest failed: {0}")]
    Transfer(String),

    #[error("Remote script execution failed: {0}")]
    RemoteExec(String),

    // === IO Errors ===
    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },
}

impl Error {
    /// Create an unsupported architecture error listing the supported names
    pub fn unsupported_architecture<S: AsRef<str>>(name: &str, supported: &[S]) -> Self {
        Self::UnsupportedArchitecture {
            name: name.to_string(),
            supported: supported
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create a config parse error for the given file
    pub fn config_parse(path: &str, error: impl std::fmt::Display) -> Self {
        Self::ConfigParse {
            path: path.to_string(),
            error: error.to_string(),
        }
    }

    /// Whether this error was detected during configuration resolution,
    /// before anything was launched
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedArchitecture { .. }
                | Error::MissingConfig
                | Error::MissingImageConfig
                | Error::ConfigParse { .. }
                | Error::MissingBenchmarkPath(_)
                | Error::MissingPluginPath(_)
                | Error::InvalidPort(_)
        )
    }
}
