//! Configuration schema types.
//!
//! Every section rejects unknown keys and fills missing ones from its
//! defaults, so a partial file is always legal.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How the host runs each invocation.
///
/// # Example
///
/// ```
/// use jet_config::RuntimeConfig;
///
/// let config = RuntimeConfig {
///     invocation_timeout_ms: Some(5_000),
///     ..Default::default()
/// };
/// assert_eq!(config.invocation_timeout().unwrap().as_secs(), 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Upper bound on one invocation, in milliseconds. `None` waits forever.
    #[serde(default)]
    pub invocation_timeout_ms: Option<u64>,

    /// Maximum number of invocations running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_invocations: usize,

    /// Turn handler panics into failed invocations.
    #[serde(default = "default_true")]
    pub catch_panics: bool,
}

impl RuntimeConfig {
    /// Returns the invocation timeout as a [`Duration`].
    #[must_use]
    pub fn invocation_timeout(&self) -> Option<Duration> {
        self.invocation_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            invocation_timeout_ms: None,
            max_concurrent_invocations: default_max_concurrent(),
            catch_panics: true,
        }
    }
}

fn default_max_concurrent() -> usize {
    64
}

/// Which capabilities handlers are granted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CapabilitiesConfig {
    /// Grant the log capability.
    #[serde(default = "default_true")]
    pub logging: bool,

    /// Network fetch capability.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// File access capability.
    #[serde(default)]
    pub files: FilesConfig,
}

impl Default for CapabilitiesConfig {
    fn default() -> Self {
        Self {
            logging: true,
            fetch: FetchConfig::default(),
            files: FilesConfig::default(),
        }
    }
}

/// Network fetch capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Grant the fetch capability.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_fetch_timeout")]
    pub timeout_ms: u64,

    /// `User-Agent` header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl FetchConfig {
    /// Returns the request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: default_fetch_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_fetch_timeout() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    format!("jet/{}", env!("CARGO_PKG_VERSION"))
}

/// File access capability, sandboxed under `root`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    /// Grant the file capability.
    #[serde(default)]
    pub enabled: bool,

    /// Directory all handler paths resolve under.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Allow writes and removals, not just reads.
    #[serde(default)]
    pub allow_write: bool,
}

/// Log output of the host process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g., "info" or "jet_runtime=debug,warn").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Converts to the telemetry crate's [`jet_telemetry::LogConfig`].
    #[must_use]
    pub fn to_log_config(&self) -> jet_telemetry::LogConfig {
        let base = match self.format {
            LogFormat::Json => jet_telemetry::LogConfig::production(),
            LogFormat::Pretty => jet_telemetry::LogConfig::development(),
        };

        jet_telemetry::LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            ..base
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable multi-line output.
    Pretty,
}

fn default_true() -> bool {
    true
}
