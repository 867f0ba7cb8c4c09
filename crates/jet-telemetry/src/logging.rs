//! Structured logging for Jet.
//!
//! JSON output for production, pretty output for development, both built on
//! `tracing-subscriber` with an `EnvFilter`.
//!
//! # Example
//!
//! ```rust,ignore
//! use jet_telemetry::logging::{LogConfig, init_logging};
//!
//! let config = LogConfig::default();
//! init_logging(&config)?;
//!
//! tracing::info!(invocation_id = %id, "Invocation started");
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use jet_core::{InvocationId, LogLevel, Logger};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is enabled.
    pub enabled: bool,

    /// Filter directive (e.g., "info", "jet_runtime=debug,warn").
    pub level: String,

    /// Whether to output JSON format.
    pub json_format: bool,

    /// Whether to include span events (enter, exit, close).
    pub span_events: bool,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include target (module path).
    pub include_target: bool,

    /// Whether to emit ANSI colors (pretty format only).
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            json_format: true,
            span_events: false,
            file_line_info: false,
            include_target: true,
            ansi: false,
        }
    }
}

impl LogConfig {
    /// Creates a development configuration with human-readable output.
    #[must_use]
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            json_format: false,
            span_events: true,
            file_line_info: true,
            include_target: true,
            ansi: true,
        }
    }

    /// Creates a production configuration with JSON output.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }
}

/// Initializes the global `tracing` subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a bad level directive and
/// [`TelemetryError::LoggingInit`] if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = create_env_filter(&config.level)?;

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json_format {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(config.ansi)
            .with_span_events(span_events)
            .with_file(config.file_line_info)
            .with_line_number(config.file_line_info)
            .with_target(config.include_target)
            .with_filter(filter);

        tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;
    }

    Ok(())
}

/// Creates an env filter from a directive string.
///
/// # Errors
///
/// Returns error if the directive is invalid.
pub fn create_env_filter(filter: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(filter).map_err(|e| TelemetryError::InvalidFilter(e.to_string()))
}

/// The log capability a host grants to a handler.
///
/// Every line becomes a `tracing` event with target `jet::handler`, carrying
/// the invocation ID and `capability = "log"`.
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    invocation_id: InvocationId,
}

impl TracingLogger {
    /// Creates a logger attributing lines to `invocation_id`.
    #[must_use]
    pub const fn new(invocation_id: InvocationId) -> Self {
        Self { invocation_id }
    }

    /// Returns the invocation this logger writes for.
    #[must_use]
    pub const fn invocation_id(&self) -> InvocationId {
        self.invocation_id
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        let id = self.invocation_id;
        match level {
            LogLevel::Trace => {
                tracing::trace!(
                    target: "jet::handler",
                    invocation_id = %id,
                    capability = "log",
                    "{message}"
                );
            }
            LogLevel::Debug => {
                tracing::debug!(
                    target: "jet::handler",
                    invocation_id = %id,
                    capability = "log",
                    "{message}"
                );
            }
            LogLevel::Info => {
                tracing::info!(
                    target: "jet::handler",
                    invocation_id = %id,
                    capability = "log",
                    "{message}"
                );
            }
            LogLevel::Warn => {
                tracing::warn!(
                    target: "jet::handler",
                    invocation_id = %id,
                    capability = "log",
                    "{message}"
                );
            }
            LogLevel::Error => {
                tracing::error!(
                    target: "jet::handler",
                    invocation_id = %id,
                    capability = "log",
                    "{message}"
                );
            }
        }
    }
}

/// Field names emitted by the invocation macros and [`TracingLogger`].
///
/// `tracing` macros take field names as identifiers, so these constants are
/// for consumers that query the output, such as log pipelines and tests.
pub mod fields {
    /// Invocation ID field name.
    pub const INVOCATION_ID: &str = "invocation_id";

    /// Response status field name.
    pub const STATUS: &str = "status";

    /// Duration field name (in milliseconds).
    pub const DURATION_MS: &str = "duration_ms";

    /// Error field name.
    pub const ERROR: &str = "error";

    /// Error category field name.
    pub const CATEGORY: &str = "category";

    /// Addressee of the request.
    pub const REQUEST_TO: &str = "request.to";

    /// Current user name.
    pub const USER_NAME: &str = "user.name";

    /// Capability that produced a handler log line.
    pub const CAPABILITY: &str = "capability";

    /// Every field name above.
    pub const ALL: &[&str] = &[
        INVOCATION_ID,
        STATUS,
        DURATION_MS,
        ERROR,
        CATEGORY,
        REQUEST_TO,
        USER_NAME,
        CAPABILITY,
    ];
}

/// Logs an invocation start event.
#[macro_export]
macro_rules! log_invocation_start {
    ($invocation_id:expr, $to:expr, $user:expr) => {
        tracing::info!(
            invocation_id = %$invocation_id,
            request.to = %$to,
            user.name = %$user,
            "Invocation started"
        );
    };
}

/// Logs an invocation completion event.
#[macro_export]
macro_rules! log_invocation_complete {
    ($invocation_id:expr, $status:expr, $duration_ms:expr) => {
        tracing::info!(
            invocation_id = %$invocation_id,
            status = $status,
            duration_ms = $duration_ms,
            "Invocation completed"
        );
    };
}

/// Logs an invocation failure event.
#[macro_export]
macro_rules! log_invocation_error {
    ($invocation_id:expr, $error:expr, $duration_ms:expr) => {
        tracing::error!(
            invocation_id = %$invocation_id,
            category = %$error.category(),
            error = %$error,
            duration_ms = $duration_ms,
            "Invocation failed"
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn capture<F: FnOnce()>(f: F) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();

        tracing::subscriber::with_default(subscriber, f);
        captured.contents()
    }

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert!(config.enabled);
        assert!(config.json_format);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_development_config() {
        let config = LogConfig::development();
        assert!(!config.json_format);
        assert!(config.span_events);
        assert!(config.file_line_info);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_production_config() {
        let config = LogConfig::production();
        assert!(config.json_format);
        assert!(!config.span_events);
        assert!(!config.ansi);
    }

    #[test]
    fn test_field_names_match_emitted_fields() {
        let id = InvocationId::new();
        let err = jet_core::JetError::handler("boom");

        let output = capture(|| {
            crate::log_invocation_start!(id, "Alice", "Bob");
            crate::log_invocation_complete!(id, 200_i64, 3_u64);
            crate::log_invocation_error!(id, err, 4_u64);
            TracingLogger::new(id).log(LogLevel::Info, "hello");
        });

        for name in fields::ALL {
            assert!(
                output.contains(&format!("{name}=")),
                "field {name} not emitted: {output}"
            );
        }
    }

    #[test]
    fn test_create_env_filter_valid() {
        assert!(create_env_filter("info").is_ok());
        assert!(create_env_filter("jet_runtime=debug,warn").is_ok());
    }

    #[test]
    fn test_create_env_filter_invalid() {
        let err = create_env_filter("jet_runtime=loud").unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidFilter(_)));
    }

    #[test]
    fn test_disabled_logging() {
        let config = LogConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_logging(&config).is_ok());
    }

    #[test]
    fn test_tracing_logger_tags_invocation() {
        let id = InvocationId::new();
        let logger = TracingLogger::new(id);

        let output = capture(|| {
            logger.log(LogLevel::Warn, "disk nearly full");
            logger.log(LogLevel::Trace, "fine detail");
        });

        assert!(output.contains("disk nearly full"));
        assert!(output.contains("fine detail"));
        assert!(output.contains(&id.to_string()));
        assert!(output.contains("WARN"));
        assert!(output.contains("jet::handler"));
        assert!(output.contains(r#"capability="log""#));
    }

    #[test]
    fn test_invocation_macros() {
        let id = InvocationId::new();
        let err = jet_core::JetError::timeout(30);

        let output = capture(|| {
            crate::log_invocation_start!(id, "Alice", "Bob");
            crate::log_invocation_complete!(id, 200_i64, 3_u64);
            crate::log_invocation_error!(id, err, 30_u64);
        });

        assert!(output.contains("Invocation started"));
        assert!(output.contains("Invocation completed"));
        assert!(output.contains("Invocation failed"));
        assert!(output.contains("category=timeout"));
    }
}
