//! Structured logging for Jet.
//!
//! Hosts initialize a `tracing` subscriber once with [`init_logging`] and
//! hand each invocation a [`TracingLogger`], so handler log lines land in the
//! same stream as host events, tagged with the invocation they came from.
//!
//! # Example
//!
//! ```rust,ignore
//! use jet_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::development())?;
//!
//! tracing::info!(invocation_id = "0190...", "Invocation started");
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, TracingLogger};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
