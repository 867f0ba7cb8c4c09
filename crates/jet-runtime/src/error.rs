//! Error types for the Jet host.

use jet_config::ConfigError;
use jet_core::JetError;
use jet_telemetry::TelemetryError;
use thiserror::Error;

/// Host setup and run errors.
///
/// Failures of a single invocation are [`JetError`]s carried in an
/// [`InvocationOutcome`](crate::InvocationOutcome); this type covers what
/// can go wrong around them.
#[derive(Debug, Error)]
pub enum HostError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging could not be initialized.
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// A configured capability could not be constructed.
    #[error("Capability '{capability}' setup failed: {message}")]
    CapabilitySetup {
        /// Capability name.
        capability: String,
        /// Error message.
        message: String,
    },

    /// `build` was called before a handler was set.
    #[error("No handler registered")]
    MissingHandler,

    /// JSON rendering error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The invocation itself failed.
    #[error("{0}")]
    Invocation(#[from] JetError),
}

impl HostError {
    /// Create a capability setup error.
    pub fn capability_setup(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CapabilitySetup {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Process exit code for the `jet` binary.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Telemetry(_) | Self::CapabilitySetup { .. } => 2,
            Self::MissingHandler | Self::Json(_) | Self::Invocation(_) => 1,
        }
    }
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
