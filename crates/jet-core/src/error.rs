//! Error types for Jet.
//!
//! [`JetError`] describes every way an invocation can end without a
//! [`Response`](crate::Response). The core never recovers from these; they
//! travel to the host, which decides what the outside world sees.
//!
//! | Category | Raised when |
//! |---|---|
//! | `InvalidInput` | The host could not decode a Request or Context |
//! | `Handler` | The handler returned an error before responding |
//! | `NonConforming` | The handler produced something that is not a Response |
//! | `Panicked` | The handler panicked |
//! | `Timeout` | The host gave up waiting for the handler |
//! | `Capability` | A host capability was missing or failed |
//! | `Overloaded` | The host refused to start another invocation |

use http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`JetError`].
pub type JetResult<T> = Result<T, JetError>;

/// Classification of invocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed Request or Context.
    InvalidInput,
    /// Handler execution failure.
    Handler,
    /// Handler returned a value that is not a valid Response.
    NonConforming,
    /// Handler panicked.
    Panicked,
    /// Handler did not finish in time.
    Timeout,
    /// Capability missing or failed.
    Capability,
    /// Too many invocations in flight.
    Overloaded,
}

impl ErrorCategory {
    /// Returns the HTTP status a host would conventionally report for this category.
    #[must_use]
    pub const fn default_status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::Handler | Self::NonConforming | Self::Panicked | Self::Capability => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Self::Overloaded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the snake_case name used in logs and envelopes.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::Handler => "handler",
            Self::NonConforming => "non_conforming",
            Self::Panicked => "panicked",
            Self::Timeout => "timeout",
            Self::Capability => "capability",
            Self::Overloaded => "overloaded",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed invocation.
///
/// # Example
///
/// ```
/// use jet_core::{ErrorCategory, JetError};
///
/// let err = JetError::handler("user lookup failed");
/// assert_eq!(err.category(), ErrorCategory::Handler);
/// ```
#[derive(Error, Debug)]
pub enum JetError {
    /// Request or context could not be decoded.
    #[error("Invalid {input}: {message}")]
    InvalidInput {
        /// Which input was malformed ("request" or "context").
        input: String,
        /// Decoder message.
        message: String,
    },

    /// The handler failed before producing a response.
    #[error("Handler failed: {message}")]
    Handler {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        #[source]
        source: Option<anyhow::Error>,
    },

    /// The handler produced something that is not a response.
    #[error("Non-conforming handler result: {message}")]
    NonConforming {
        /// What was wrong with the value.
        message: String,
    },

    /// The handler panicked.
    #[error("Handler panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },

    /// The host stopped waiting for the handler.
    #[error("Handler timed out after {after_ms}ms")]
    Timeout {
        /// Elapsed budget in milliseconds.
        after_ms: u64,
    },

    /// A capability was unavailable or failed.
    #[error("Capability '{capability}' failed: {message}")]
    Capability {
        /// Capability name ("log", "fetch", "files", or a service type).
        capability: String,
        /// Human-readable error message.
        message: String,
    },

    /// The host is at its concurrency limit.
    #[error("Host overloaded: {limit} invocations already in flight")]
    Overloaded {
        /// Configured limit.
        limit: usize,
    },
}

impl JetError {
    /// Creates an input decoding error.
    #[must_use]
    pub fn invalid_input(input: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            input: input.into(),
            message: message.into(),
        }
    }

    /// Creates a handler failure.
    #[must_use]
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a handler failure with a source error.
    pub fn handler_with_source(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::Handler {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a non-conforming result error.
    #[must_use]
    pub fn non_conforming(message: impl Into<String>) -> Self {
        Self::NonConforming {
            message: message.into(),
        }
    }

    /// Creates a panic error.
    #[must_use]
    pub fn panicked(message: impl Into<String>) -> Self {
        Self::Panicked {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[must_use]
    pub const fn timeout(after_ms: u64) -> Self {
        Self::Timeout { after_ms }
    }

    /// Creates a capability failure.
    #[must_use]
    pub fn capability(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Capability {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Creates an error for a capability the host did not grant.
    #[must_use]
    pub fn capability_unavailable(capability: impl Into<String>) -> Self {
        Self::capability(capability, "not available in this invocation")
    }

    /// Creates an overload error.
    #[must_use]
    pub const fn overloaded(limit: usize) -> Self {
        Self::Overloaded { limit }
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::InvalidInput,
            Self::Handler { .. } => ErrorCategory::Handler,
            Self::NonConforming { .. } => ErrorCategory::NonConforming,
            Self::Panicked { .. } => ErrorCategory::Panicked,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Capability { .. } => ErrorCategory::Capability,
            Self::Overloaded { .. } => ErrorCategory::Overloaded,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        self.category().default_status_code()
    }

    /// Converts this error to a serializable envelope.
    #[must_use]
    pub fn to_envelope(&self, invocation_id: Option<&str>) -> ErrorEnvelope {
        ErrorEnvelope {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                category: self.category(),
            },
            invocation_id: invocation_id.map(ToString::to_string),
        }
    }

    const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::Handler { .. } => "HANDLER_FAILED",
            Self::NonConforming { .. } => "NON_CONFORMING_RESULT",
            Self::Panicked { .. } => "HANDLER_PANICKED",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Capability { .. } => "CAPABILITY_ERROR",
            Self::Overloaded { .. } => "OVERLOADED",
        }
    }
}

impl From<anyhow::Error> for JetError {
    fn from(error: anyhow::Error) -> Self {
        Self::Handler {
            message: error.to_string(),
            source: Some(error),
        }
    }
}

/// Serializable error envelope a host may render for a failed invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// The error detail.
    pub error: ErrorDetail,
    /// Invocation the error belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
}

/// Error detail inside an [`ErrorEnvelope`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Category.
    pub category: ErrorCategory,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_categories() {
        assert_eq!(
            JetError::invalid_input("request", "missing field `to`").category(),
            ErrorCategory::InvalidInput
        );
        assert_eq!(JetError::handler("x").category(), ErrorCategory::Handler);
        assert_eq!(
            JetError::non_conforming("x").category(),
            ErrorCategory::NonConforming
        );
        assert_eq!(JetError::panicked("x").category(), ErrorCategory::Panicked);
        assert_eq!(JetError::timeout(5).category(), ErrorCategory::Timeout);
        assert_eq!(
            JetError::capability_unavailable("fetch").category(),
            ErrorCategory::Capability
        );
        assert_eq!(JetError::overloaded(1).category(), ErrorCategory::Overloaded);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            JetError::invalid_input("context", "x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            JetError::handler("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            JetError::timeout(10).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            JetError::overloaded(4).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            JetError::timeout(250).to_string(),
            "Handler timed out after 250ms"
        );
        assert_eq!(
            JetError::capability_unavailable("fetch").to_string(),
            "Capability 'fetch' failed: not available in this invocation"
        );
    }

    #[test]
    fn test_from_anyhow_keeps_source() {
        let err: JetError = anyhow::anyhow!("database unreachable").into();
        assert_eq!(err.category(), ErrorCategory::Handler);
        assert!(err.to_string().contains("database unreachable"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_envelope() {
        let envelope = JetError::handler("boom").to_envelope(Some("inv-1"));
        assert_eq!(envelope.error.code, "HANDLER_FAILED");
        assert_eq!(envelope.error.category, ErrorCategory::Handler);
        assert_eq!(envelope.invocation_id.as_deref(), Some("inv-1"));

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["error"]["category"], "handler");
    }

    #[test]
    fn test_envelope_without_invocation_id() {
        let json = serde_json::to_string(&JetError::panicked("oops").to_envelope(None)).unwrap();
        assert!(!json.contains("invocation_id"));
    }
}
