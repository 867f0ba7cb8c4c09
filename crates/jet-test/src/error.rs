//! Test error types.

use std::fmt;

use jet_runtime::HostError;

/// Errors that can occur while setting up a test host.
#[derive(Debug)]
pub enum TestError {
    /// The underlying host could not be built
    Setup(HostError),
    /// No handler was given to the builder
    MissingHandler,
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup(e) => write!(f, "Test host setup error: {e}"),
            Self::MissingHandler => write!(f, "Test host needs a handler"),
        }
    }
}

impl std::error::Error for TestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Setup(e) => Some(e),
            Self::MissingHandler => None,
        }
    }
}

impl From<HostError> for TestError {
    fn from(e: HostError) -> Self {
        match e {
            HostError::MissingHandler => Self::MissingHandler,
            other => Self::Setup(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_from_host_error() {
        let err = TestError::from(HostError::MissingHandler);
        assert!(matches!(err, TestError::MissingHandler));
        assert_eq!(err.to_string(), "Test host needs a handler");

        let err = TestError::from(HostError::capability_setup("files", "no root"));
        assert!(err.to_string().starts_with("Test host setup error:"));
        assert!(err.source().is_some());
    }
}
