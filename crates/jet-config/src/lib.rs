//! Typed configuration for Jet hosts.
//!
//! [`JetConfig`] holds everything a host needs to run handlers:
//!
//! - [`RuntimeConfig`] - invocation timeout, concurrency limit, panic policy
//! - [`CapabilitiesConfig`] - which capabilities handlers are granted
//! - [`LoggingConfig`] - host log level and format
//!
//! Unknown fields are rejected at every level.
//!
//! # Example
//!
//! ```no_run
//! use jet_config::ConfigLoader;
//!
//! # fn main() -> Result<(), jet_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("jet.toml")?
//!     .with_dotenv()?
//!     .with_env_prefix("JET")
//!     .load()?;
//!
//! println!("max in flight: {}", config.runtime.max_concurrent_invocations);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [runtime]
//! invocation_timeout_ms = 10000
//! max_concurrent_invocations = 64
//! catch_panics = true
//!
//! [capabilities]
//! logging = true
//!
//! [capabilities.fetch]
//! enabled = true
//! timeout_ms = 10000
//! user_agent = "jet/0.1.0"
//!
//! [capabilities.files]
//! enabled = true
//! root = "/srv/jet/data"
//! allow_write = false
//!
//! [logging]
//! enabled = true
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Keys use the form `PREFIX__SECTION__KEY`:
//!
//! - `JET__RUNTIME__INVOCATION_TIMEOUT_MS=2000`
//! - `JET__CAPABILITIES__FETCH__ENABLED=false`
//! - `JET__LOGGING__LEVEL=debug`

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::{JetConfig, JetConfigBuilder};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
pub use schema::{
    CapabilitiesConfig, FetchConfig, FilesConfig, LogFormat, LoggingConfig, RuntimeConfig,
};
