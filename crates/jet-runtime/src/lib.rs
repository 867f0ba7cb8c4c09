//! Jet host runtime.
//!
//! A [`Host`] owns one handler and runs it for each inbound request/context
//! pair. Around every invocation it:
//!
//! - grants the capabilities enabled in [`jet_config::JetConfig`] (log
//!   through `tracing`, fetch through `reqwest`, sandboxed file access
//!   through `tokio::fs`)
//! - bounds how many invocations run at once
//! - enforces the invocation timeout and turns panics into failures
//! - logs start, completion and failure with the invocation ID
//!
//! # Example
//!
//! ```no_run
//! use jet_config::ConfigLoader;
//! use jet_core::fixtures::GreetingHandler;
//! use jet_runtime::{Host, ResponseEnvelope};
//!
//! # async fn run() -> Result<(), jet_runtime::HostError> {
//! let config = ConfigLoader::new().with_env_prefix("JET").load()?;
//! let host = Host::builder().config(config).handler(GreetingHandler).build()?;
//!
//! let outcome = host
//!     .invoke_json(r#"{"to": "Alice"}"#, r#"{"current_user": {"name": "Bob"}}"#)
//!     .await;
//! let response = outcome.into_result()?;
//! println!("{}", ResponseEnvelope::new(&response).to_json()?);
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/jet-runtime/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod capabilities;
pub mod error;
mod host;

pub use capabilities::{HttpFetcher, LocalFileStore};
pub use error::{HostError, HostResult};
pub use host::{Host, HostBuilder, InvocationOutcome, LoggerFactory, ResponseEnvelope};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
