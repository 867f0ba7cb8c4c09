//! # Jet
//!
//! **Async handler runtime with host-injected capabilities**
//!
//! A Jet handler is an async function of a [`Request`](core::Request) and a
//! [`Context`](core::Context) that produces a [`Response`](core::Response).
//! The host decodes inputs, grants capabilities (logging, fetch, sandboxed
//! files) for the duration of one invocation, and reports every failure.
//!
//! ## Quick Start
//!
//! ```rust
//! use jet::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let host = Host::builder()
//!     .handler(handler_fn(|request, context| async move {
//!         Capabilities::current()?.log(LogLevel::Info, "greeting")?;
//!         Ok(Response::new(
//!             200,
//!             format!("Hello {}, this is {}.", request.to(), context.current_user().name()),
//!         ))
//!     }))
//!     .build()
//!     .unwrap();
//!
//! let response = host
//!     .invoke(Request::new("Alice"), Context::for_user("Bob"))
//!     .await
//!     .into_result()
//!     .unwrap();
//! assert_eq!(response.data(), "Hello Alice, this is Bob.");
//! # });
//! ```
//!
//! ## Architecture
//!
//! ```text
//! JSON in → decode → Invocation (id, capabilities) → Handler
//!                                                       ↓
//! outcome ← timeout / panic / conformance checks ←──────┘
//! ```

#![doc(html_root_url = "https://docs.rs/jet/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export the invocation contract
pub use jet_core as core;

// Re-export the host runtime
pub use jet_runtime as runtime;

// Re-export configuration
pub use jet_config as config;

// Re-export logging setup
pub use jet_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use jet::prelude::*;
///
/// let response = Response::ok("hi");
/// assert_eq!(response.status(), 200);
/// ```
pub mod prelude {
    pub use jet_core::{
        handler_fn, value_handler_fn, Capabilities, Context, CurrentUser, ErrorCategory, Handler,
        InvocationId, JetError, JetResult, LogLevel, Request, Response,
    };

    // Re-export host types
    pub use jet_runtime::{Host, HostBuilder, HostError, InvocationOutcome, ResponseEnvelope};

    // Re-export configuration types
    pub use jet_config::{ConfigLoader, JetConfig};

    // Re-export logging setup
    pub use jet_telemetry::{init_logging, LogConfig};
}
