//! # Jet Test
//!
//! Test utilities for Jet handlers. A [`TestHost`] drives a handler through
//! the real host invocation path while granting in-memory capabilities, so
//! tests need no network, filesystem, or global subscriber.
//!
//! ## Key Features
//!
//! - **Fake Capabilities**: [`RecordingLogger`], [`StaticFetcher`], [`MemoryFileStore`]
//! - **Per-Invocation Logs**: Each [`TestOutcome`] carries only its own log lines
//! - **Assertions**: Chainable checks on the response or the failure category
//!
//! ## Example
//!
//! ```
//! use jet_core::{handler_fn, Capabilities, Context, LogLevel, Request, Response};
//! use jet_test::TestHost;
//!
//! # tokio_test::block_on(async {
//! let host = TestHost::new(handler_fn(|request, context| async move {
//!     Capabilities::current()?.log(LogLevel::Info, "greeting")?;
//!     Ok(Response::ok(format!(
//!         "Hello {}, this is {}.",
//!         request.to(),
//!         context.current_user().name()
//!     )))
//! }));
//!
//! host.invoke(Request::new("Alice"), Context::for_user("Bob"))
//!     .await
//!     .assert_response(200, "Hello Alice, this is Bob.")
//!     .assert_logged("greeting");
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/jet-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod fakes;
mod host;

pub use error::TestError;
pub use fakes::{LogEntry, MemoryFileStore, RecordingLogger, StaticFetcher};
pub use host::{TestHost, TestHostBuilder, TestOutcome};
