//! # Jet Core
//!
//! The invocation contract between a Jet host runtime and user handlers.
//!
//! This crate provides the vocabulary every handler speaks:
//!
//! - [`Request`] - The inbound invocation, addressed by `to`
//! - [`Context`] - Ambient metadata, currently the calling [`CurrentUser`]
//! - [`Response`] - The `(status, data)` pair a handler must produce
//! - [`Handler`] - The asynchronous two-argument calling convention
//! - [`Capabilities`] - Host services injected for the duration of one invocation
//! - [`Invocation`] - One request → response transaction, as driven by a host
//! - [`JetError`] - Contract violations surfaced to the host
//!
//! # Example
//!
//! ```
//! use jet_core::{Context, Handler, JetResult, Request, Response};
//!
//! struct Greeter;
//!
//! impl Handler for Greeter {
//!     async fn handle(&self, request: &Request, context: &Context) -> JetResult<Response> {
//!         Ok(Response::new(
//!             200,
//!             format!("Hello {}, this is {}.", request.to(), context.current_user().name()),
//!         ))
//!     }
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/jet-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod capability;
mod contract;
mod error;
pub mod fixtures;
mod handler;
mod invocation;

pub use capability::{Capabilities, CapabilitiesBuilder, Fetcher, FileStore, LogLevel, Logger};
pub use contract::{Context, CurrentUser, Request, Response};
pub use error::{ErrorCategory, ErrorDetail, ErrorEnvelope, JetError, JetResult};
pub use handler::{
    handler_fn, value_handler_fn, BoxFuture, DynHandler, FnHandler, Handler, ValueFnHandler,
};
pub use invocation::{Invocation, InvocationId};
