//! Reference handlers and inputs for tests and demos.
//!
//! # Example
//!
//! ```
//! use jet_core::fixtures::{self, GreetingHandler};
//! use jet_core::Invocation;
//!
//! # tokio_test::block_on(async {
//! let (request, context) = fixtures::alice_to_bob();
//! let response = Invocation::new(request, context)
//!     .run(&GreetingHandler)
//!     .await
//!     .unwrap();
//!
//! assert_eq!(response.data(), "Hello Alice, this is Bob.");
//! # });
//! ```

use crate::capability::{Capabilities, LogLevel};
use crate::{Context, Handler, JetError, JetResult, Request, Response};

/// Builds the greeting body `"Hello {to}, this is {name}."`.
#[must_use]
pub fn greeting(request: &Request, context: &Context) -> String {
    format!(
        "Hello {}, this is {}.",
        request.to(),
        context.current_user().name()
    )
}

/// Replies `200` with [`greeting`]. Uses no capabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreetingHandler;

impl Handler for GreetingHandler {
    async fn handle(&self, request: &Request, context: &Context) -> JetResult<Response> {
        Ok(Response::new(200, greeting(request, context)))
    }
}

/// Logs the request and context through the host, then greets.
///
/// Fails with a capability error if the host granted no logger.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingGreetingHandler;

impl Handler for LoggingGreetingHandler {
    async fn handle(&self, request: &Request, context: &Context) -> JetResult<Response> {
        let caps = Capabilities::current()?;
        caps.log(LogLevel::Info, format!("request {request:?}"))?;
        caps.log(LogLevel::Info, format!("context {context:?}"))?;

        Ok(Response::new(200, greeting(request, context)))
    }
}

/// Always fails before building a response.
#[derive(Debug, Clone)]
pub struct FailingHandler {
    message: String,
}

impl FailingHandler {
    /// Creates a handler failing with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Handler for FailingHandler {
    async fn handle(&self, _request: &Request, _context: &Context) -> JetResult<Response> {
        Err(JetError::handler(self.message.clone()))
    }
}

/// `{to: "Alice"}` and `{current_user: {name: "Bob"}}`.
#[must_use]
pub fn alice_to_bob() -> (Request, Context) {
    (Request::new("Alice"), Context::for_user("Bob"))
}

/// Request and context with empty text everywhere.
#[must_use]
pub fn empty_inputs() -> (Request, Context) {
    (Request::new(""), Context::for_user(""))
}
