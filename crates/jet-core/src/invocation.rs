//! One request → response transaction.
//!
//! An [`Invocation`] is what a host builds for each inbound request: the
//! [`Request`], the [`Context`], the [`Capabilities`] granted to the handler
//! and a fresh [`InvocationId`]. [`Invocation::run`] drives a handler
//! through the contract and returns either its single [`Response`] or the
//! [`JetError`] describing why there is none.

use crate::capability::Capabilities;
use crate::handler::DynHandler;
use crate::{Context, JetError, JetResult, Request, Response};
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// A unique identifier for each invocation, using UUID v7.
///
/// UUID v7 is time-ordered, which keeps log lines from one host sortable.
///
/// # Example
///
/// ```
/// use jet_core::InvocationId;
///
/// let id = InvocationId::new();
/// println!("Invocation: {}", id);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Creates a new unique invocation ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates an `InvocationId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for InvocationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Everything a host needs to run one handler call.
///
/// # Example
///
/// ```
/// use jet_core::{handler_fn, Context, Invocation, Request, Response};
///
/// # tokio_test::block_on(async {
/// let handler = handler_fn(|request, context| async move {
///     Ok(Response::ok(format!(
///         "Hello {}, this is {}.",
///         request.to(),
///         context.current_user().name()
///     )))
/// });
///
/// let invocation = Invocation::new(Request::new("Alice"), Context::for_user("Bob"));
/// let response = invocation.run(&handler).await.unwrap();
/// assert_eq!(response.data(), "Hello Alice, this is Bob.");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct Invocation {
    id: InvocationId,
    request: Request,
    context: Context,
    capabilities: Capabilities,
    catch_panics: bool,
    started_at: Instant,
}

impl Invocation {
    /// Creates an invocation with no capabilities and a fresh ID.
    #[must_use]
    pub fn new(request: Request, context: Context) -> Self {
        Self {
            id: InvocationId::new(),
            request,
            context,
            capabilities: Capabilities::none(),
            catch_panics: true,
            started_at: Instant::now(),
        }
    }

    /// Uses the given invocation ID.
    #[must_use]
    pub fn with_id(mut self, id: InvocationId) -> Self {
        self.id = id;
        self
    }

    /// Grants the handler these capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Controls whether a handler panic becomes [`JetError::Panicked`]
    /// (the default) or unwinds into the host.
    #[must_use]
    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.catch_panics = catch_panics;
        self
    }

    /// Returns the invocation ID.
    #[must_use]
    pub const fn id(&self) -> InvocationId {
        self.id
    }

    /// Returns the request.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Returns the capabilities granted to the handler.
    #[must_use]
    pub const fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Returns the time since the invocation was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Runs `handler` against this invocation's inputs.
    ///
    /// The capabilities are installed for the whole handler future, across
    /// every suspension point. No retry, fallback or logging of the result
    /// happens here; that is left to the host.
    ///
    /// # Errors
    ///
    /// Returns whatever error the handler returned, or
    /// [`JetError::Panicked`] if it panicked and panics are being caught.
    pub async fn run<H>(&self, handler: &H) -> JetResult<Response>
    where
        H: DynHandler + ?Sized,
    {
        let span = tracing::debug_span!("invocation", invocation_id = %self.id);
        let call = handler.call(&self.request, &self.context);

        if self.catch_panics {
            self.capabilities
                .clone()
                .scope(AssertUnwindSafe(call).catch_unwind())
                .instrument(span)
                .await
                .unwrap_or_else(|payload| Err(JetError::panicked(panic_message(&*payload))))
        } else {
            self.capabilities.clone().scope(call).instrument(span).await
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::LogLevel;
    use crate::{handler_fn, ErrorCategory, Handler, Logger};
    use std::sync::{Arc, Mutex};

    struct Greeter;

    impl Handler for Greeter {
        async fn handle(&self, request: &Request, context: &Context) -> JetResult<Response> {
            Ok(Response::new(
                200,
                format!(
                    "Hello {}, this is {}.",
                    request.to(),
                    context.current_user().name()
                ),
            ))
        }
    }

    struct Panicker;

    impl Handler for Panicker {
        async fn handle(&self, request: &Request, _context: &Context) -> JetResult<Response> {
            panic!("cannot greet {}", request.to());
        }
    }

    #[derive(Default)]
    struct Lines(Mutex<Vec<String>>);

    impl Logger for Lines {
        fn log(&self, level: LogLevel, message: &str) {
            self.0.lock().unwrap().push(format!("{level}: {message}"));
        }
    }

    #[test]
    fn test_invocation_id_unique() {
        assert_ne!(InvocationId::new(), InvocationId::new());
    }

    #[test]
    fn test_invocation_id_display() {
        let display = InvocationId::new().to_string();
        assert_eq!(display.len(), 36);
        assert!(display.contains('-'));
    }

    #[test]
    fn test_invocation_id_serialization() {
        let id = InvocationId::new();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: InvocationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_invocation_with_id() {
        let uuid = Uuid::now_v7();
        let invocation = Invocation::new(Request::new("a"), Context::for_user("b"))
            .with_id(InvocationId::from_uuid(uuid));
        assert_eq!(*invocation.id().as_uuid(), uuid);
    }

    #[tokio::test]
    async fn test_run_success() {
        let invocation = Invocation::new(Request::new("Alice"), Context::for_user("Bob"));
        let response = invocation.run(&Greeter).await.unwrap();
        assert_eq!(response, Response::new(200, "Hello Alice, this is Bob."));
    }

    #[tokio::test]
    async fn test_run_leaves_inputs_untouched() {
        let invocation = Invocation::new(Request::new("Alice"), Context::for_user("Bob"));
        invocation.run(&Greeter).await.unwrap();
        assert_eq!(invocation.request(), &Request::new("Alice"));
        assert_eq!(invocation.context(), &Context::for_user("Bob"));
    }

    #[tokio::test]
    async fn test_run_catches_panic() {
        let invocation = Invocation::new(Request::new("Alice"), Context::for_user("Bob"));
        let err = invocation.run(&Panicker).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Panicked);
        assert!(err.to_string().contains("cannot greet Alice"));
    }

    #[tokio::test]
    async fn test_run_installs_capabilities() {
        let lines = Arc::new(Lines::default());
        let handler = handler_fn(|request, _context| async move {
            Capabilities::current()?.log(LogLevel::Info, format!("request to {}", request.to()))?;
            Ok(Response::ok("logged"))
        });

        let invocation = Invocation::new(Request::new("Alice"), Context::for_user("Bob"))
            .with_capabilities(Capabilities::builder().logger(lines.clone()).build());
        invocation.run(&handler).await.unwrap();

        assert_eq!(
            lines.0.lock().unwrap().as_slice(),
            &["info: request to Alice".to_string()]
        );
    }

    #[tokio::test]
    async fn test_run_without_capability_fails_invocation() {
        let handler = handler_fn(|_request, _context| async {
            let body = Capabilities::current()?.fetch("https://example.com").await?;
            Ok(Response::ok(body))
        });

        let invocation = Invocation::new(Request::new("Alice"), Context::for_user("Bob"));
        let err = invocation.run(&handler).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Capability);
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&"owned".to_string()), "owned");
        assert_eq!(panic_message(&42_u8), "non-string panic payload");
    }
}
