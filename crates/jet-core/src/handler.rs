//! Handler trait for invocation processing.
//!
//! The [`Handler`] trait is the calling convention between a host and user
//! code: two read-only inputs in, one [`Response`] out, delivered
//! asynchronously.

use crate::{Context, JetResult, Request, Response};
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

/// A boxed future, used where handlers are stored behind a trait object.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A function that can serve an invocation.
///
/// A handler receives the [`Request`] and [`Context`] by shared reference,
/// may suspend as often as it likes, and resolves to exactly one
/// [`Response`] or an error. Errors are never turned into responses by the
/// handler contract itself; they reach the host unchanged.
///
/// Host capabilities (logging, fetch, files) are not arguments. They are
/// looked up with [`Capabilities::current`](crate::Capabilities::current)
/// while the handler runs.
///
/// # Example
///
/// ```rust
/// use jet_core::{Context, Handler, JetResult, Request, Response};
///
/// struct Greeter;
///
/// impl Handler for Greeter {
///     async fn handle(&self, request: &Request, context: &Context) -> JetResult<Response> {
///         let body = format!(
///             "Hello {}, this is {}.",
///             request.to(),
///             context.current_user().name()
///         );
///         Ok(Response::new(200, body))
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Serves one invocation.
    ///
    /// # Errors
    ///
    /// Returns [`JetError`](crate::JetError) when no response can be
    /// produced. The host treats every error as a failed invocation.
    fn handle(
        &self,
        request: &Request,
        context: &Context,
    ) -> impl Future<Output = JetResult<Response>> + Send;
}

/// An object-safe view of [`Handler`].
///
/// Hosts keep their handler as `Arc<dyn DynHandler>`. Every [`Handler`]
/// implements this trait automatically.
pub trait DynHandler: Send + Sync + 'static {
    /// Serves one invocation through a boxed future.
    fn call<'a>(
        &'a self,
        request: &'a Request,
        context: &'a Context,
    ) -> BoxFuture<'a, JetResult<Response>>;
}

impl<H: Handler> DynHandler for H {
    fn call<'a>(
        &'a self,
        request: &'a Request,
        context: &'a Context,
    ) -> BoxFuture<'a, JetResult<Response>> {
        Box::pin(self.handle(request, context))
    }
}

/// A function-based handler wrapper.
///
/// The closure receives its own copies of the request and context, so its
/// future can be `'static` and move them freely.
///
/// # Example
///
/// ```rust
/// use jet_core::{handler_fn, Response};
///
/// let handler = handler_fn(|request, _context| async move {
///     Ok(Response::ok(format!("to={}", request.to())))
/// });
/// # let _ = handler;
/// ```
pub struct FnHandler<F, Fut> {
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnHandler<F, Fut>
where
    F: Fn(Request, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JetResult<Response>> + Send + 'static,
{
    /// Creates a new function-based handler.
    #[must_use]
    pub const fn new(func: F) -> Self {
        Self {
            func,
            _phantom: PhantomData,
        }
    }
}

impl<F, Fut> Handler for FnHandler<F, Fut>
where
    F: Fn(Request, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JetResult<Response>> + Send + 'static,
{
    async fn handle(&self, request: &Request, context: &Context) -> JetResult<Response> {
        (self.func)(request.clone(), context.clone()).await
    }
}

/// Wraps an async closure as a [`Handler`].
pub const fn handler_fn<F, Fut>(func: F) -> FnHandler<F, Fut>
where
    F: Fn(Request, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JetResult<Response>> + Send + 'static,
{
    FnHandler::new(func)
}

/// A handler whose closure yields loosely-typed JSON.
///
/// This is the boundary where a handler can hand back something that is not
/// a response: the value is checked with [`Response::from_value`] and a
/// mismatch fails the invocation as non-conforming.
///
/// # Example
///
/// ```rust
/// use jet_core::value_handler_fn;
/// use serde_json::json;
///
/// let handler = value_handler_fn(|request, _context| async move {
///     Ok(json!({ "status": 200, "data": request.to() }))
/// });
/// # let _ = handler;
/// ```
pub struct ValueFnHandler<F, Fut> {
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> Handler for ValueFnHandler<F, Fut>
where
    F: Fn(Request, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JetResult<serde_json::Value>> + Send + 'static,
{
    async fn handle(&self, request: &Request, context: &Context) -> JetResult<Response> {
        let value = (self.func)(request.clone(), context.clone()).await?;
        Response::from_value(value)
    }
}

/// Wraps an async closure returning JSON as a [`Handler`].
pub const fn value_handler_fn<F, Fut>(func: F) -> ValueFnHandler<F, Fut>
where
    F: Fn(Request, Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = JetResult<serde_json::Value>> + Send + 'static,
{
    ValueFnHandler {
        func,
        _phantom: PhantomData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorCategory, JetError};
    use std::sync::Arc;

    struct TestHandler;

    impl Handler for TestHandler {
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

    #[tokio::test]
    async fn test_handler_impl() {
        let response = TestHandler
            .handle(&Request::new("Alice"), &Context::for_user("Bob"))
            .await
            .unwrap();

        assert_eq!(response, Response::new(200, "Hello Alice, this is Bob."));
    }

    #[tokio::test]
    async fn test_handler_error() {
        struct FailingHandler;

        impl Handler for FailingHandler {
            async fn handle(&self, _request: &Request, _context: &Context) -> JetResult<Response> {
                Err(JetError::handler("Something went wrong"))
            }
        }

        let result = FailingHandler
            .handle(&Request::new("Alice"), &Context::for_user("Bob"))
            .await;
        assert_eq!(result.unwrap_err().category(), ErrorCategory::Handler);
    }

    #[tokio::test]
    async fn test_dyn_handler() {
        let handler: Arc<dyn DynHandler> = Arc::new(TestHandler);
        let request = Request::new("Carol");
        let context = Context::for_user("Dave");

        let response = handler.call(&request, &context).await.unwrap();
        assert_eq!(response.data(), "Hello Carol, this is Dave.");
    }

    #[tokio::test]
    async fn test_handler_fn() {
        let handler = handler_fn(|request, context| async move {
            tokio::task::yield_now().await;
            Ok(Response::new(
                202,
                format!("{}:{}", request.to(), context.current_user().name()),
            ))
        });

        let response = handler
            .handle(&Request::new("a"), &Context::for_user("b"))
            .await
            .unwrap();
        assert_eq!(response, Response::new(202, "a:b"));
    }

    #[test]
    fn test_handler_fn_blocking_on() {
        let handler = handler_fn(|_request, _context| async { Ok(Response::ok("")) });
        let response = tokio_test::block_on(
            handler.handle(&Request::new(""), &Context::for_user("")),
        );
        assert_eq!(response.unwrap(), Response::ok(""));
    }
    #[tokio::test]
    async fn test_value_handler_conforming() {
        let handler = value_handler_fn(|request, context| async move {
            Ok(serde_json::json!({
                "status": 200,
                "data": format!("Hello {}, this is {}.", request.to(), context.current_user().name()),
            }))
        });

        let response = handler
            .handle(&Request::new("Alice"), &Context::for_user("Bob"))
            .await
            .unwrap();
        assert_eq!(response, Response::new(200, "Hello Alice, this is Bob."));
    }

    #[tokio::test]
    async fn test_value_handler_non_conforming() {
        let handler =
            value_handler_fn(|_request, _context| async { Ok(serde_json::json!({"status": 200})) });

        let err = handler
            .handle(&Request::new("Alice"), &Context::for_user("Bob"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NonConforming);
    }

    #[tokio::test]
    async fn test_value_handler_error_passes_through() {
        let handler = value_handler_fn(|_request, _context| async {
            Err::<serde_json::Value, _>(JetError::handler("no data"))
        });

        let err = handler
            .handle(&Request::new("Alice"), &Context::for_user("Bob"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Handler);
    }
}
