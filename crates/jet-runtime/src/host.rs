//! The host: one handler, its capabilities and the invocation policy.
//!
//! [`Host::invoke`] is the whole host-side protocol: build the capability
//! namespace for a fresh invocation, run the handler under the configured
//! concurrency limit, timeout and panic policy, log the result and hand back
//! an [`InvocationOutcome`].

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jet_config::{JetConfig, RuntimeConfig};
use jet_core::{
    Capabilities, CapabilitiesBuilder, Context, DynHandler, Fetcher, FileStore, Invocation,
    InvocationId, JetError, JetResult, Logger, Request, Response,
};
use jet_telemetry::{log_invocation_complete, log_invocation_error, log_invocation_start};
use jet_telemetry::TracingLogger;
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::capabilities::grant_configured;
use crate::error::{HostError, HostResult};

/// Creates the logger granted to one invocation.
pub type LoggerFactory = Arc<dyn Fn(InvocationId) -> Arc<dyn Logger> + Send + Sync>;

/// Runs one handler on behalf of callers.
///
/// Cloning is cheap and clones share the concurrency limit.
///
/// # Example
///
/// ```
/// use jet_core::fixtures::GreetingHandler;
/// use jet_core::{Context, Request};
/// use jet_runtime::Host;
///
/// # tokio_test::block_on(async {
/// let host = Host::builder().handler(GreetingHandler).build().unwrap();
///
/// let outcome = host.invoke(Request::new("Alice"), Context::for_user("Bob")).await;
/// assert_eq!(outcome.response().unwrap().data(), "Hello Alice, this is Bob.");
/// # });
/// ```
#[derive(Clone)]
pub struct Host {
    handler: Arc<dyn DynHandler>,
    capabilities: Capabilities,
    logger_factory: Option<LoggerFactory>,
    runtime: RuntimeConfig,
    limiter: Arc<Semaphore>,
}

impl Host {
    /// Create a host builder.
    #[must_use]
    pub fn builder() -> HostBuilder {
        HostBuilder::new()
    }

    /// The invocation policy in effect.
    #[must_use]
    pub const fn runtime(&self) -> &RuntimeConfig {
        &self.runtime
    }

    /// Number of invocations that could start right now without waiting.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.limiter.available_permits()
    }

    /// Invoke the handler, waiting for a free slot if the host is at its
    /// concurrency limit.
    pub async fn invoke(&self, request: Request, context: Context) -> InvocationOutcome {
        let id = InvocationId::new();
        let started = Instant::now();

        match Arc::clone(&self.limiter).acquire_owned().await {
            Ok(permit) => self.execute(id, started, permit, request, context).await,
            Err(_) => finish(id, started, Err(self.overloaded())),
        }
    }

    /// Invoke the handler only if a slot is free.
    ///
    /// At the limit the outcome fails with [`JetError::Overloaded`] and the
    /// handler is not called.
    pub async fn try_invoke(&self, request: Request, context: Context) -> InvocationOutcome {
        let id = InvocationId::new();
        let started = Instant::now();

        match Arc::clone(&self.limiter).try_acquire_owned() {
            Ok(permit) => self.execute(id, started, permit, request, context).await,
            Err(TryAcquireError::NoPermits | TryAcquireError::Closed) => {
                finish(id, started, Err(self.overloaded()))
            }
        }
    }

    /// Decode a request and context from JSON, then [`invoke`](Self::invoke).
    ///
    /// Malformed input fails the outcome with [`JetError::InvalidInput`]
    /// before the handler runs.
    pub async fn invoke_json(&self, request_json: &str, context_json: &str) -> InvocationOutcome {
        let decoded = Request::from_json(request_json)
            .and_then(|request| Ok((request, Context::from_json(context_json)?)));

        match decoded {
            Ok((request, context)) => self.invoke(request, context).await,
            Err(err) => finish(InvocationId::new(), Instant::now(), Err(err)),
        }
    }

    fn overloaded(&self) -> JetError {
        JetError::overloaded(self.runtime.max_concurrent_invocations)
    }

    fn capabilities_for(&self, id: InvocationId) -> Capabilities {
        match &self.logger_factory {
            Some(factory) => self.capabilities.clone().with_logger(factory(id)),
            None => self.capabilities.clone(),
        }
    }

    async fn execute(
        &self,
        id: InvocationId,
        started: Instant,
        _permit: OwnedSemaphorePermit,
        request: Request,
        context: Context,
    ) -> InvocationOutcome {
        log_invocation_start!(id, request.to(), context.current_user().name());

        let invocation = Invocation::new(request, context)
            .with_id(id)
            .with_capabilities(self.capabilities_for(id))
            .with_catch_panics(self.runtime.catch_panics);

        let run = invocation.run(self.handler.as_ref());
        let result = match self.runtime.invocation_timeout() {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .unwrap_or_else(|_| Err(JetError::timeout(millis(limit)))),
            None => run.await,
        };

        finish(id, started, result)
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("capabilities", &self.capabilities)
            .field("log", &self.logger_factory.is_some())
            .field("runtime", &self.runtime)
            .field("available_permits", &self.limiter.available_permits())
            .finish_non_exhaustive()
    }
}

fn finish(id: InvocationId, started: Instant, result: JetResult<Response>) -> InvocationOutcome {
    let duration = started.elapsed();

    match &result {
        Ok(response) => log_invocation_complete!(id, response.status(), millis(duration)),
        Err(error) => log_invocation_error!(id, error, millis(duration)),
    }

    InvocationOutcome {
        invocation_id: id,
        duration,
        result,
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Builder for [`Host`].
///
/// Capabilities come from the configuration unless overridden here; an
/// override is granted even if the configuration disables that capability.
#[derive(Default)]
pub struct HostBuilder {
    config: JetConfig,
    handler: Option<Arc<dyn DynHandler>>,
    capabilities: CapabilitiesBuilder,
    fetcher: Option<Arc<dyn Fetcher>>,
    files: Option<Arc<dyn FileStore>>,
    logger_factory: Option<LoggerFactory>,
}

impl HostBuilder {
    /// Create a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this configuration.
    #[must_use]
    pub fn config(mut self, config: JetConfig) -> Self {
        self.config = config;
        self
    }

    /// The handler to invoke. A host runs exactly one.
    #[must_use]
    pub fn handler<H: DynHandler>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// A handler already behind an `Arc`.
    #[must_use]
    pub fn shared_handler(mut self, handler: Arc<dyn DynHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Register a typed service for handlers to resolve.
    #[must_use]
    pub fn service<T: Send + Sync + 'static>(mut self, service: Arc<T>) -> Self {
        self.capabilities = self.capabilities.service(service);
        self
    }

    /// Grant this fetcher instead of the configured one.
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Grant this file store instead of the configured one.
    #[must_use]
    pub fn files(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = Some(files);
        self
    }

    /// Create each invocation's logger with `factory` instead of a
    /// [`TracingLogger`].
    #[must_use]
    pub fn logger_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(InvocationId) -> Arc<dyn Logger> + Send + Sync + 'static,
    {
        self.logger_factory = Some(Arc::new(factory));
        self
    }

    /// Build the host.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::MissingHandler`] without a handler,
    /// [`HostError::Config`] if the configuration is invalid, or
    /// [`HostError::CapabilitySetup`] if a configured capability fails.
    pub fn build(self) -> HostResult<Host> {
        let handler = self.handler.ok_or(HostError::MissingHandler)?;
        self.config.validate()?;

        let mut capabilities = grant_configured(self.capabilities, &self.config.capabilities)?;
        if let Some(fetcher) = self.fetcher {
            capabilities = capabilities.fetcher(fetcher);
        }
        if let Some(files) = self.files {
            capabilities = capabilities.files(files);
        }

        let logger_factory = match self.logger_factory {
            Some(factory) => Some(factory),
            None if self.config.capabilities.logging => Some(tracing_logger_factory()),
            None => None,
        };

        let limit = self
            .config
            .runtime
            .max_concurrent_invocations
            .min(Semaphore::MAX_PERMITS);

        Ok(Host {
            handler,
            capabilities: capabilities.build(),
            logger_factory,
            runtime: self.config.runtime,
            limiter: Arc::new(Semaphore::new(limit)),
        })
    }
}

fn tracing_logger_factory() -> LoggerFactory {
    Arc::new(|id| Arc::new(TracingLogger::new(id)) as Arc<dyn Logger>)
}

/// What happened to one invocation.
#[derive(Debug)]
pub struct InvocationOutcome {
    /// Invocation ID, also present in every log line of the invocation.
    pub invocation_id: InvocationId,
    /// Wall time from acceptance to completion, including any wait for a slot.
    pub duration: Duration,
    /// The handler's response, or why there is none.
    pub result: JetResult<Response>,
}

impl InvocationOutcome {
    /// Returns `true` if the handler produced a response.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// The response, if any.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.result.as_ref().ok()
    }

    /// The failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&JetError> {
        self.result.as_ref().err()
    }

    /// Discard the metadata.
    pub fn into_result(self) -> JetResult<Response> {
        self.result
    }

    /// Turn the outcome into a response a caller can always render.
    ///
    /// A failure becomes a response with the error category's status code
    /// and a JSON [`ErrorEnvelope`](jet_core::ErrorEnvelope) as data.
    #[must_use]
    pub fn into_response(self) -> Response {
        match self.result {
            Ok(response) => response,
            Err(error) => {
                let id = self.invocation_id.to_string();
                let envelope = error.to_envelope(Some(&id));
                let data = serde_json::to_string(&envelope).unwrap_or_else(|_| error.to_string());
                Response::new(i64::from(error.status_code().as_u16()), data)
            }
        }
    }
}

/// Wire form of a [`Response`]: `{"status": <int>, "data": <text>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResponseEnvelope<'a> {
    /// Status code.
    pub status: i64,
    /// Body.
    pub data: &'a str,
}

impl<'a> ResponseEnvelope<'a> {
    /// Borrow a response for rendering.
    #[must_use]
    pub fn new(response: &'a Response) -> Self {
        Self {
            status: response.status(),
            data: response.data(),
        }
    }

    /// Render as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Json`] if serialization fails.
    pub fn to_json(&self) -> HostResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Render as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Json`] if serialization fails.
    pub fn to_json_pretty(&self) -> HostResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<'a> From<&'a Response> for ResponseEnvelope<'a> {
    fn from(response: &'a Response) -> Self {
        Self::new(response)
    }
}
