//! In-memory host for handler tests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use jet_config::JetConfig;
use jet_core::{
    Context, DynHandler, ErrorCategory, InvocationId, JetError, Logger, Request, Response,
};
use jet_runtime::{Host, HostBuilder, InvocationOutcome};
use parking_lot::Mutex;

use crate::error::TestError;
use crate::fakes::{LogEntry, MemoryFileStore, RecordingLogger, StaticFetcher};

type Recorders = Arc<Mutex<HashMap<InvocationId, Arc<RecordingLogger>>>>;

tokio::task_local! {
    /// The invocation started by the current `TestHost` call, once known.
    static CALL: Arc<Mutex<Option<InvocationId>>>;
}

/// Drops the recorder of an invocation whose outcome was never collected,
/// e.g. because the handler panic unwound through the call.
struct PendingCall {
    slot: Arc<Mutex<Option<InvocationId>>>,
    recorders: Recorders,
}

impl Drop for PendingCall {
    fn drop(&mut self) {
        if let Some(id) = self.slot.lock().take() {
            self.recorders.lock().remove(&id);
        }
    }
}

/// A host for tests.
///
/// Runs the handler through the real [`Host`] invocation path (concurrency
/// limit, timeout, panic catching) but grants fakes instead of production
/// capabilities: a [`RecordingLogger`] per invocation, a [`StaticFetcher`]
/// and a [`MemoryFileStore`].
///
/// # Example
///
/// ```
/// use jet_core::fixtures::{self, GreetingHandler};
/// use jet_test::TestHost;
///
/// # tokio_test::block_on(async {
/// let host = TestHost::new(GreetingHandler);
/// let (request, context) = fixtures::alice_to_bob();
///
/// host.invoke(request, context)
///     .await
///     .assert_response(200, "Hello Alice, this is Bob.");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TestHost {
    host: Host,
    recorders: Recorders,
    fetcher: Arc<StaticFetcher>,
    files: Arc<MemoryFileStore>,
}

impl TestHost {
    /// Creates a test host with default fakes.
    ///
    /// # Panics
    ///
    /// Panics if the host cannot be built, which only happens with an
    /// invalid configuration.
    pub fn new<H: DynHandler>(handler: H) -> Self {
        Self::builder()
            .handler(handler)
            .build()
            .unwrap_or_else(|e| panic!("failed to build test host: {e}"))
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> TestHostBuilder {
        TestHostBuilder::new()
    }

    /// Invokes the handler.
    pub async fn invoke(&self, request: Request, context: Context) -> TestOutcome {
        self.track(self.host.invoke(request, context)).await
    }

    /// Invokes the handler only if the concurrency limit allows it.
    pub async fn try_invoke(&self, request: Request, context: Context) -> TestOutcome {
        self.track(self.host.try_invoke(request, context)).await
    }

    /// Decodes JSON inputs, then invokes the handler.
    pub async fn invoke_json(&self, request_json: &str, context_json: &str) -> TestOutcome {
        self.track(self.host.invoke_json(request_json, context_json))
            .await
    }

    /// The fake fetcher, for adding responses or inspecting requests.
    #[must_use]
    pub fn fetcher(&self) -> &StaticFetcher {
        &self.fetcher
    }

    /// The fake file store, for seeding or inspecting files.
    #[must_use]
    pub fn files(&self) -> &MemoryFileStore {
        &self.files
    }

    /// The underlying host.
    ///
    /// Invocations made through it directly run with a logger whose lines
    /// are not kept.
    #[must_use]
    pub const fn host(&self) -> &Host {
        &self.host
    }

    async fn track<F>(&self, call: F) -> TestOutcome
    where
        F: Future<Output = InvocationOutcome>,
    {
        let slot = Arc::new(Mutex::new(None));
        let _pending = PendingCall {
            slot: slot.clone(),
            recorders: self.recorders.clone(),
        };

        let outcome = CALL.scope(slot, call).await;
        let logs = self
            .recorders
            .lock()
            .remove(&outcome.invocation_id)
            .map(|logger| logger.entries())
            .unwrap_or_default();

        TestOutcome { outcome, logs }
    }
}

/// Builder for [`TestHost`].
pub struct TestHostBuilder {
    config: JetConfig,
    builder: HostBuilder,
    has_handler: bool,
    fetcher: Option<Arc<StaticFetcher>>,
    files: Option<Arc<MemoryFileStore>>,
}

impl Default for TestHostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHostBuilder {
    /// Creates a builder granting all capabilities, with no timeout.
    #[must_use]
    pub fn new() -> Self {
        let mut config = JetConfig::default();
        // Production fetch and file access are replaced by fakes.
        config.capabilities.fetch.enabled = false;
        config.capabilities.files.enabled = false;

        Self {
            config,
            builder: Host::builder(),
            has_handler: false,
            fetcher: Some(Arc::new(StaticFetcher::new())),
            files: Some(Arc::new(MemoryFileStore::new())),
        }
    }

    /// The handler under test.
    #[must_use]
    pub fn handler<H: DynHandler>(mut self, handler: H) -> Self {
        self.builder = self.builder.handler(handler);
        self.has_handler = true;
        self
    }

    /// Uses this fetcher.
    #[must_use]
    pub fn fetcher(mut self, fetcher: StaticFetcher) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Uses this file store.
    #[must_use]
    pub fn files(mut self, files: MemoryFileStore) -> Self {
        self.files = Some(Arc::new(files));
        self
    }

    /// Registers a typed service.
    #[must_use]
    pub fn service<T: Send + Sync + 'static>(mut self, service: Arc<T>) -> Self {
        self.builder = self.builder.service(service);
        self
    }

    /// Does not grant the log capability.
    #[must_use]
    pub fn without_logger(mut self) -> Self {
        self.config.capabilities.logging = false;
        self
    }

    /// Does not grant the fetch capability.
    #[must_use]
    pub fn without_fetch(mut self) -> Self {
        self.fetcher = None;
        self
    }

    /// Does not grant the file capability.
    #[must_use]
    pub fn without_files(mut self) -> Self {
        self.files = None;
        self
    }

    /// Fails invocations that run longer than `timeout`.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX).max(1);
        self.config.runtime.invocation_timeout_ms = Some(millis);
        self
    }

    /// Limits concurrent invocations.
    #[must_use]
    pub fn max_concurrent(mut self, limit: usize) -> Self {
        self.config.runtime.max_concurrent_invocations = limit;
        self
    }

    /// Lets handler panics unwind instead of failing the invocation.
    #[must_use]
    pub fn propagate_panics(mut self) -> Self {
        self.config.runtime.catch_panics = false;
        self
    }

    /// Builds the test host.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::MissingHandler`] without a handler and
    /// [`TestError::Setup`] for an invalid configuration.
    pub fn build(self) -> Result<TestHost, TestError> {
        if !self.has_handler {
            return Err(TestError::MissingHandler);
        }

        let recorders: Recorders = Arc::default();
        let mut builder = self.builder;

        if self.config.capabilities.logging {
            let recorders = recorders.clone();
            builder = builder.logger_factory(move |id| {
                let logger = Arc::new(RecordingLogger::new());
                let tracked = CALL.try_with(|slot| *slot.lock() = Some(id)).is_ok();
                if tracked {
                    recorders.lock().insert(id, logger.clone());
                }
                logger as Arc<dyn Logger>
            });
        }

        let fetcher = match self.fetcher {
            Some(fetcher) => {
                builder = builder.fetcher(fetcher.clone());
                fetcher
            }
            None => Arc::default(),
        };

        let files = match self.files {
            Some(files) => {
                builder = builder.files(files.clone());
                files
            }
            None => Arc::default(),
        };

        let host = builder.config(self.config).build()?;

        Ok(TestHost {
            host,
            recorders,
            fetcher,
            files,
        })
    }
}

/// The result of one [`TestHost`] invocation, with assertion helpers.
#[derive(Debug)]
pub struct TestOutcome {
    outcome: InvocationOutcome,
    logs: Vec<LogEntry>,
}

impl TestOutcome {
    /// The invocation ID.
    #[must_use]
    pub const fn invocation_id(&self) -> InvocationId {
        self.outcome.invocation_id
    }

    /// How long the invocation took.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.outcome.duration
    }

    /// Returns `true` if the handler produced a response.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// The response, if any.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.outcome.response()
    }

    /// The failure, if any.
    #[must_use]
    pub fn error(&self) -> Option<&JetError> {
        self.outcome.error()
    }

    /// Lines the handler logged through the log capability.
    #[must_use]
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// Returns the underlying outcome.
    #[must_use]
    pub fn into_outcome(self) -> InvocationOutcome {
        self.outcome
    }

    /// Returns the response.
    ///
    /// # Panics
    ///
    /// Panics if the invocation failed.
    #[must_use]
    pub fn unwrap_response(&self) -> &Response {
        match &self.outcome.result {
            Ok(response) => response,
            Err(e) => panic!("Expected a response, invocation failed: {e}"),
        }
    }

    /// Asserts that the handler returned exactly this response.
    ///
    /// # Panics
    ///
    /// Panics if the invocation failed or the response differs.
    pub fn assert_response(&self, status: i64, data: impl AsRef<str>) -> &Self {
        let response = self.unwrap_response();
        assert_eq!(
            (response.status(), response.data()),
            (status, data.as_ref()),
            "Response mismatch"
        );
        self
    }

    /// Asserts the response status.
    ///
    /// # Panics
    ///
    /// Panics if the invocation failed or the status differs.
    pub fn assert_status(&self, status: i64) -> &Self {
        let actual = self.unwrap_response().status();
        assert_eq!(actual, status, "Expected status {status}, got {actual}");
        self
    }

    /// Asserts that the invocation failed and returns the error.
    ///
    /// # Panics
    ///
    /// Panics if the handler produced a response.
    pub fn assert_failed(&self) -> &JetError {
        match &self.outcome.result {
            Ok(response) => panic!(
                "Expected the invocation to fail, got response {} {:?}",
                response.status(),
                response.data()
            ),
            Err(e) => e,
        }
    }

    /// Asserts that the invocation failed with an error of `category`.
    ///
    /// # Panics
    ///
    /// Panics if the handler produced a response or the category differs.
    pub fn assert_failed_with(&self, category: ErrorCategory) -> &Self {
        let error = self.assert_failed();
        assert_eq!(
            error.category(),
            category,
            "Expected a {category} failure, got: {error}"
        );
        self
    }

    /// Asserts that some log line contains `needle`.
    ///
    /// # Panics
    ///
    /// Panics if no captured line contains it.
    pub fn assert_logged(&self, needle: impl AsRef<str>) -> &Self {
        let needle = needle.as_ref();
        assert!(
            self.logs.iter().any(|entry| entry.message.contains(needle)),
            "No log line contains '{needle}', got: {:?}",
            self.logs
        );
        self
    }
}
