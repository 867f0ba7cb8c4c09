//! Host capabilities available to handlers during an invocation.
//!
//! A host grants a handler a small, explicit set of side effects:
//!
//! - [`Logger`] - write log lines attributed to the invocation
//! - [`Fetcher`] - fetch a URL as text
//! - [`FileStore`] - read, write and remove files
//! - typed services, registered by the host and resolved by type
//!
//! The set is bundled in [`Capabilities`] and installed for the duration of
//! one invocation. Handlers look it up with [`Capabilities::current`]; the
//! lookup fails outside an invocation, so nothing can reach host services
//! before the handler has started.
//!
//! # Example
//!
//! ```rust
//! use jet_core::{Capabilities, LogLevel, Logger};
//! use std::sync::Arc;
//!
//! struct StdoutLogger;
//!
//! impl Logger for StdoutLogger {
//!     fn log(&self, level: LogLevel, message: &str) {
//!         println!("[{level}] {message}");
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let capabilities = Capabilities::builder()
//!     .logger(Arc::new(StdoutLogger))
//!     .build();
//!
//! assert!(Capabilities::current().is_err());
//!
//! capabilities
//!     .scope(async {
//!         let caps = Capabilities::current().unwrap();
//!         caps.log(LogLevel::Info, "inside the invocation").unwrap();
//!     })
//!     .await;
//! # });
//! ```

use crate::handler::BoxFuture;
use crate::{JetError, JetResult};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

tokio::task_local! {
    static CURRENT: Capabilities;
}

/// Severity of a handler log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    /// Very verbose diagnostics.
    Trace,
    /// Diagnostics.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected that did not fail the invocation.
    Warn,
    /// A failure.
    Error,
}

impl LogLevel {
    /// Returns the lowercase level name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log sink for handler output.
pub trait Logger: Send + Sync + 'static {
    /// Records one log line.
    fn log(&self, level: LogLevel, message: &str);
}

/// Network fetch primitive.
pub trait Fetcher: Send + Sync + 'static {
    /// Fetches `url` and returns the response body as text.
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, JetResult<String>>;
}

/// File access primitive.
///
/// Paths are interpreted by the implementation; hosts typically confine
/// them to a sandbox directory.
pub trait FileStore: Send + Sync + 'static {
    /// Reads a whole file as UTF-8 text.
    fn read_to_string<'a>(&'a self, path: &'a str) -> BoxFuture<'a, JetResult<String>>;

    /// Creates or replaces a file.
    fn write<'a>(&'a self, path: &'a str, contents: &'a str) -> BoxFuture<'a, JetResult<()>>;

    /// Removes a file.
    fn remove<'a>(&'a self, path: &'a str) -> BoxFuture<'a, JetResult<()>>;
}

/// Typed services keyed by their type.
#[derive(Default)]
struct Services {
    entries: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    fn insert<T: Send + Sync + 'static>(&mut self, service: Arc<T>) {
        self.entries.insert(TypeId::of::<T>(), service);
    }

    fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|s| s.clone().downcast::<T>().ok())
    }
}

/// The capability namespace for one invocation.
///
/// Cloning is cheap; every capability sits behind an `Arc`. A capability the
/// host did not grant reports [`JetError::Capability`] when used.
#[derive(Clone, Default)]
pub struct Capabilities {
    logger: Option<Arc<dyn Logger>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    files: Option<Arc<dyn FileStore>>,
    services: Arc<Services>,
}

impl Capabilities {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> CapabilitiesBuilder {
        CapabilitiesBuilder::default()
    }

    /// An empty namespace: every capability is unavailable.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns the capabilities of the invocation currently executing.
    ///
    /// Only spawned work that is itself wrapped in [`Capabilities::scope`]
    /// sees them; a handler that spawns tasks should clone the value and
    /// pass it along.
    ///
    /// # Errors
    ///
    /// Returns [`JetError::Capability`] when called outside an invocation.
    pub fn current() -> JetResult<Self> {
        CURRENT
            .try_with(Clone::clone)
            .map_err(|_| JetError::capability_unavailable("capabilities"))
    }

    /// Runs `future` with these capabilities installed as
    /// [`Capabilities::current`].
    pub async fn scope<F: Future>(self, future: F) -> F::Output {
        CURRENT.scope(self, future).await
    }

    /// Returns a copy with `logger` granted, sharing every other capability.
    ///
    /// Hosts use this to attach a logger bound to one invocation.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns a copy with the log capability revoked.
    #[must_use]
    pub fn without_logger(mut self) -> Self {
        self.logger = None;
        self
    }

    /// Returns the logger.
    pub fn logger(&self) -> JetResult<&Arc<dyn Logger>> {
        self.logger
            .as_ref()
            .ok_or_else(|| JetError::capability_unavailable("log"))
    }

    /// Writes a log line through the logger.
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) -> JetResult<()> {
        self.logger()?.log(level, message.as_ref());
        Ok(())
    }

    /// Returns the fetcher.
    pub fn fetcher(&self) -> JetResult<&Arc<dyn Fetcher>> {
        self.fetcher
            .as_ref()
            .ok_or_else(|| JetError::capability_unavailable("fetch"))
    }

    /// Fetches `url` as text.
    pub async fn fetch(&self, url: &str) -> JetResult<String> {
        self.fetcher()?.fetch(url).await
    }

    /// Returns the file store.
    pub fn files(&self) -> JetResult<&Arc<dyn FileStore>> {
        self.files
            .as_ref()
            .ok_or_else(|| JetError::capability_unavailable("files"))
    }

    /// Resolves a host-registered service by type.
    pub fn service<T: Send + Sync + 'static>(&self) -> JetResult<Arc<T>> {
        self.services.get::<T>().ok_or_else(|| {
            JetError::capability(std::any::type_name::<T>(), "service not registered")
        })
    }

    /// Returns `true` if a service of type `T` is registered.
    #[must_use]
    pub fn has_service<T: Send + Sync + 'static>(&self) -> bool {
        self.services.entries.contains_key(&TypeId::of::<T>())
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("log", &self.logger.is_some())
            .field("fetch", &self.fetcher.is_some())
            .field("files", &self.files.is_some())
            .field("service_count", &self.services.entries.len())
            .finish()
    }
}

/// Builder for [`Capabilities`].
#[derive(Default)]
pub struct CapabilitiesBuilder {
    logger: Option<Arc<dyn Logger>>,
    fetcher: Option<Arc<dyn Fetcher>>,
    files: Option<Arc<dyn FileStore>>,
    services: Services,
}

impl CapabilitiesBuilder {
    /// Grants the log capability.
    #[must_use]
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Grants the fetch capability.
    #[must_use]
    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Grants the file capability.
    #[must_use]
    pub fn files(mut self, files: Arc<dyn FileStore>) -> Self {
        self.files = Some(files);
        self
    }

    /// Registers a typed service, replacing any previous one of the same type.
    #[must_use]
    pub fn service<T: Send + Sync + 'static>(mut self, service: Arc<T>) -> Self {
        self.services.insert(service);
        self
    }

    /// Builds the capability namespace.
    #[must_use]
    pub fn build(self) -> Capabilities {
        Capabilities {
            logger: self.logger,
            fetcher: self.fetcher,
            files: self.files,
            services: Arc::new(self.services),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCategory;
    use std::sync::Mutex;

    #[derive(Default)]
    struct VecLogger(Mutex<Vec<(LogLevel, String)>>);

    impl Logger for VecLogger {
        fn log(&self, level: LogLevel, message: &str) {
            self.0.lock().unwrap().push((level, message.to_string()));
        }
    }

    struct EchoFetcher;

    impl Fetcher for EchoFetcher {
        fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, JetResult<String>> {
            Box::pin(async move { Ok(format!("body of {url}")) })
        }
    }

    #[derive(Debug)]
    struct Database {
        url: String,
    }

    #[test]
    fn test_none_has_nothing() {
        let caps = Capabilities::none();
        assert_eq!(
            caps.log(LogLevel::Info, "x").unwrap_err().category(),
            ErrorCategory::Capability
        );
        assert!(caps.fetcher().is_err());
        assert!(caps.files().is_err());
        assert!(caps.service::<Database>().is_err());
    }

    #[test]
    fn test_logger() {
        let logger = Arc::new(VecLogger::default());
        let caps = Capabilities::builder().logger(logger.clone()).build();

        caps.log(LogLevel::Warn, "careful").unwrap();

        let lines = logger.0.lock().unwrap();
        assert_eq!(lines.as_slice(), &[(LogLevel::Warn, "careful".to_string())]);
    }

    #[tokio::test]
    async fn test_fetch() {
        let caps = Capabilities::builder().fetcher(Arc::new(EchoFetcher)).build();
        let body = caps.fetch("https://example.com").await.unwrap();
        assert_eq!(body, "body of https://example.com");
    }

    #[tokio::test]
    async fn test_fetch_unavailable() {
        let err = Capabilities::none().fetch("https://example.com").await.unwrap_err();
        assert!(err.to_string().contains("fetch"));
    }

    #[test]
    fn test_service_resolution() {
        let caps = Capabilities::builder()
            .service(Arc::new(Database {
                url: "postgres://localhost/db".to_string(),
            }))
            .build();

        assert!(caps.has_service::<Database>());
        assert_eq!(caps.service::<Database>().unwrap().url, "postgres://localhost/db");
    }

    #[test]
    fn test_missing_service_names_type() {
        let err = Capabilities::none().service::<Database>().unwrap_err();
        assert!(err.to_string().contains("Database"));
        assert!(err.to_string().contains("not registered"));
    }

    #[tokio::test]
    async fn test_current_outside_scope() {
        let err = Capabilities::current().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Capability);
    }

    #[tokio::test]
    async fn test_current_inside_scope_across_suspension() {
        let caps = Capabilities::builder().fetcher(Arc::new(EchoFetcher)).build();

        let body = caps
            .scope(async {
                tokio::task::yield_now().await;
                Capabilities::current()?.fetch("u").await
            })
            .await
            .unwrap();

        assert_eq!(body, "body of u");
        assert!(Capabilities::current().is_err());
    }

    #[test]
    fn test_with_logger_keeps_other_capabilities() {
        let base = Capabilities::builder()
            .fetcher(Arc::new(EchoFetcher))
            .service(Arc::new(Database {
                url: "sqlite::memory:".to_string(),
            }))
            .build();

        let logger = Arc::new(VecLogger::default());
        let caps = base.clone().with_logger(logger.clone());

        caps.log(LogLevel::Debug, "bound").unwrap();
        assert!(caps.fetcher().is_ok());
        assert!(caps.has_service::<Database>());
        assert!(base.logger().is_err());
        assert!(caps.without_logger().logger().is_err());
        assert_eq!(logger.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_debug() {
        let caps = Capabilities::builder().fetcher(Arc::new(EchoFetcher)).build();
        let debug = format!("{caps:?}");
        assert!(debug.contains("fetch: true"));
        assert!(debug.contains("log: false"));
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Error.to_string(), "error");
        assert!(LogLevel::Trace < LogLevel::Error);
    }
}
