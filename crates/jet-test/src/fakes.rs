//! In-memory capabilities for tests.
//!
//! Each fake records what the handler did with it so tests can assert on
//! side effects without a network or a filesystem.

use std::collections::BTreeMap;
use std::fmt;

use jet_core::{BoxFuture, Fetcher, FileStore, JetError, JetResult, LogLevel, Logger};
use parking_lot::Mutex;

/// One captured log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
}

impl LogEntry {
    /// Creates an entry.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// A logger that keeps every line in memory.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingLogger {
    /// Creates an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the captured lines, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Returns just the messages.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.entries.lock().iter().map(|e| e.message.clone()).collect()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.entries.lock().push(LogEntry::new(level, message));
    }
}

/// A fetcher answering from a fixed URL → body table.
///
/// Unknown URLs fail with a capability error, like an unreachable host.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    responses: Mutex<BTreeMap<String, String>>,
    requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    /// Creates a fetcher that knows no URLs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a response, builder style.
    #[must_use]
    pub fn with(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.insert(url, body);
        self
    }

    /// Adds or replaces a response.
    pub fn insert(&self, url: impl Into<String>, body: impl Into<String>) {
        self.responses.lock().insert(url.into(), body.into());
    }

    /// URLs requested so far, in order, including unknown ones.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

impl Fetcher for StaticFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, JetResult<String>> {
        Box::pin(async move {
            self.requested.lock().push(url.to_string());
            self.responses.lock().get(url).cloned().ok_or_else(|| {
                JetError::capability("fetch", format!("no response registered for {url}"))
            })
        })
    }
}

/// A file store backed by a map from path to contents.
#[derive(Debug)]
pub struct MemoryFileStore {
    files: Mutex<BTreeMap<String, String>>,
    allow_write: bool,
}

impl Default for MemoryFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileStore {
    /// Creates an empty, writable store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            allow_write: true,
        }
    }

    /// Creates a store that rejects writes and removals.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            allow_write: false,
            ..Self::new()
        }
    }

    /// Adds a file, builder style.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert(path, contents);
        self
    }

    /// Adds or replaces a file, bypassing the write permission.
    pub fn insert(&self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.lock().insert(path.into(), contents.into());
    }

    /// Returns the contents of a file.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<String> {
        self.files.lock().get(path).cloned()
    }

    /// Returns every stored path, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.files.lock().keys().cloned().collect()
    }

    fn ensure_writable(&self, path: &str) -> JetResult<()> {
        if self.allow_write {
            Ok(())
        } else {
            Err(JetError::capability(
                "files",
                format!("write access not granted: {path}"),
            ))
        }
    }
}

impl FileStore for MemoryFileStore {
    fn read_to_string<'a>(&'a self, path: &'a str) -> BoxFuture<'a, JetResult<String>> {
        Box::pin(async move {
            self.get(path)
                .ok_or_else(|| JetError::capability("files", format!("no such file: {path}")))
        })
    }

    fn write<'a>(&'a self, path: &'a str, contents: &'a str) -> BoxFuture<'a, JetResult<()>> {
        Box::pin(async move {
            self.ensure_writable(path)?;
            self.insert(path, contents);
            Ok(())
        })
    }

    fn remove<'a>(&'a self, path: &'a str) -> BoxFuture<'a, JetResult<()>> {
        Box::pin(async move {
            self.ensure_writable(path)?;
            self.files
                .lock()
                .remove(path)
                .map(drop)
                .ok_or_else(|| JetError::capability("files", format!("no such file: {path}")))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jet_core::ErrorCategory;

    #[test]
    fn test_recording_logger() {
        let logger = RecordingLogger::new();
        logger.log(LogLevel::Info, "first");
        logger.log(LogLevel::Error, "second");

        assert_eq!(
            logger.entries(),
            vec![
                LogEntry::new(LogLevel::Info, "first"),
                LogEntry::new(LogLevel::Error, "second"),
            ]
        );
        assert_eq!(logger.messages(), vec!["first", "second"]);
        assert_eq!(logger.entries()[1].to_string(), "[error] second");
    }

    #[tokio::test]
    async fn test_static_fetcher() {
        let fetcher = StaticFetcher::new().with("https://example.com/a", "alpha");

        assert_eq!(fetcher.fetch("https://example.com/a").await.unwrap(), "alpha");

        let err = fetcher.fetch("https://example.com/b").await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Capability);
        assert!(err.to_string().contains("https://example.com/b"));

        assert_eq!(
            fetcher.requested(),
            vec!["https://example.com/a", "https://example.com/b"]
        );
    }

    #[tokio::test]
    async fn test_memory_file_store() {
        let files = MemoryFileStore::new().with_file("a.txt", "A");

        assert_eq!(files.read_to_string("a.txt").await.unwrap(), "A");
        files.write("b.txt", "B").await.unwrap();
        assert_eq!(files.paths(), vec!["a.txt", "b.txt"]);

        files.remove("a.txt").await.unwrap();
        assert!(files.read_to_string("a.txt").await.is_err());
        assert!(files.remove("a.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_file_store_read_only() {
        let files = MemoryFileStore::read_only().with_file("a.txt", "A");

        assert_eq!(files.read_to_string("a.txt").await.unwrap(), "A");
        assert!(files.write("a.txt", "changed").await.is_err());
        assert!(files.remove("a.txt").await.is_err());
        assert_eq!(files.get("a.txt").as_deref(), Some("A"));
    }
}
