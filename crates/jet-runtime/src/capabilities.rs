//! Production capabilities granted by the host.
//!
//! - [`HttpFetcher`] backs `fetch` with a shared `reqwest` client.
//! - [`LocalFileStore`] backs file access with `tokio::fs`, confined to a
//!   root directory.
//!
//! The log capability is [`jet_telemetry::TracingLogger`], created per
//! invocation by the [`Host`](crate::Host).

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use jet_config::{CapabilitiesConfig, FetchConfig, FilesConfig};
use jet_core::{BoxFuture, CapabilitiesBuilder, Fetcher, FileStore, JetError, JetResult};
use reqwest::Client;

use crate::error::{HostError, HostResult};

/// Fetches URLs over HTTP(S).
///
/// Like a browser `fetch(url).then(r => r.text())`, the body is returned
/// whatever the status code; only transport failures are errors.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::CapabilitySetup`] if the client cannot be built,
    /// for example because the user agent is not a valid header value.
    pub fn new(config: &FetchConfig) -> HostResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| HostError::capability_setup("fetch", format!("failed to create client: {e}")))?;

        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, JetResult<String>> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| JetError::capability("fetch", format!("request to {url} failed: {e}")))?;

            tracing::debug!(url, status = response.status().as_u16(), "Fetched");

            response.text().await.map_err(|e| {
                JetError::capability("fetch", format!("failed to read body of {url}: {e}"))
            })
        })
    }
}

/// File access confined to a root directory.
///
/// Handler paths are relative to the root. Absolute paths and `..`
/// components are rejected before touching the filesystem. Writes and
/// removals additionally require `allow_write`.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    allow_write: bool,
}

impl LocalFileStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, allow_write: bool) -> Self {
        Self {
            root: root.into(),
            allow_write,
        }
    }

    /// Create a store from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::CapabilitySetup`] if no root is configured.
    pub fn from_config(config: &FilesConfig) -> HostResult<Self> {
        let root = config
            .root
            .clone()
            .ok_or_else(|| HostError::capability_setup("files", "no root directory configured"))?;
        Ok(Self::new(root, config.allow_write))
    }

    /// The sandbox root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether writes and removals are allowed.
    #[must_use]
    pub const fn allow_write(&self) -> bool {
        self.allow_write
    }

    /// Maps a handler path to a path under the root.
    ///
    /// # Errors
    ///
    /// Returns [`JetError::Capability`] for empty, absolute or escaping paths.
    pub fn resolve(&self, path: &str) -> JetResult<PathBuf> {
        let relative = Path::new(path);
        let mut resolved = self.root.clone();
        let mut depth = 0_usize;

        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(JetError::capability(
                        "files",
                        format!("path escapes the sandbox: {path}"),
                    ));
                }
            }
        }

        if depth == 0 {
            return Err(JetError::capability("files", "empty path"));
        }

        Ok(resolved)
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

impl FileStore for LocalFileStore {
    fn read_to_string<'a>(&'a self, path: &'a str) -> BoxFuture<'a, JetResult<String>> {
        Box::pin(async move {
            let resolved = self.resolve(path)?;
            tokio::fs::read_to_string(&resolved)
                .await
                .map_err(|e| JetError::capability("files", format!("cannot read {path}: {e}")))
        })
    }

    fn write<'a>(&'a self, path: &'a str, contents: &'a str) -> BoxFuture<'a, JetResult<()>> {
        Box::pin(async move {
            self.ensure_writable(path)?;
            let resolved = self.resolve(path)?;

            if let Some(parent) = resolved.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    JetError::capability("files", format!("cannot create parent of {path}: {e}"))
                })?;
            }

            tokio::fs::write(&resolved, contents)
                .await
                .map_err(|e| JetError::capability("files", format!("cannot write {path}: {e}")))
        })
    }

    fn remove<'a>(&'a self, path: &'a str) -> BoxFuture<'a, JetResult<()>> {
        Box::pin(async move {
            self.ensure_writable(path)?;
            let resolved = self.resolve(path)?;
            tokio::fs::remove_file(&resolved)
                .await
                .map_err(|e| JetError::capability("files", format!("cannot remove {path}: {e}")))
        })
    }
}

/// Grants the fetch and file capabilities enabled in `config`.
///
/// Capabilities already set on `builder` are replaced.
///
/// # Errors
///
/// Returns [`HostError::CapabilitySetup`] if an enabled capability cannot be
/// constructed.
pub fn grant_configured(
    builder: CapabilitiesBuilder,
    config: &CapabilitiesConfig,
) -> HostResult<CapabilitiesBuilder> {
    let mut builder = builder;

    if config.fetch.enabled {
        builder = builder.fetcher(Arc::new(HttpFetcher::new(&config.fetch)?));
    }

    if config.files.enabled {
        builder = builder.files(Arc::new(LocalFileStore::from_config(&config.files)?));
    }

    Ok(builder)
}
