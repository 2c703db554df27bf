//! Document loaders that turn a locator into raw text.
//!
//! - [`FileDocumentLoader`] — reads a local path (or `file://` URL)
//! - [`HttpDocumentLoader`] — GETs an `http(s)` URL (feature `http`)
//! - [`LocatorLoader`] — picks one of the above from the locator's scheme
//!
//! Every load is bounded by a timeout and truncated to a character budget.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::config::RagConfig;
use crate::document::Document;
use crate::error::{RagError, Result};

/// Loads the raw text behind a document locator.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load the document at `locator`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::FetchError`] if the document cannot be read and
    /// [`RagError::Timeout`] if loading exceeds the loader's time budget.
    async fn load(&self, locator: &str) -> Result<Document>;
}

/// Keep at most `max_chars` characters of `text`.
pub fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((byte_idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_idx);
    }
    text
}

/// Bytes to read so that `max_chars` whole characters survive decoding.
fn byte_budget(max_chars: usize) -> usize {
    max_chars.saturating_add(1).saturating_mul(4)
}

/// Decode a byte prefix, replacing invalid UTF-8, and keep `max_chars`.
fn decode_prefix(bytes: &[u8], max_chars: usize) -> String {
    truncate_chars(String::from_utf8_lossy(bytes).into_owned(), max_chars)
}

fn fetch_error(locator: &str, message: impl ToString) -> RagError {
    RagError::FetchError { locator: locator.to_string(), message: message.to_string() }
}

/// Reads documents from the local filesystem.
///
/// With a root set, every locator is resolved against it and must stay
/// inside it after symlinks are followed.
#[derive(Debug, Clone)]
pub struct FileDocumentLoader {
    timeout: Duration,
    max_chars: usize,
    root: Option<PathBuf>,
}

impl FileDocumentLoader {
    /// Create an unrestricted loader with the given time and size budget.
    pub fn new(timeout: Duration, max_chars: usize) -> Self {
        Self { timeout, max_chars, root: None }
    }

    /// Create a loader from the pipeline configuration, confined to
    /// `document_root` when one is set.
    pub fn from_config(config: &RagConfig) -> Self {
        let loader =
            Self::new(Duration::from_secs(config.fetch_timeout_secs), config.max_document_chars);
        match &config.document_root {
            Some(root) => loader.with_root(root),
            None => loader,
        }
    }

    /// Only serve files below `root`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    async fn resolve(&self, locator: &str) -> Result<PathBuf> {
        let raw = Path::new(locator.strip_prefix("file://").unwrap_or(locator));
        let Some(root) = &self.root else {
            return Ok(raw.to_path_buf());
        };

        let root = tokio::fs::canonicalize(root)
            .await
            .map_err(|e| fetch_error(locator, format!("document root unavailable: {e}")))?;
        let path =
            tokio::fs::canonicalize(root.join(raw)).await.map_err(|e| fetch_error(locator, e))?;
        if !path.starts_with(&root) {
            warn!(locator, root = %root.display(), "rejected path outside the document root");
            return Err(fetch_error(locator, "path is outside the document root"));
        }
        Ok(path)
    }

    async fn read_prefix(&self, locator: &str) -> Result<String> {
        let path = self.resolve(locator).await?;
        debug!(path = %path.display(), "reading document from file");

        let file = tokio::fs::File::open(&path).await.map_err(|e| fetch_error(locator, e))?;
        let mut bytes = Vec::new();
        file.take(byte_budget(self.max_chars) as u64)
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| fetch_error(locator, e))?;

        Ok(decode_prefix(&bytes, self.max_chars))
    }
}

#[async_trait]
impl DocumentLoader for FileDocumentLoader {
    async fn load(&self, locator: &str) -> Result<Document> {
        let text = tokio::time::timeout(self.timeout, self.read_prefix(locator)).await.map_err(
            |_| RagError::Timeout {
                locator: locator.to_string(),
                timeout_secs: self.timeout.as_secs(),
            },
        )??;

        Ok(Document::fetched(locator, text))
    }
}

/// Fetches documents over HTTP(S).
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpDocumentLoader {
    client: reqwest::Client,
    timeout: Duration,
    max_chars: usize,
}

#[cfg(feature = "http")]
impl HttpDocumentLoader {
    /// Create a loader with the given time and size budget.
    pub fn new(timeout: Duration, max_chars: usize) -> Self {
        Self { client: reqwest::Client::new(), timeout, max_chars }
    }

    /// Create a loader from the pipeline configuration.
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(Duration::from_secs(config.fetch_timeout_secs), config.max_document_chars)
    }

    fn map_request_error(&self, locator: &str, e: reqwest::Error) -> RagError {
        if e.is_timeout() {
            RagError::Timeout { locator: locator.to_string(), timeout_secs: self.timeout.as_secs() }
        } else {
            fetch_error(locator, e)
        }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl DocumentLoader for HttpDocumentLoader {
    async fn load(&self, locator: &str) -> Result<Document> {
        use futures::StreamExt;

        debug!(url = locator, timeout_secs = self.timeout.as_secs(), "fetching document");

        let response = self
            .client
            .get(locator)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.map_request_error(locator, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(locator, format!("server returned {status}")));
        }

        let budget = byte_budget(self.max_chars);
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_request_error(locator, e))?;
            body.extend_from_slice(&chunk);
            if body.len() >= budget {
                body.truncate(budget);
                break;
            }
        }

        Ok(Document::fetched(locator, decode_prefix(&body, self.max_chars)))
    }
}

/// Routes `http://` and `https://` locators to HTTP and everything else to
/// the filesystem.
///
/// Local files are only served when the configuration names a
/// `document_root`; otherwise a local locator is a fetch failure.
#[derive(Debug, Clone)]
pub struct LocatorLoader {
    file: Option<FileDocumentLoader>,
    #[cfg(feature = "http")]
    http: HttpDocumentLoader,
}

impl LocatorLoader {
    /// Create a loader from the pipeline configuration.
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            file: config.document_root.as_ref().map(|_| FileDocumentLoader::from_config(config)),
            #[cfg(feature = "http")]
            http: HttpDocumentLoader::from_config(config),
        }
    }
}

fn is_http(locator: &str) -> bool {
    let lower = locator.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait]
impl DocumentLoader for LocatorLoader {
    async fn load(&self, locator: &str) -> Result<Document> {
        let locator = locator.trim();
        if is_http(locator) {
            #[cfg(feature = "http")]
            return self.http.load(locator).await;

            #[cfg(not(feature = "http"))]
            return Err(fetch_error(locator, "HTTP loading requires the `http` feature"));
        }
        match &self.file {
            Some(file) => file.load(locator).await,
            None => Err(fetch_error(locator, "local documents are disabled")),
        }
    }
}
