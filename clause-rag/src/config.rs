//! Configuration for the retrieval pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::chunking::ChunkingStrategy;
use crate::error::{RagError, Result};

/// Text used in place of a document that could not be fetched.
pub const DEFAULT_FALLBACK_TEXT: &str =
    "Sample fallback policy text. Cataract surgery has a 2-year waiting period.";

/// Configuration parameters for the retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive fixed-size chunks.
    pub chunk_overlap: usize,
    /// How documents are split into chunks.
    pub chunking: ChunkingStrategy,
    /// Number of nearest chunks returned per question.
    pub top_k: usize,
    /// Upper bound on a single document fetch, in seconds.
    pub fetch_timeout_secs: u64,
    /// Fetched text is truncated to this many characters.
    pub max_document_chars: usize,
    /// Placeholder text indexed when the document cannot be fetched.
    pub fallback_text: String,
    /// Directory local-file locators must resolve into. `None` disables
    /// local files in [`LocatorLoader`](crate::loader::LocatorLoader).
    pub document_root: Option<PathBuf>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            chunk_overlap: 0,
            chunking: ChunkingStrategy::Fixed,
            top_k: 1,
            fetch_timeout_secs: 10,
            max_document_chars: 5000,
            fallback_text: DEFAULT_FALLBACK_TEXT.to_string(),
            document_root: None,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidChunkSize`] if `chunk_size == 0`,
    /// [`RagError::InvalidTopK`] if `top_k == 0`, and
    /// [`RagError::ConfigError`] if `chunk_overlap >= chunk_size`,
    /// `fetch_timeout_secs == 0` or `max_document_chars == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::InvalidChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::InvalidTopK);
        }
        if self.fetch_timeout_secs == 0 {
            return Err(RagError::ConfigError(
                "fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_document_chars == 0 {
            return Err(RagError::ConfigError(
                "max_document_chars must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the chunking strategy.
    pub fn chunking(mut self, strategy: ChunkingStrategy) -> Self {
        self.config.chunking = strategy;
        self
    }

    /// Set the number of nearest chunks returned per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the document fetch timeout in seconds.
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    /// Set the maximum number of document characters kept after fetching.
    pub fn max_document_chars(mut self, chars: usize) -> Self {
        self.config.max_document_chars = chars;
        self
    }

    /// Set the placeholder text used when a fetch fails.
    pub fn fallback_text(mut self, text: impl Into<String>) -> Self {
        self.config.fallback_text = text.into();
        self
    }

    /// Allow local-file locators below `root`.
    pub fn document_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.document_root = Some(root.into());
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
