//! Error types for the `clause-rag` crate.

use thiserror::Error;

/// Errors that can occur in retrieval operations.
///
/// Fetch failures ([`RagError::FetchError`], [`RagError::Timeout`]) are
/// absorbed by the pipeline into tagged fallback content. Everything else
/// aborts the request it occurred in.
#[derive(Debug, Error)]
pub enum RagError {
    /// The document could not be retrieved from its locator.
    #[error("Fetch error ({locator}): {message}")]
    FetchError {
        /// The locator that failed to load.
        locator: String,
        /// A description of the failure.
        message: String,
    },

    /// The document fetch did not complete within the configured timeout.
    #[error("Fetch timed out after {timeout_secs}s ({locator})")]
    Timeout {
        /// The locator that timed out.
        locator: String,
        /// The timeout that elapsed.
        timeout_secs: u64,
    },

    /// The embedding model or service could not be reached or loaded.
    #[error("Embedding unavailable ({provider}): {message}")]
    EmbeddingUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Vectors of different lengths were used together.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimensionality fixed by the index or provider.
        expected: usize,
        /// The offending vector's length.
        actual: usize,
    },

    /// An index was built from zero vectors.
    #[error("Cannot build an index from an empty set of vectors")]
    EmptyIndex,

    /// A chunk size of zero was requested.
    #[error("Chunk size must be greater than zero")]
    InvalidChunkSize,

    /// A `top_k` of zero was requested.
    #[error("top_k must be greater than zero")]
    InvalidTopK,

    /// The provider returned a different number of vectors than texts sent.
    #[error("Embedding count mismatch ({provider}): sent {expected} texts, got {actual} vectors")]
    EmbeddingCountMismatch {
        /// The embedding provider that produced the batch.
        provider: String,
        /// Number of texts sent.
        expected: usize,
        /// Number of vectors received.
        actual: usize,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The decision engine failed to produce an answer.
    #[error("Decision error ({engine}): {message}")]
    DecisionError {
        /// The decision engine that produced the error.
        engine: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    /// Whether this error is a recoverable document-acquisition failure.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::FetchError { .. } | Self::Timeout { .. })
    }

    /// Whether this error stems from a bad request parameter rather than
    /// from the system's configuration or its collaborators.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidChunkSize | Self::InvalidTopK)
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
