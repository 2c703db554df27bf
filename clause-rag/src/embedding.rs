//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::{RagError, Result};

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. A provider is constructed once, passed to the pipeline as an
/// `Arc<dyn EmbeddingProvider>` and shared across requests, so it must be
/// `Send + Sync`.
///
/// For a fixed configuration the same text must always map to the same
/// vector, and every vector must have [`dimension`](EmbeddingProvider::dimension)
/// elements.
///
/// # Example
///
/// ```rust,ignore
/// use clause_rag::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let embedding = provider.embed_one("hello world").await?;
/// assert_eq!(embedding.len(), provider.dimension());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding vectors for a batch of texts, preserving order.
    ///
    /// An empty input yields an empty output, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingUnavailable`] if the backing model or
    /// service cannot be reached or loaded.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding vector for a single text, typically a query.
    ///
    /// The default implementation sends a batch of one.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed(&[text]).await?.into_iter().next().ok_or_else(|| {
            RagError::EmbeddingCountMismatch {
                provider: self.name().to_string(),
                expected: 1,
                actual: 0,
            }
        })
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimension(&self) -> usize;

    /// Short provider name used in logs and errors.
    fn name(&self) -> &str;
}
