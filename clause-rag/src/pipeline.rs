//! Retrieval pipeline orchestrator.
//!
//! The [`RetrievalPipeline`] runs one document-processing request end to
//! end: load → chunk → embed (one batch) → build index → per question embed
//! and search. Document, chunks and index live only for the duration of the
//! call; the embedding provider and loader are long-lived and shared.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use clause_rag::{HashingEmbeddingProvider, LocatorLoader, RagConfig, RetrievalPipeline};
//!
//! let config = RagConfig::default();
//! let pipeline = RetrievalPipeline::builder()
//!     .loader(Arc::new(LocatorLoader::from_config(&config)))
//!     .embedding_provider(Arc::new(HashingEmbeddingProvider::default()))
//!     .config(config)
//!     .build()?;
//!
//! let response = pipeline.run("https://example.com/policy.txt", &questions).await?;
//! assert_eq!(response.results.len(), questions.len());
//! ```

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{error, info, warn};

use crate::config::RagConfig;
use crate::document::{
    Chunk, ContentOrigin, Document, RetrievalCondition, RetrievalResponse, RetrievalResult,
    ScoredChunk,
};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::{FlatIndex, VectorIndex};
use crate::loader::DocumentLoader;

/// The retrieval pipeline orchestrator.
///
/// Construct one via [`RetrievalPipeline::builder()`].
pub struct RetrievalPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    loader: Arc<dyn DocumentLoader>,
}

impl RetrievalPipeline {
    /// Create a new [`RetrievalPipelineBuilder`].
    pub fn builder() -> RetrievalPipelineBuilder {
        RetrievalPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Retrieve with the configured `chunk_size` and `top_k`.
    ///
    /// # Errors
    ///
    /// See [`retrieve`](Self::retrieve).
    pub async fn run<S: AsRef<str>>(
        &self,
        locator: &str,
        questions: &[S],
    ) -> Result<RetrievalResponse> {
        self.retrieve(locator, questions, self.config.chunk_size, self.config.top_k).await
    }

    /// Answer every question with its `top_k` nearest chunks of the
    /// document at `locator`.
    ///
    /// Returns exactly one [`RetrievalResult`] per question, in question
    /// order. A document that cannot be loaded is replaced by the configured
    /// fallback text and every result is tagged
    /// [`ContentOrigin::Fallback`]. A document without text yields
    /// [`RetrievalCondition::NoContent`] results.
    ///
    /// The configured `chunk_overlap` is clamped to `chunk_size - 1`, so any
    /// positive `chunk_size` is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidChunkSize`] or [`RagError::InvalidTopK`]
    /// for zero parameters, [`RagError::EmbeddingUnavailable`] if the
    /// provider fails, and [`RagError::DimensionMismatch`] or
    /// [`RagError::EmbeddingCountMismatch`] if the provider's output does
    /// not fit together.
    pub async fn retrieve<S: AsRef<str>>(
        &self,
        locator: &str,
        questions: &[S],
        chunk_size: usize,
        top_k: usize,
    ) -> Result<RetrievalResponse> {
        if top_k == 0 {
            return Err(RagError::InvalidTopK);
        }
        let overlap = self.config.chunk_overlap.min(chunk_size.saturating_sub(1));
        let chunker = self.config.chunking.chunker(chunk_size, overlap)?;

        // 1. Load, substituting tagged fallback content on failure
        let document = self.load_document(locator).await;
        let origin = document.origin.clone();

        // 2. Chunk
        let chunks = chunker.chunk(&document.text);
        if chunks.is_empty() {
            info!(locator, question_count = questions.len(), "document has no content");
            let results = questions
                .iter()
                .map(|q| RetrievalResult::no_content(q.as_ref(), origin.clone()))
                .collect();
            return Ok(RetrievalResponse {
                locator: locator.to_string(),
                origin,
                chunk_count: 0,
                results,
            });
        }

        // 3. Embed every chunk in one batch
        let index = self.index_chunks(&chunks).await?;

        // 4. Search per question against the shared, read-only index
        let results = try_join_all(questions.iter().map(|question| {
            self.search_question(question.as_ref(), &index, &chunks, top_k, &origin)
        }))
        .await?;

        info!(
            locator,
            chunk_count = chunks.len(),
            question_count = results.len(),
            fallback = origin.is_fallback(),
            "retrieval completed"
        );

        Ok(RetrievalResponse {
            locator: locator.to_string(),
            origin,
            chunk_count: chunks.len(),
            results,
        })
    }

    async fn load_document(&self, locator: &str) -> Document {
        match self.loader.load(locator).await {
            Ok(document) => document,
            Err(e) => {
                warn!(locator, error = %e, "document fetch failed, using fallback text");
                Document::fallback(locator, self.config.fallback_text.clone(), e.to_string())
            }
        }
    }

    async fn index_chunks(&self, chunks: &[Chunk]) -> Result<FlatIndex> {
        let provider = self.embedding_provider.name();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

        let vectors = self
            .embedding_provider
            .embed(&texts)
            .await
            .inspect_err(|e| error!(provider, error = %e, "embedding failed during indexing"))?;
        if vectors.len() != chunks.len() {
            error!(provider, expected = chunks.len(), actual = vectors.len(), "embedding count mismatch");
            return Err(RagError::EmbeddingCountMismatch {
                provider: provider.to_string(),
                expected: chunks.len(),
                actual: vectors.len(),
            });
        }

        let index = FlatIndex::build(vectors)?;
        let expected = self.embedding_provider.dimension();
        if index.dimension() != expected {
            error!(provider, expected, actual = index.dimension(), "provider dimension mismatch");
            return Err(RagError::DimensionMismatch { expected, actual: index.dimension() });
        }
        Ok(index)
    }

    async fn search_question(
        &self,
        question: &str,
        index: &dyn VectorIndex,
        chunks: &[Chunk],
        top_k: usize,
        origin: &ContentOrigin,
    ) -> Result<RetrievalResult> {
        let query = self
            .embedding_provider
            .embed_one(question)
            .await
            .inspect_err(|e| error!(error = %e, "embedding failed during query"))?;

        let matches = index
            .search(&query, top_k)?
            .into_iter()
            .map(|hit| ScoredChunk { chunk: chunks[hit.position].clone(), distance: hit.distance })
            .collect();

        Ok(RetrievalResult {
            question: question.to_string(),
            matches,
            condition: RetrievalCondition::Matched,
            origin: origin.clone(),
        })
    }
}

/// Builder for constructing a [`RetrievalPipeline`].
///
/// The embedding provider and loader are required; the configuration
/// defaults to [`RagConfig::default()`].
#[derive(Default)]
pub struct RetrievalPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    loader: Option<Arc<dyn DocumentLoader>>,
}

impl RetrievalPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the document loader.
    pub fn loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Build the [`RetrievalPipeline`], validating the configuration and
    /// that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if a required field is missing, or
    /// any error from [`RagConfig::validate`].
    pub fn build(self) -> Result<RetrievalPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let loader =
            self.loader.ok_or_else(|| RagError::ConfigError("loader is required".to_string()))?;

        Ok(RetrievalPipeline { config, embedding_provider, loader })
    }
}
