//! Local semantic embeddings with `fastembed` (ONNX inference).
//!
//! This module is only available when the `fastembed` feature is enabled.
//! The model is downloaded on first use and cached by `fastembed`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, error, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Output dimensionality of `all-MiniLM-L6-v2`.
pub const MINILM_DIMENSION: usize = 384;

const PROVIDER: &str = "fastembed";

fn unavailable(message: String) -> RagError {
    RagError::EmbeddingUnavailable { provider: PROVIDER.into(), message }
}

/// An [`EmbeddingProvider`] running a sentence-transformer model locally.
///
/// Inference is CPU-bound and runs on the blocking thread pool; the model
/// is shared behind a mutex.
///
/// # Example
///
/// ```rust,ignore
/// use clause_rag::fastembed::FastEmbedProvider;
///
/// let provider = FastEmbedProvider::new()?;
/// let embedding = provider.embed_one("waiting period for cataract surgery").await?;
/// assert_eq!(embedding.len(), 384);
/// ```
#[derive(Clone)]
pub struct FastEmbedProvider {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Load `all-MiniLM-L6-v2`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingUnavailable`] if the model cannot be
    /// downloaded or initialised.
    pub fn new() -> Result<Self> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2, MINILM_DIMENSION)
    }

    /// Load `model`, whose vectors have `dimension` elements.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for a zero dimension and
    /// [`RagError::EmbeddingUnavailable`] if the model cannot be initialised.
    pub fn with_model(model: EmbeddingModel, dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RagError::ConfigError("embedding dimension must be greater than zero".into()));
        }
        let model_name = format!("{model:?}");

        let embedding = TextEmbedding::try_new(InitOptions::new(model)).map_err(|e| {
            error!(provider = PROVIDER, model = %model_name, error = %e, "model initialisation failed");
            unavailable(format!("failed to initialise {model_name}: {e}"))
        })?;
        info!(provider = PROVIDER, model = %model_name, dimension, "embedding model loaded");

        Ok(Self { model: Arc::new(Mutex::new(embedding)), model_name, dimension })
    }

    /// The `fastembed` model identifier.
    pub fn model(&self) -> &str {
        &self.model_name
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(provider = PROVIDER, model = %self.model_name, batch_size = texts.len(), "embedding batch");

        let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
        let model = Arc::clone(&self.model);
        let vectors = tokio::task::spawn_blocking(move || {
            let mut model =
                model.lock().map_err(|_| "embedding model lock poisoned".to_string())?;
            model.embed(owned, None).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| unavailable(format!("embedding task failed: {e}")))?
        .map_err(|message| {
            error!(provider = PROVIDER, error = %message, "inference failed");
            unavailable(message)
        })?;

        if vectors.len() != texts.len() {
            return Err(RagError::EmbeddingCountMismatch {
                provider: PROVIDER.into(),
                expected: texts.len(),
                actual: vectors.len(),
            });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(RagError::DimensionMismatch { expected: self.dimension, actual: bad.len() });
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}
