//! Local lexical embedding provider based on feature hashing.
//!
//! [`HashingEmbeddingProvider`] needs no model files or network access. Each
//! lowercase alphanumeric token is hashed into one of `dimension` buckets and
//! the resulting bag-of-words vector is L2-normalised, so texts sharing
//! vocabulary land close together under squared Euclidean distance.
//!
//! Texts with no words in common are all equally far apart, so this is a
//! deterministic stand-in for tests and offline runs, not a semantic model.

use async_trait::async_trait;
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Same dimensionality as `all-MiniLM-L6-v2`.
pub const DEFAULT_DIMENSION: usize = 384;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a, stable across platforms and compiler versions.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME))
}

/// Lowercased alphanumeric runs of `text`.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).map(str::to_lowercase)
}

/// A deterministic [`EmbeddingProvider`] using the hashing trick.
///
/// # Example
///
/// ```rust
/// use clause_rag::{EmbeddingProvider, HashingEmbeddingProvider};
///
/// # tokio_test_block_on(async {
/// let provider = HashingEmbeddingProvider::default();
/// let a = provider.embed_one("waiting period").await.unwrap();
/// let b = provider.embed_one("Waiting  period!").await.unwrap();
/// assert_eq!(a, b);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimension: usize,
}

impl HashingEmbeddingProvider {
    /// Create a provider producing vectors of `dimension` elements.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `dimension` is zero.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(RagError::ConfigError("embedding dimension must be greater than zero".into()));
        }
        Ok(Self { dimension })
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokenize(text) {
            let hash = fnv1a(token.as_bytes());
            // The dimension fits in u64 on every supported target.
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self { dimension: DEFAULT_DIMENSION }
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        debug!(provider = "hashing", batch_size = texts.len(), "embedding batch");
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_same_vector() {
        let provider = HashingEmbeddingProvider::default();
        let first = provider.embed_one("Cataract surgery has a 2-year waiting period.").await.unwrap();
        let second = provider.embed_one("Cataract surgery has a 2-year waiting period.").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), DEFAULT_DIMENSION);
    }

    #[tokio::test]
    async fn vectors_are_unit_length() {
        let provider = HashingEmbeddingProvider::new(64).unwrap();
        let vector = provider.embed_one("maternity benefits are excluded").await.unwrap();
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn text_without_tokens_embeds_to_zero() {
        let provider = HashingEmbeddingProvider::new(8).unwrap();
        let vector = provider.embed_one(" ... ").await.unwrap();
        assert!(vector.iter().all(|x| *x == 0.0));
    }

    #[tokio::test]
    async fn empty_batch_is_not_an_error() {
        let provider = HashingEmbeddingProvider::default();
        assert!(provider.embed(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn zero_dimension_is_rejected() {
        assert!(matches!(HashingEmbeddingProvider::new(0), Err(RagError::ConfigError(_))));
    }

    #[test]
    fn fnv1a_matches_reference_vector() {
        assert_eq!(fnv1a(b""), FNV_OFFSET_BASIS);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }
}
