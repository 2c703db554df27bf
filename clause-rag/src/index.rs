//! Exact nearest-neighbour search over chunk vectors.
//!
//! The distance metric is squared Euclidean distance ([`squared_l2`]).
//! Results are ordered nearest first, ties broken by insertion position, so
//! any [`VectorIndex`] that performs exact search must return identical
//! rankings for identical input.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// One search hit: the position of the stored vector and its distance to
/// the query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Neighbor {
    /// Insertion position of the vector in the index.
    pub position: usize,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
}

/// Squared Euclidean (L2) distance between two equal-length vectors.
///
/// Callers are responsible for checking lengths; extra elements of the
/// longer slice are ignored.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// A read-only index answering nearest-neighbour queries.
///
/// Implementations are immutable after construction and may be shared
/// between concurrent readers.
pub trait VectorIndex: Send + Sync {
    /// Dimensionality of every stored vector.
    fn dimension(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    /// Whether the index holds no vectors.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return up to `top_k` stored vectors nearest to `query`, nearest first.
    ///
    /// `top_k` larger than [`len`](VectorIndex::len) is clamped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidTopK`] if `top_k` is zero and
    /// [`RagError::DimensionMismatch`] if `query` has the wrong length.
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Neighbor>>;
}

/// Brute-force exact index, the equivalent of a flat L2 index.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Build an index from vectors in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmptyIndex`] for an empty sequence and
    /// [`RagError::DimensionMismatch`] if the vectors differ in length.
    pub fn build(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = vectors.first().map(Vec::len).ok_or(RagError::EmptyIndex)?;
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(RagError::DimensionMismatch { expected: dimension, actual: bad.len() });
        }
        Ok(Self { dimension, vectors })
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Neighbor>> {
        if top_k == 0 {
            return Err(RagError::InvalidTopK);
        }
        if query.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| Neighbor { position, distance: squared_l2(vector, query) })
            .collect();

        // NaN distances sort after every real distance.
        neighbors.sort_by(|a, b| {
            a.distance
                .is_nan()
                .cmp(&b.distance.is_nan())
                .then(a.distance.total_cmp(&b.distance))
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(top_k);
        Ok(neighbors)
    }
}
