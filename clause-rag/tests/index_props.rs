//! Property tests for flat L2 index search.

use clause_rag::index::{FlatIndex, VectorIndex, squared_l2};
use clause_rag::RagError;
use proptest::prelude::*;

const DIM: usize = 16;

fn arb_vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim)
}

/// Distinct vectors, so self-retrieval has a unique answer.
fn arb_distinct_vectors() -> impl Strategy<Value = Vec<Vec<f32>>> {
    proptest::collection::vec(arb_vector(DIM), 1..20).prop_filter("distinct vectors", |vs| {
        vs.iter().enumerate().all(|(i, a)| vs[..i].iter().all(|b| squared_l2(a, b) > 1e-6))
    })
}

/// *For any* set of distinct vectors, searching the index with a stored
/// vector and `top_k = 1` SHALL return that vector's position at distance 0.
mod prop_self_retrieval {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn every_vector_finds_itself(vectors in arb_distinct_vectors()) {
            let index = FlatIndex::build(vectors.clone()).unwrap();
            for (i, vector) in vectors.iter().enumerate() {
                let hits = index.search(vector, 1).unwrap();
                prop_assert_eq!(hits.len(), 1);
                prop_assert_eq!(hits[0].position, i);
                prop_assert_eq!(hits[0].distance, 0.0);
            }
        }
    }
}

/// *For any* index and query, results SHALL be ordered by ascending distance
/// with ties in insertion order, and SHALL number `min(top_k, len)`.
mod prop_search_ordering {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ascending_and_clamped(
            vectors in proptest::collection::vec(arb_vector(DIM), 1..20),
            query in arb_vector(DIM),
            top_k in 1usize..25,
        ) {
            let index = FlatIndex::build(vectors.clone()).unwrap();
            let hits = index.search(&query, top_k).unwrap();

            prop_assert_eq!(hits.len(), top_k.min(vectors.len()));
            for window in hits.windows(2) {
                prop_assert!(
                    window[0].distance < window[1].distance
                        || (window[0].distance == window[1].distance
                            && window[0].position < window[1].position),
                    "results out of order: {:?} then {:?}",
                    window[0],
                    window[1],
                );
            }
            for hit in &hits {
                prop_assert_eq!(hit.distance, squared_l2(&vectors[hit.position], &query));
            }
        }
    }
}

#[test]
fn minilm_sized_index_rejects_shorter_query() {
    let vectors = vec![vec![0.25f32; 384]; 3];
    let index = FlatIndex::build(vectors).unwrap();
    let err = index.search(&vec![0.25f32; 300], 1).unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 384, actual: 300 }));
}
