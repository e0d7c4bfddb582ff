//! Top-k nearest-neighbor retrieval between feature collections.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::types::{FeatureMatrix, ItemId};

/// One retrieved neighbor: the reference item and its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: ItemId,
    pub score: f32,
}

/// For each query row, the k highest-scoring reference rows.
///
/// Scores are plain dot products; callers must normalize both matrices
/// consistently if they want cosine similarity. Results are sorted by
/// descending score with ties broken by ascending reference index, and
/// `k` is clamped to the reference size.
pub fn top_k(query: &Array2<f32>, reference: &Array2<f32>, k: usize) -> Vec<Vec<(usize, f32)>> {
    assert_eq!(
        query.ncols(),
        reference.ncols(),
        "query and reference dimensionality differ"
    );

    let k = k.min(reference.nrows());
    let scores = query.dot(&reference.t());

    scores
        .outer_iter()
        .map(|row| {
            let mut pairs: Vec<(usize, f32)> = row.iter().copied().enumerate().collect();
            pairs.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.0.cmp(&b.0))
            });
            pairs.truncate(k);
            pairs
        })
        .collect()
}

/// Top-k neighbors of every query item within a reference collection,
/// resolved to item identities.
pub fn nearest_neighbors(
    query: &FeatureMatrix,
    reference: &FeatureMatrix,
    k: usize,
) -> Vec<Vec<Neighbor>> {
    top_k(&query.features, &reference.features, k)
        .into_iter()
        .map(|pairs| {
            pairs
                .into_iter()
                .map(|(index, score)| Neighbor {
                    id: reference.id(index).clone(),
                    score,
                })
                .collect()
        })
        .collect()
}
