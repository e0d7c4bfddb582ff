//! Near-duplicate detection over feature matrices.
//!
//! Similarity is computed in row batches so peak memory is a
//! (batch_size × N) block instead of the full N × N matrix. The
//! elimination is a single greedy pass: within every near-duplicate
//! cluster the lowest-index member survives and later members are marked
//! for removal. That is an approximation, not a maximum retained set.

use ndarray::{s, Array2};

/// Find near-duplicate rows of a feature matrix.
///
/// Returns the global row indices to remove, in increasing order; each
/// is a near-duplicate of some lower-index survivor. Rows are expected
/// to be normalized consistently by the caller; the threshold is
/// compared against plain dot products. The result is identical for any
/// `batch_size`, which only bounds memory.
pub fn find_duplicates(features: &Array2<f32>, threshold: f32, batch_size: usize) -> Vec<usize> {
    assert!(batch_size > 0, "batch_size must be positive");

    let total = features.nrows();
    let mut removed: Vec<usize> = Vec::new();

    let mut start = 0;
    while start < total {
        let end = (start + batch_size).min(total);
        let batch = features.slice(s![start..end, ..]);

        // (batch × N) similarity block against the full matrix.
        let mut block = batch.dot(&features.t());

        // An item is never its own duplicate.
        for (row, global) in (start..end).enumerate() {
            block[[row, global]] = 0.0;
        }

        let mut matches = block.mapv(|sim| sim > threshold);

        // Items removed by earlier batches can neither be removed again
        // nor cause further removals.
        for &gone in &removed {
            matches.column_mut(gone).fill(false);
        }

        // A row is removed when it matches a surviving row with a lower
        // global index; the lowest-index member of every cluster survives.
        for (row, global) in (start..end).enumerate() {
            if matches.row(row).iter().take(global).any(|&hit| hit) {
                removed.push(global);
                // Clear this item's column so its other twins are not
                // cascade-removed in the same pass.
                matches.column_mut(global).fill(false);
            }
        }

        start = end;
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    /// 4 unit vectors where rows 0 and 2 are identical, others orthogonal.
    fn matrix_with_one_twin() -> Array2<f32> {
        arr2(&[
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    #[test]
    fn test_identical_pair_keeps_lowest_index() {
        let removed = find_duplicates(&matrix_with_one_twin(), 0.99, 10);
        assert_eq!(removed, vec![2]);
    }

    #[test]
    fn test_orthogonal_rows_are_kept() {
        let features = arr2(&[[1.0, 0.0], [0.0, 1.0]]);
        assert!(find_duplicates(&features, 0.5, 10).is_empty());
    }

    #[test]
    fn test_no_self_duplicates_at_zero_threshold_margin() {
        // Every row is self-similar at 1.0; with nothing else close, the
        // self entry alone must never trigger a removal.
        let features = arr2(&[[1.0, 0.0], [0.0, 1.0]]);
        assert!(find_duplicates(&features, 0.9, 1).is_empty());
    }

    #[test]
    fn test_cluster_keeps_exactly_one_survivor() {
        // Three identical rows: the first survives, the rest go.
        let features = arr2(&[[0.0, 1.0], [0.0, 1.0], [0.0, 1.0], [1.0, 0.0]]);
        assert_eq!(find_duplicates(&features, 0.99, 10), vec![1, 2]);
    }

    #[test]
    fn test_determinism_across_batch_sizes() {
        let features = arr2(&[
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
        ]);

        let reference = find_duplicates(&features, 0.99, features.nrows());
        for batch_size in [1, 2, 3, 5, 7, 100] {
            assert_eq!(
                find_duplicates(&features, 0.99, batch_size),
                reference,
                "batch_size {batch_size} changed the removal set"
            );
        }
        assert_eq!(reference, vec![2, 3, 5, 6]);
    }

    #[test]
    fn test_raising_threshold_never_removes_more() {
        let features = arr2(&[
            [1.0, 0.0],
            [0.96, 0.28],
            [0.0, 1.0],
            [0.28, 0.96],
            [1.0, 0.0],
        ]);

        let mut previous = usize::MAX;
        for threshold in [0.5, 0.9, 0.95, 0.99, 1.01] {
            let removed = find_duplicates(&features, threshold, 2).len();
            assert!(removed <= previous);
            previous = removed;
        }
    }

    #[test]
    fn test_idempotent_after_removal() {
        let features = matrix_with_one_twin();
        let removed = find_duplicates(&features, 0.99, 2);

        // Rebuild the matrix without the removed rows; a second pass
        // must find nothing.
        let kept: Vec<usize> = (0..features.nrows()).filter(|i| !removed.contains(i)).collect();
        let survivors = features.select(ndarray::Axis(0), &kept);
        assert!(find_duplicates(&survivors, 0.99, 2).is_empty());
    }

    #[test]
    fn test_concatenated_models_with_scaled_threshold() {
        // Two unit-normalized models concatenated: scores add per model,
        // so the effective threshold is 2 × 0.98 = 1.96. Rows 0 and 1
        // agree on both models (combined 2.0); rows 2 and 3 agree on the
        // first model only (combined 1.0) and must survive.
        let features = arr2(&[
            [1.0, 0.0, 1.0, 0.0],
            [1.0, 0.0, 1.0, 0.0],
            [0.0, 1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0, 1.0],
        ]);

        assert_eq!(find_duplicates(&features, 2.0 * 0.98, 10), vec![1]);
    }

    #[test]
    #[should_panic(expected = "batch_size must be positive")]
    fn test_zero_batch_size_panics() {
        find_duplicates(&arr2(&[[1.0f32]]), 0.5, 0);
    }
}
