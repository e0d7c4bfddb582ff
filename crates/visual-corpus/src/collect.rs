//! Assembling feature matrices from stored records.
//!
//! Collection is a pure read: items without a record for the requested
//! model simply do not appear in the output matrix. Cross-item
//! consistency problems, by contrast, are always fatal.

use ndarray::{concatenate, Array2, Axis};

use crate::store::FeatureStore;
use crate::types::{CorpusError, CorpusResult, FeatureMatrix, ItemId};

/// Build the feature matrix for one embedding model.
///
/// Rows are stacked in the order items are given; an item missing a
/// record (or missing this model's entry) is skipped. With `normalize`
/// every row is divided by its L2 norm; a zero-norm row is rejected as
/// degenerate rather than silently divided.
pub fn collect_features(
    store: &dyn FeatureStore,
    items: &[ItemId],
    model: &str,
    normalize: bool,
) -> CorpusResult<FeatureMatrix> {
    let mut ids: Vec<ItemId> = Vec::new();
    let mut data: Vec<f32> = Vec::new();
    let mut dim: Option<usize> = None;

    for id in items {
        let Some(record) = store.get(id)? else {
            tracing::debug!("No feature record for '{id}', skipping");
            continue;
        };
        let Some(vector) = record.get(model) else {
            tracing::debug!("Record for '{id}' has no '{model}' features, skipping");
            continue;
        };

        match dim {
            None => dim = Some(vector.len()),
            Some(expected) if expected != vector.len() => {
                return Err(CorpusError::DimensionMismatch {
                    model: model.to_string(),
                    identity: id.clone(),
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
        }

        data.extend_from_slice(vector);
        ids.push(id.clone());
    }

    let dim = dim.ok_or_else(|| CorpusError::EmptyCollection {
        model: model.to_string(),
    })?;

    let mut features = Array2::from_shape_vec((ids.len(), dim), data)
        .map_err(|e| CorpusError::Store(format!("Bad matrix shape for '{model}': {e}")))?;

    if normalize {
        for (row, id) in ids.iter().enumerate() {
            let norm = features.row(row).mapv(|x| x * x).sum().sqrt();
            if norm == 0.0 {
                return Err(CorpusError::DegenerateVector {
                    identity: id.clone(),
                });
            }
            features.row_mut(row).mapv_inplace(|x| x / norm);
        }
    }

    tracing::debug!(
        "Collected {}x{dim} '{model}' feature matrix ({} of {} items had records)",
        ids.len(),
        ids.len(),
        items.len()
    );
    Ok(FeatureMatrix { features, ids })
}

/// Build one wide matrix from several embedding models.
///
/// Each model is collected separately, then the matrices are joined
/// column-wise (same rows, more dimensions). Every per-model identity
/// map must be identical in content and order; a mismatch would silently
/// misalign feature columns across items, so it aborts instead.
pub fn assemble_features(
    store: &dyn FeatureStore,
    items: &[ItemId],
    models: &[&str],
    normalize: bool,
) -> CorpusResult<FeatureMatrix> {
    assert!(!models.is_empty(), "at least one model name is required");

    let mut collected: Vec<FeatureMatrix> = Vec::with_capacity(models.len());
    for model in models {
        collected.push(collect_features(store, items, model, normalize)?);
    }

    for (matrix, model) in collected.iter().zip(models).skip(1) {
        if matrix.ids != collected[0].ids {
            return Err(CorpusError::InconsistentIdentityMap {
                model_a: models[0].to_string(),
                model_b: model.to_string(),
            });
        }
    }

    let views: Vec<_> = collected.iter().map(|m| m.features.view()).collect();
    let features = concatenate(Axis(1), &views)
        .map_err(|e| CorpusError::Store(format!("Feature concatenation failed: {e}")))?;

    Ok(FeatureMatrix {
        features,
        ids: collected.swap_remove(0).ids,
    })
}
