//! Destructive removal of near-duplicate items from a corpus.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::collect::assemble_features;
use crate::corpus::CorpusLayout;
use crate::dedup::find_duplicates;
use crate::embedding::{extract_features, EmbeddingModel};
use crate::store::FeatureStore;
use crate::types::{CorpusError, CorpusResult, ItemId};

/// Delete the listed matrix rows from the corpus: both the image file
/// and the stored feature record of each item.
///
/// Irreversible. Returns the number of items removed. On a failed
/// deletion the error carries the identity of the failing item and
/// exactly how many items were removed before it; a partial run is
/// never silent.
pub fn prune_corpus(
    removal: &[usize],
    ids: &[ItemId],
    store: &mut dyn FeatureStore,
    layout: &CorpusLayout,
) -> CorpusResult<usize> {
    let mut image_paths: HashMap<ItemId, PathBuf> = layout
        .items()?
        .into_iter()
        .map(|item| (item.id, item.image_path))
        .collect();

    let mut removed = 0usize;
    for &row in removal {
        let id = &ids[row];

        let deletion_failed = |source: CorpusError| CorpusError::Deletion {
            identity: id.clone(),
            removed,
            source: Box::new(source),
        };

        let image_path = image_paths.remove(id).ok_or_else(|| {
            deletion_failed(CorpusError::Store(format!("No image file for '{id}'")))
        })?;
        std::fs::remove_file(&image_path).map_err(|e| deletion_failed(e.into()))?;
        store.remove(id).map_err(deletion_failed)?;

        tracing::debug!("Removed near-duplicate item '{id}'");
        removed += 1;
    }

    Ok(removed)
}

/// End-to-end near-duplicate removal for a corpus folder.
///
/// Extracts any missing features for every model (resumable), assembles
/// the normalized multi-model matrix, scales the per-model threshold by
/// the number of models (concatenated unit vectors sum their per-model
/// dot products), detects duplicates in batches, and prunes them.
/// Returns the number of items removed.
pub fn dedup_corpus(
    layout: &CorpusLayout,
    models: &mut [Box<dyn EmbeddingModel>],
    store: &mut dyn FeatureStore,
    per_model_threshold: f32,
    batch_size: usize,
) -> CorpusResult<usize> {
    assert!(!models.is_empty(), "at least one embedding model is required");

    for model in models.iter_mut() {
        extract_features(layout, model.as_mut(), store)?;
    }

    let items = layout.item_ids()?;
    let names: Vec<&str> = models.iter().map(|m| m.name()).collect();
    let matrix = assemble_features(&*store, &items, &names, true)?;

    let threshold = per_model_threshold * models.len() as f32;
    let removal = find_duplicates(&matrix.features, threshold, batch_size);

    let total = matrix.len();
    tracing::info!(
        "Corpus '{}': removing {} near-duplicates out of {} items ({:.1}%)",
        layout.root().display(),
        removal.len(),
        total,
        100.0 * removal.len() as f64 / total as f64
    );

    prune_corpus(&removal, &matrix.ids, store, layout)
}
