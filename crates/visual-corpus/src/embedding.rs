//! Embedding-model capability and the resumable feature extraction loop.

use image::DynamicImage;

use crate::corpus::CorpusLayout;
use crate::store::FeatureStore;
use crate::types::{CorpusError, CorpusResult};

/// An injected embedding capability: a named model producing fixed-length
/// vectors from images.
///
/// Implementations are selected once at configuration time; nothing
/// downstream branches on the model name.
pub trait EmbeddingModel {
    /// Model name used as the feature-record key.
    fn name(&self) -> &str;

    /// Fixed output dimension of this model.
    fn dimension(&self) -> usize;

    /// Compute the feature vector for one image.
    fn embed(&mut self, image: &DynamicImage) -> CorpusResult<Vec<f32>>;
}

/// Extract features for every corpus item that does not yet have them.
///
/// Items already cached in the store for this model are skipped, so an
/// interrupted extraction run can simply be restarted; work already done
/// is never redone and no record is written twice. Returns the number of
/// vectors actually computed.
pub fn extract_features(
    layout: &CorpusLayout,
    model: &mut dyn EmbeddingModel,
    store: &mut dyn FeatureStore,
) -> CorpusResult<usize> {
    let items = layout.items()?;
    tracing::info!(
        "Extracting '{}' features for {} corpus items",
        model.name(),
        items.len()
    );

    let mut computed = 0usize;
    for item in &items {
        if store.has(&item.id, model.name())? {
            tracing::debug!("'{}' features cached for '{}', skipping", model.name(), item.id);
            continue;
        }

        let image = image::open(&item.image_path)?;
        let vector = model.embed(&image)?;
        if vector.len() != model.dimension() {
            return Err(CorpusError::DimensionMismatch {
                model: model.name().to_string(),
                identity: item.id.clone(),
                expected: model.dimension(),
                actual: vector.len(),
            });
        }

        store.put(&item.id, model.name(), vector)?;
        computed += 1;
    }

    tracing::info!(
        "Computed {computed} new '{}' vectors ({} already cached)",
        model.name(),
        items.len() - computed
    );
    Ok(computed)
}
