//! Core data types for corpus items, feature records, and feature matrices.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Stable identity of one corpus item, derived from its source file stem.
///
/// Unique within a corpus; the join key across embedding models.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derive an identity from a file path (filename without extension).
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(|s| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Per-item feature vectors, keyed by embedding-model name.
///
/// A record gains new model entries over time but an existing model's
/// vector is never overwritten.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecord {
    features: BTreeMap<String, Vec<f32>>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the vector stored for a model, if any.
    pub fn get(&self, model: &str) -> Option<&[f32]> {
        self.features.get(model).map(|v| v.as_slice())
    }

    pub fn has(&self, model: &str) -> bool {
        self.features.contains_key(model)
    }

    /// Insert a vector for a model. Returns `false` (without modifying
    /// the record) if the model already has an entry.
    pub fn insert(&mut self, model: &str, vector: Vec<f32>) -> bool {
        if self.features.contains_key(model) {
            return false;
        }
        self.features.insert(model.to_string(), vector);
        true
    }

    /// Names of the models with stored vectors, in sorted order.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// A dense (N × D) feature matrix plus the row-index → identity map.
///
/// Invariant: row `i` of `features` holds the vector for `ids[i]`.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub features: Array2<f32>,
    pub ids: Vec<ItemId>,
}

impl FeatureMatrix {
    /// Number of items (rows).
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Feature dimensionality (columns).
    pub fn dim(&self) -> usize {
        self.features.ncols()
    }

    /// Identity of the item stored in a given row.
    pub fn id(&self, row: usize) -> &ItemId {
        &self.ids[row]
    }
}

/// Errors that can occur while curating a corpus.
#[derive(thiserror::Error, Debug)]
pub enum CorpusError {
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("no features collected for model '{model}'")]
    EmptyCollection { model: String },

    #[error("identity maps for models '{model_a}' and '{model_b}' disagree in content or order")]
    InconsistentIdentityMap { model_a: String, model_b: String },

    #[error("zero-norm feature vector for item '{identity}' cannot be normalized")]
    DegenerateVector { identity: ItemId },

    #[error("model '{model}' produced {actual} dims for item '{identity}', expected {expected}")]
    DimensionMismatch {
        model: String,
        identity: ItemId,
        expected: usize,
        actual: usize,
    },

    #[error("failed to delete item '{identity}' ({removed} items removed before the failure): {source}")]
    Deletion {
        identity: ItemId,
        removed: usize,
        #[source]
        source: Box<CorpusError>,
    },
}

/// Convenience result type.
pub type CorpusResult<T> = Result<T, CorpusError>;
