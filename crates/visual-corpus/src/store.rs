//! Persistent per-item feature record storage.
//!
//! The store is keyed by item identity and embedding-model name; backings
//! are injected so extraction and collection code never touch the
//! filesystem directly.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::corpus::CorpusLayout;
use crate::types::{CorpusError, CorpusResult, FeatureRecord, ItemId};

/// Storage of named feature vectors, one record per item.
pub trait FeatureStore {
    /// Load the full record for an item, if one exists.
    fn get(&self, id: &ItemId) -> CorpusResult<Option<FeatureRecord>>;

    /// Store a vector for an (item, model) pair.
    ///
    /// A no-op if the model already has a vector for this item: vectors
    /// are immutable once written.
    fn put(&mut self, id: &ItemId, model: &str, vector: Vec<f32>) -> CorpusResult<()>;

    /// Check whether an (item, model) pair is already stored.
    fn has(&self, id: &ItemId, model: &str) -> CorpusResult<bool>;

    /// Permanently delete an item's record. Errors if no record exists.
    fn remove(&mut self, id: &ItemId) -> CorpusResult<()>;
}

/// Filesystem-backed store: one JSON record per item in a folder.
pub struct FsFeatureStore {
    dir: PathBuf,
}

impl FsFeatureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at a corpus layout's `pretrained_features/` folder.
    pub fn for_layout(layout: &CorpusLayout) -> Self {
        Self::new(layout.features_dir())
    }

    fn record_path(&self, id: &ItemId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl FeatureStore for FsFeatureStore {
    fn get(&self, id: &ItemId) -> CorpusResult<Option<FeatureRecord>> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let bytes = std::fs::read(&path)?;
        let record = serde_json::from_slice(&bytes).map_err(|e| {
            CorpusError::Store(format!("Malformed record for '{id}' at {}: {e}", path.display()))
        })?;
        Ok(Some(record))
    }

    fn put(&mut self, id: &ItemId, model: &str, vector: Vec<f32>) -> CorpusResult<()> {
        let mut record = self.get(id)?.unwrap_or_default();
        if !record.insert(model, vector) {
            tracing::debug!("Record for '{id}' already has '{model}' features, keeping existing");
            return Ok(());
        }

        std::fs::create_dir_all(&self.dir)?;
        let payload = serde_json::to_vec(&record)
            .map_err(|e| CorpusError::Store(format!("Serialization failed for '{id}': {e}")))?;
        std::fs::write(self.record_path(id), payload)?;
        Ok(())
    }

    fn has(&self, id: &ItemId, model: &str) -> CorpusResult<bool> {
        Ok(self.get(id)?.is_some_and(|record| record.has(model)))
    }

    fn remove(&mut self, id: &ItemId) -> CorpusResult<()> {
        std::fs::remove_file(self.record_path(id))?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral pipelines.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeatureStore {
    records: HashMap<ItemId, FeatureRecord>,
}

impl MemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FeatureStore for MemoryFeatureStore {
    fn get(&self, id: &ItemId) -> CorpusResult<Option<FeatureRecord>> {
        Ok(self.records.get(id).cloned())
    }

    fn put(&mut self, id: &ItemId, model: &str, vector: Vec<f32>) -> CorpusResult<()> {
        let record = self.records.entry(id.clone()).or_default();
        if !record.insert(model, vector) {
            tracing::debug!("Record for '{id}' already has '{model}' features, keeping existing");
        }
        Ok(())
    }

    fn has(&self, id: &ItemId, model: &str) -> CorpusResult<bool> {
        Ok(self
            .records
            .get(id)
            .is_some_and(|record| record.has(model)))
    }

    fn remove(&mut self, id: &ItemId) -> CorpusResult<()> {
        self.records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CorpusError::Store(format!("No record to remove for '{id}'")))
    }
}
