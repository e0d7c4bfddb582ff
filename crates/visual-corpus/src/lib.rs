//! visual-corpus — labeled image corpus curation: per-item feature stores,
//! embedding-based near-duplicate removal, and nearest-neighbor retrieval.

pub mod collect;
pub mod corpus;
pub mod dedup;
pub mod embedding;
pub mod knn;
pub mod prune;
pub mod store;
pub mod types;

pub use collect::{assemble_features, collect_features};
pub use corpus::{is_supported_image, CorpusItem, CorpusLayout};
pub use dedup::find_duplicates;
pub use embedding::{extract_features, EmbeddingModel};
pub use knn::{nearest_neighbors, top_k, Neighbor};
pub use prune::{dedup_corpus, prune_corpus};
pub use store::{FeatureStore, FsFeatureStore, MemoryFeatureStore};
pub use types::*;
