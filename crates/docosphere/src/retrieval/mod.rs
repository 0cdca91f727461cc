//! Vector indexing and similarity retrieval

pub mod index;
pub mod indexer;
pub mod search;

pub use index::{
    cosine_similarity, IndexEntry, IndexManifest, IndexStore, ScoredChunk, VectorIndex,
    INDEX_FILE, INDEX_FORMAT_VERSION,
};
pub use indexer::Indexer;
pub use search::Retriever;
