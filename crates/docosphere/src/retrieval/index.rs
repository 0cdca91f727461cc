//! Flat cosine-similarity vector index and its on-disk store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{ChunkingConfig, RagConfig};
use crate::error::{Error, Result};
use crate::types::{SourceRecord, TextChunk};

/// File holding the index inside the index directory
pub const INDEX_FILE: &str = "index.json";

/// Current on-disk format version
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Describes how an index was built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    /// On-disk format version
    pub version: u32,
    /// Embedding provider name
    pub provider: String,
    /// Embedding model name
    pub model: String,
    /// Vector dimensions
    pub dimensions: usize,
    /// Number of indexed chunks
    pub chunk_count: usize,
    /// Chunking parameters used
    pub chunking: ChunkingConfig,
    /// Build time
    pub created_at: DateTime<Utc>,
    /// Documents that contributed text
    pub sources: Vec<SourceRecord>,
}

/// One chunk and its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: TextChunk,
    pub embedding: Vec<f32>,
}

/// A chunk returned by similarity search
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: TextChunk,
    /// Cosine similarity to the query (-1.0 to 1.0, higher is better)
    pub score: f32,
}

/// In-memory index over (embedding, chunk) pairs with exact search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Assemble an index, checking every vector has the manifest's dimensions
    pub fn new(manifest: IndexManifest, entries: Vec<IndexEntry>) -> Result<Self> {
        let index = Self { manifest, entries };
        index.validate()?;
        Ok(index)
    }

    fn validate(&self) -> Result<()> {
        if self.manifest.chunk_count != self.entries.len() {
            return Err(Error::vector_db(format!(
                "Manifest lists {} chunks but index holds {}",
                self.manifest.chunk_count,
                self.entries.len()
            )));
        }
        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.embedding.len() != self.manifest.dimensions)
        {
            return Err(Error::vector_db(format!(
                "Chunk {} has {} dimensions, expected {}",
                entry.chunk.index,
                entry.embedding.len(),
                self.manifest.dimensions
            )));
        }
        Ok(())
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the `top_k` chunks most similar to `query`, best first
    ///
    /// Ties keep source order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.manifest.dimensions {
            return Err(Error::vector_db(format!(
                "Query embedding has {} dimensions, index has {}",
                query.len(),
                self.manifest.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query, &e.embedding)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }
}

/// Cosine similarity; zero when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Handle to the directory holding the persisted index
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
}

impl IndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.index.path.clone())
    }

    /// Index directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the index file
    pub fn file_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Whether an index has been built
    pub fn exists(&self) -> bool {
        self.file_path().is_file()
    }

    /// Load the persisted index
    pub async fn load(&self) -> Result<VectorIndex> {
        let path = self.file_path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::IndexNotFound { path });
            }
            Err(e) => return Err(e.into()),
        };

        let index: VectorIndex = serde_json::from_str(&content).map_err(|e| {
            Error::vector_db(format!("Corrupt index at {}: {}", path.display(), e))
        })?;

        if index.manifest.version != INDEX_FORMAT_VERSION {
            return Err(Error::vector_db(format!(
                "Unsupported index version {} at {}; process the documents again",
                index.manifest.version,
                path.display()
            )));
        }
        index.validate()?;

        tracing::debug!(
            "Loaded index with {} chunks from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Manifest of the persisted index
    pub async fn manifest(&self) -> Result<IndexManifest> {
        Ok(self.load().await?.manifest)
    }

    /// Replace the persisted index wholesale
    ///
    /// Written to a temporary file first and renamed over the live file, so readers
    /// see either the old index or the new one.
    pub async fn replace(&self, index: &VectorIndex) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.file_path();
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec(index)?;

        tokio::fs::write(&tmp, &json).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::info!(
            "Saved index with {} chunks to {}",
            index.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: usize, content: &str) -> TextChunk {
        TextChunk {
            index,
            content: content.to_string(),
            char_start: 0,
            char_end: content.chars().count(),
        }
    }

    fn manifest(dimensions: usize, chunk_count: usize) -> IndexManifest {
        IndexManifest {
            version: INDEX_FORMAT_VERSION,
            provider: "test".to_string(),
            model: "test-embed".to_string(),
            dimensions,
            chunk_count,
            chunking: ChunkingConfig::default(),
            created_at: Utc::now(),
            sources: Vec::new(),
        }
    }

    fn sample_index() -> VectorIndex {
        let entries = vec![
            IndexEntry {
                chunk: chunk(0, "north"),
                embedding: vec![1.0, 0.0],
            },
            IndexEntry {
                chunk: chunk(1, "east"),
                embedding: vec![0.0, 1.0],
            },
            IndexEntry {
                chunk: chunk(2, "north-east"),
                embedding: vec![0.7, 0.7],
            },
        ];
        VectorIndex::new(manifest(2, 3), entries).unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let results = sample_index().search(&[1.0, 0.1], 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "north");
        assert_eq!(results[1].chunk.content, "north-east");
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_search_top_k_larger_than_index() {
        let results = sample_index().search(&[0.0, 1.0], 10).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let err = sample_index().search(&[1.0, 0.0, 0.0], 2).unwrap_err();
        assert!(matches!(err, Error::VectorDb(_)));

        let bad = vec![IndexEntry {
            chunk: chunk(0, "x"),
            embedding: vec![1.0],
        }];
        assert!(VectorIndex::new(manifest(2, 1), bad).is_err());
    }

    #[tokio::test]
    async fn test_load_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("doc_index"));

        assert!(!store.exists());
        assert!(matches!(
            store.load().await,
            Err(Error::IndexNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_replace_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("doc_index"));

        store.replace(&sample_index()).await.unwrap();
        assert!(store.exists());
        assert!(!store.file_path().with_extension("json.tmp").exists());

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.manifest().model, "test-embed");
        assert_eq!(loaded.entries()[2].chunk.content, "north-east");
    }

    #[tokio::test]
    async fn test_replace_overwrites_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());

        store.replace(&sample_index()).await.unwrap();

        let smaller = VectorIndex::new(
            manifest(2, 1),
            vec![IndexEntry {
                chunk: chunk(0, "only"),
                embedding: vec![0.5, 0.5],
            }],
        )
        .unwrap();
        store.replace(&smaller).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.entries()[0].chunk.content, "only");
    }

    #[tokio::test]
    async fn test_corrupt_index_is_vector_db_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path());
        std::fs::write(store.file_path(), b"{not json").unwrap();

        assert!(matches!(store.load().await, Err(Error::VectorDb(_))));
    }
}
