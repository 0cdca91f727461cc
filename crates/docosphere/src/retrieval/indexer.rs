//! Embeds chunks and persists them as the vector index

use chrono::Utc;
use std::sync::Arc;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::types::{SourceRecord, TextChunk};

use super::index::{IndexEntry, IndexManifest, IndexStore, VectorIndex, INDEX_FORMAT_VERSION};

/// Builds and persists the vector index
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    store: IndexStore,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: IndexStore) -> Self {
        Self { embedder, store }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Embed `chunks` and replace the persisted index with them
    pub async fn build(
        &self,
        chunks: Vec<TextChunk>,
        sources: Vec<SourceRecord>,
        chunking: ChunkingConfig,
    ) -> Result<IndexManifest> {
        if chunks.is_empty() {
            return Err(Error::ExtractionEmpty);
        }

        tracing::info!(
            "Embedding {} chunks with {} ({})",
            chunks.len(),
            self.embedder.name(),
            self.embedder.model()
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(Error::internal(format!(
                "Embedding provider returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dimensions = embeddings.first().map(Vec::len).unwrap_or_default();
        if dimensions == 0 {
            return Err(Error::vector_db("Embedding provider returned empty vectors"));
        }
        if dimensions != self.embedder.dimensions() {
            tracing::warn!(
                "{} returned {}-dimensional vectors (configured {})",
                self.embedder.model(),
                dimensions,
                self.embedder.dimensions()
            );
        }

        let manifest = IndexManifest {
            version: INDEX_FORMAT_VERSION,
            provider: self.embedder.name().to_string(),
            model: self.embedder.model().to_string(),
            dimensions,
            chunk_count: chunks.len(),
            chunking,
            created_at: Utc::now(),
            sources,
        };

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        let index = VectorIndex::new(manifest, entries)?;
        self.store.replace(&index).await?;

        Ok(index.manifest().clone())
    }
}
