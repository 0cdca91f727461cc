//! Ingestion pipeline orchestration

use std::sync::Arc;
use std::time::Instant;

use crate::config::{ChunkingConfig, RagConfig};
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::retrieval::{IndexStore, Indexer};
use crate::types::{ProcessResponse, UploadedDocument};

use super::chunker::TextChunker;
use super::extractor::TextExtractor;

/// Extract, chunk and index a batch of documents
pub struct IngestPipeline {
    /// Text chunker
    chunker: TextChunker,
    /// Embeds and persists chunks
    indexer: Indexer,
}

impl IngestPipeline {
    pub fn new(chunker: TextChunker, indexer: Indexer) -> Self {
        Self { chunker, indexer }
    }

    /// Create a pipeline writing to the configured index location
    pub fn from_config(config: &RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        Ok(Self::new(
            TextChunker::from_config(&config.chunking)?,
            Indexer::new(embedder, IndexStore::from_config(config)),
        ))
    }

    pub fn store(&self) -> &IndexStore {
        self.indexer.store()
    }

    /// Replace the index with the text of `documents`
    ///
    /// Unreadable files are reported in the response. Fails with `ExtractionEmpty`
    /// when no file yields text, leaving any previous index untouched.
    pub async fn process(&self, documents: Vec<UploadedDocument>) -> Result<ProcessResponse> {
        let start = Instant::now();

        if documents.is_empty() {
            return Err(Error::InvalidRequest("No documents provided".to_string()));
        }

        tracing::info!("Processing {} documents", documents.len());

        // Parsing is CPU-bound
        let extraction = tokio::task::spawn_blocking(move || TextExtractor::extract(&documents))
            .await
            .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))?;

        if extraction.is_empty() {
            tracing::warn!(
                "No readable text in batch ({} files skipped)",
                extraction.skipped.len()
            );
            return Err(Error::ExtractionEmpty);
        }

        let chunks = self.chunker.split(&extraction.text);
        let total_chunks = chunks.len();
        let total_chars = extraction.text.chars().count();
        let documents_indexed = extraction
            .sources
            .iter()
            .map(|s| s.filename.clone())
            .collect();

        let chunking = ChunkingConfig {
            chunk_size: self.chunker.chunk_size(),
            chunk_overlap: self.chunker.overlap(),
        };
        self.indexer
            .build(chunks, extraction.sources, chunking)
            .await?;

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Indexed {} chars as {} chunks in {}ms",
            total_chars,
            total_chunks,
            processing_time_ms
        );

        Ok(ProcessResponse {
            documents_indexed,
            skipped: extraction.skipped,
            total_chars,
            total_chunks,
            processing_time_ms,
        })
    }
}
