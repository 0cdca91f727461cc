//! Query-time retrieval over the persisted index

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

use super::index::{IndexStore, ScoredChunk};

/// Retrieves the chunks most similar to a question
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: IndexStore,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: IndexStore, top_k: usize) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Load the current index and return the `top_k` best chunks for `query`
    ///
    /// The index is read on every call so a rebuild is picked up immediately.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        let index = self.store.load().await?;
        let manifest = index.manifest();

        if manifest.provider != self.embedder.name() || manifest.model != self.embedder.model() {
            return Err(Error::vector_db(format!(
                "Index was built with {} ({}) but queries use {} ({}); process the documents again",
                manifest.model,
                manifest.provider,
                self.embedder.model(),
                self.embedder.name()
            )));
        }

        let embedding = self.embedder.embed(query).await?;
        let results = index.search(&embedding, self.top_k)?;

        tracing::debug!(
            "Retrieved {} of {} chunks (best score {:.3})",
            results.len(),
            index.len(),
            results.first().map(|r| r.score).unwrap_or_default()
        );

        Ok(results)
    }
}
