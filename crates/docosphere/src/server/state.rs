//! Application state for the HTTP server

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::QueryRouter;
use crate::ingestion::IngestPipeline;
use crate::providers::Providers;
use crate::retrieval::{IndexStore, Retriever};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Embedding and generation providers
    providers: Providers,
    /// Extract, chunk and index pipeline
    pipeline: IngestPipeline,
    /// Self-assessment gate and answer generation
    router: QueryRouter,
    /// Location of the persisted index
    store: IndexStore,
    /// Serialises index rebuilds
    process_lock: Mutex<()>,
}

impl AppState {
    /// Create state with providers built from config
    pub fn new(config: RagConfig) -> Result<Self> {
        let providers = Providers::from_config(&config)?;
        Self::with_providers(config, providers)
    }

    /// Create state around existing providers
    pub fn with_providers(config: RagConfig, providers: Providers) -> Result<Self> {
        tracing::info!(
            "Initializing application state (backend: {:?}, index: {})",
            config.backend,
            config.index.path.display()
        );

        let store = IndexStore::from_config(&config);
        let pipeline = IngestPipeline::from_config(&config, providers.embedder.clone())?;
        let retriever = Retriever::new(
            providers.embedder.clone(),
            store.clone(),
            config.retrieval.top_k,
        );
        let router = QueryRouter::new(
            providers.llm.clone(),
            retriever,
            config.router.structured_assessment,
        );

        if store.exists() {
            tracing::info!("Found existing index at {}", store.file_path().display());
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                providers,
                pipeline,
                router,
                store,
                process_lock: Mutex::new(()),
            }),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn providers(&self) -> &Providers {
        &self.inner.providers
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    pub fn router(&self) -> &QueryRouter {
        &self.inner.router
    }

    pub fn store(&self) -> &IndexStore {
        &self.inner.store
    }

    /// Lock held for the duration of an index rebuild
    pub fn process_lock(&self) -> &Mutex<()> {
        &self.inner.process_lock
    }

    /// Ready to answer document questions once an index exists
    pub fn is_ready(&self) -> bool {
        self.inner.store.exists()
    }
}
