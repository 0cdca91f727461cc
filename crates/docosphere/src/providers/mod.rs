//! Provider abstractions for embeddings and text generation
//!
//! Trait-based so the pipeline can run against the hosted Gemini API or a local
//! Ollama server without knowing which.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod ollama;
pub mod retry;

use std::sync::Arc;

use crate::config::{BackendProvider, RagConfig};
use crate::error::Result;

pub use embedding::EmbeddingProvider;
pub use gemini::GeminiClient;
pub use llm::{CompletionRequest, LlmProvider};
pub use ollama::OllamaClient;
pub use retry::RetryPolicy;

/// The embedding and generation providers selected by configuration
#[derive(Clone)]
pub struct Providers {
    /// Embedding provider, shared by indexing and retrieval
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Generation provider
    pub llm: Arc<dyn LlmProvider>,
}

impl Providers {
    /// Build providers for the configured backend
    ///
    /// Fails with a configuration error when the backend's credential is missing.
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        match config.backend {
            BackendProvider::Gemini => {
                tracing::info!(
                    "Using Gemini backend (embed: {}, generate: {})",
                    config.gemini.embed_model,
                    config.gemini.generate_model
                );
                let client = Arc::new(GeminiClient::new(config)?);
                Ok(Self {
                    embedder: client.clone(),
                    llm: client,
                })
            }
            BackendProvider::Ollama => {
                tracing::info!(
                    "Using Ollama backend at {} (embed: {}, generate: {})",
                    config.llm.base_url,
                    config.llm.embed_model,
                    config.llm.generate_model
                );
                let client = Arc::new(OllamaClient::new(config)?);
                Ok(Self {
                    embedder: client.clone(),
                    llm: client,
                })
            }
        }
    }
}
