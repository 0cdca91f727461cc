//! LLM provider trait for text generation

use async_trait::async_trait;
use crate::error::Result;

/// A single generation call
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// System instruction, if any
    pub system: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Ask the model to reply with a JSON object
    pub json_response: bool,
}

impl CompletionRequest {
    /// Plain prompt without system instruction
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Set the system instruction
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Request a JSON reply
    pub fn json(mut self) -> Self {
        self.json_response = true;
        self
    }
}

/// Trait for generative model calls
///
/// Implementations:
/// - `GeminiClient`: Google Generative Language API (gemini-1.5-pro)
/// - `OllamaClient`: Local Ollama server (llama3.2, phi3, etc.)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one generation call and return the model's text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
