//! Ollama client for local embeddings and generation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RagConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{CompletionRequest, LlmProvider};
use super::retry::RetryPolicy;

const SERVICE: &str = "ollama";

/// Ollama API client with automatic retry
pub struct OllamaClient {
    client: Client,
    base_url: String,
    embed_model: String,
    generate_model: String,
    temperature: f32,
    dimensions: usize,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &RagConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.llm.base_url.trim_end_matches('/').to_string(),
            embed_model: config.llm.embed_model.clone(),
            generate_model: config.llm.generate_model.clone(),
            temperature: config.llm.temperature,
            dimensions: config.embeddings.dimensions,
            retry: RetryPolicy::new(config.llm.max_retries),
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de> + Send,
    {
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();

        self.retry
            .run(SERVICE, || async move {
                let response = self
                    .client
                    .post(url)
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| Error::from_transport(SERVICE, e))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(Error::from_status(SERVICE, status, &body));
                }

                response
                    .json::<R>()
                    .await
                    .map_err(|e| Error::rejected(SERVICE, format!("Failed to parse response: {}", e)))
            })
            .await
    }

    async fn tags_ok(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbedRequest {
            model: &self.embed_model,
            prompt: text,
        };
        let response: EmbedResponse = self.post("/api/embeddings", &request).await?;

        if response.embedding.is_empty() {
            return Err(Error::rejected(
                SERVICE,
                format!("Model {} returned an empty embedding", self.embed_model),
            ));
        }
        Ok(response.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.tags_ok().await)
    }

    fn name(&self) -> &str {
        SERVICE
    }

    fn model(&self) -> &str {
        &self.embed_model
    }
}

#[async_trait]
impl LlmProvider for OllamaClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = GenerateRequest {
            model: &self.generate_model,
            prompt: &request.prompt,
            system: request.system.as_deref(),
            format: request.json_response.then_some("json"),
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
            },
        };

        let response: GenerateResponse = self.post("/api/generate", &body).await?;
        Ok(response.response)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.tags_ok().await)
    }

    fn name(&self) -> &str {
        SERVICE
    }

    fn model(&self) -> &str {
        &self.generate_model
    }
}
