//! Gemini client for embeddings and generation via the Generative Language API
//!
//! Authenticates with an API key sent in the `x-goog-api-key` header.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::RagConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{CompletionRequest, LlmProvider};
use super::retry::RetryPolicy;

const SERVICE: &str = "gemini";

/// Upper bound on texts per `batchEmbedContents` call
const MAX_BATCH: usize = 100;

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    embed_model: String,
    generate_model: String,
    temperature: f32,
    dimensions: usize,
    batch_size: usize,
    retry: RetryPolicy,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest {
    model: String,
    content: Content,
    task_type: &'static str,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedContentRequest>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Content,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate
    ///
    /// A candidate with no text comes back as an empty string; only a response
    /// without candidates is an error.
    fn into_text(self) -> Result<String> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(Error::rejected(SERVICE, format!("Generation blocked: {}", reason)));
        };

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            tracing::warn!(
                "Gemini returned no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            );
        }
        Ok(text)
    }
}

impl GeminiClient {
    /// Create a client from config; the API key is required
    pub fn new(config: &RagConfig) -> Result<Self> {
        let api_key = config
            .gemini
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "{} is not set; add it to the environment or a .env file",
                    crate::config::API_KEY_ENV
                ))
            })?
            .to_string();

        let client = Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.gemini.base_url.trim_end_matches('/').to_string(),
            api_key,
            embed_model: config.gemini.embed_model.clone(),
            generate_model: config.gemini.generate_model.clone(),
            temperature: config.llm.temperature,
            dimensions: config.embeddings.dimensions,
            batch_size: config.embeddings.batch_size.clamp(1, MAX_BATCH),
            retry: RetryPolicy::new(config.llm.max_retries),
        })
    }

    /// Fully qualified model resource name
    fn model_name(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/{}:{}", self.base_url, Self::model_name(model), method)
    }

    fn embed_request(&self, text: &str, task_type: &'static str) -> EmbedContentRequest {
        EmbedContentRequest {
            model: Self::model_name(&self.embed_model),
            content: Content::text(None, text),
            task_type,
        }
    }

    /// POST a JSON body, retrying transient failures
    async fn post_json<B, R>(&self, url: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        self.retry
            .run(SERVICE, || async move {
                let response = self
                    .client
                    .post(url)
                    .header("x-goog-api-key", &self.api_key)
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
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.endpoint(&self.embed_model, "embedContent");
        let request = self.embed_request(text, "RETRIEVAL_QUERY");
        let response: EmbedContentResponse = self.post_json(&url, &request).await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = self.endpoint(&self.embed_model, "batchEmbedContents");
        let mut embeddings = Vec::with_capacity(texts.len());

        for (batch_num, batch) in texts.chunks(self.batch_size).enumerate() {
            tracing::debug!(
                "Embedding batch {} ({} texts) with {}",
                batch_num + 1,
                batch.len(),
                self.embed_model
            );
            let request = BatchEmbedRequest {
                requests: batch
                    .iter()
                    .map(|text| self.embed_request(text, "RETRIEVAL_DOCUMENT"))
                    .collect(),
            };
            let response: BatchEmbedResponse = self.post_json(&url, &request).await?;

            if response.embeddings.len() != batch.len() {
                return Err(Error::rejected(
                    SERVICE,
                    format!(
                        "Expected {} embeddings, got {}",
                        batch.len(),
                        response.embeddings.len()
                    ),
                ));
            }
            embeddings.extend(response.embeddings.into_iter().map(|e| e.values));
        }

        Ok(embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/{}", self.base_url, Self::model_name(&self.embed_model));
        match self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        SERVICE
    }

    fn model(&self) -> &str {
        &self.embed_model
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = self.endpoint(&self.generate_model, "generateContent");
        let body = GenerateRequest {
            system_instruction: request
                .system
                .as_deref()
                .map(|system| Content::text(None, system)),
            contents: vec![Content::text(Some("user"), &request.prompt)],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: request.json_response.then_some("application/json"),
            },
        };

        let response: GenerateResponse = self.post_json(&url, &body).await?;
        response.into_text()
    }

    async fn health_check(&self) -> Result<bool> {
        EmbeddingProvider::health_check(self).await
    }

    fn name(&self) -> &str {
        SERVICE
    }

    fn model(&self) -> &str {
        &self.generate_model
    }
}
