//! Grounded answer generation from retrieved chunks

use std::sync::Arc;

use crate::error::Result;
use crate::providers::{CompletionRequest, LlmProvider};
use crate::retrieval::ScoredChunk;

use super::prompt::{PromptBuilder, SYSTEM_ROLE};

/// Returned when retrieval finds nothing, without calling the model
pub const NO_RELEVANT_CONTENT: &str = "I apologize, but I couldn't find any relevant information in the provided documents to answer your question.";

/// Answers a question from retrieved context
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate an answer grounded in `chunks`
    pub async fn generate(&self, question: &str, chunks: &[ScoredChunk]) -> Result<String> {
        if chunks.is_empty() {
            return Ok(NO_RELEVANT_CONTENT.to_string());
        }

        let context = PromptBuilder::build_context(chunks);
        let request = CompletionRequest::new(PromptBuilder::build_answer_prompt(question, &context))
            .with_system(SYSTEM_ROLE);

        tracing::debug!(
            "Generating answer from {} chunks ({} chars of context) with {}",
            chunks.len(),
            context.len(),
            self.llm.model()
        );

        self.llm.complete(&request).await
    }
}
