//! Self-assessment gate deciding between a direct answer and document retrieval

use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::providers::{CompletionRequest, LlmProvider};
use crate::retrieval::Retriever;
use crate::types::{AnswerRoute, QueryResponse};

use super::generator::AnswerGenerator;
use super::prompt::{PromptBuilder, NEED_RETRIEVAL, SYSTEM_ROLE};

/// Outcome of the assessment call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assessment {
    /// The model answered from its own knowledge
    Direct(String),
    /// The model asked for the documents
    NeedRetrieval,
}

#[derive(Deserialize)]
struct AssessmentReply {
    decision: String,
    #[serde(default)]
    answer: Option<String>,
}

impl Assessment {
    /// Interpret the model's reply
    ///
    /// A JSON decision wins when present; anything else is compared to the sentinel
    /// after normalisation. Empty answers route to retrieval.
    pub fn parse(raw: &str) -> Self {
        if let Some(reply) = Self::parse_structured(raw) {
            let decision = reply.decision.trim().to_ascii_lowercase().replace([' ', '-'], "_");
            let answer = reply.answer.unwrap_or_default();
            return match decision.as_str() {
                "answer" if !answer.trim().is_empty() && !is_sentinel(&answer) => {
                    Self::Direct(answer.trim().to_string())
                }
                _ => Self::NeedRetrieval,
            };
        }

        let text = raw.trim();
        if text.is_empty() || is_sentinel(text) {
            Self::NeedRetrieval
        } else {
            Self::Direct(text.to_string())
        }
    }

    fn parse_structured(raw: &str) -> Option<AssessmentReply> {
        let text = raw.trim();
        let text = text
            .strip_prefix("```json")
            .or_else(|| text.strip_prefix("```"))
            .and_then(|t| t.strip_suffix("```"))
            .unwrap_or(text)
            .trim();
        if !text.starts_with('{') {
            return None;
        }
        serde_json::from_str(text).ok()
    }
}

/// Whether `text` is the retrieval sentinel, ignoring case, spacing and wrapping punctuation
fn is_sentinel(text: &str) -> bool {
    let normalized = text
        .trim_matches(|c: char| {
            c.is_whitespace()
                || matches!(c, '"' | '\'' | '`' | '*' | '.' | '!' | ',' | ';' | ':')
        })
        .replace([' ', '-'], "_");
    normalized.eq_ignore_ascii_case(NEED_RETRIEVAL)
}

/// Routes each question through the self-assessment gate
pub struct QueryRouter {
    llm: Arc<dyn LlmProvider>,
    retriever: Retriever,
    generator: AnswerGenerator,
    structured: bool,
}

impl QueryRouter {
    pub fn new(llm: Arc<dyn LlmProvider>, retriever: Retriever, structured: bool) -> Self {
        Self {
            generator: AnswerGenerator::new(llm.clone()),
            llm,
            retriever,
            structured,
        }
    }

    /// Run the assessment call and interpret it
    pub async fn assess(&self, question: &str) -> Result<Assessment> {
        let mut request =
            CompletionRequest::new(PromptBuilder::build_assessment_prompt(question, self.structured))
                .with_system(SYSTEM_ROLE);
        if self.structured {
            request = request.json();
        }

        let raw = self.llm.complete(&request).await?;
        Ok(Assessment::parse(&raw))
    }

    /// Answer a question with one or two model calls
    pub async fn ask(&self, question: &str) -> Result<QueryResponse> {
        let start = Instant::now();
        let question = question.trim();

        if question.is_empty() {
            return Err(Error::InvalidRequest("Question cannot be empty".to_string()));
        }

        let (answer, route, chunks_retrieved) = match self.assess(question).await? {
            Assessment::Direct(answer) => {
                tracing::info!("Answering from model knowledge");
                (answer, AnswerRoute::ModelKnowledge, 0)
            }
            Assessment::NeedRetrieval => {
                tracing::info!("Searching documents (top {})", self.retriever.top_k());
                let chunks = self.retriever.retrieve(question).await?;
                let answer = self.generator.generate(question, &chunks).await?;
                (answer, AnswerRoute::Documents, chunks.len())
            }
        };

        let processing_time_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Answered via {:?} in {}ms ({} chunks)",
            route,
            processing_time_ms,
            chunks_retrieved
        );

        Ok(QueryResponse::new(
            answer,
            route,
            chunks_retrieved,
            processing_time_ms,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_variants() {
        for raw in [
            "NEED_RETRIEVAL",
            "  need_retrieval\n",
            "'NEED_RETRIEVAL'",
            "`NEED_RETRIEVAL`.",
            "\"Need_Retrieval\"",
            "**NEED_RETRIEVAL**",
            "**NEED_RETRIEVAL**.",
            "\"NEED_RETRIEVAL\".",
            "NEED_RETRIEVAL.\"",
            "NEED RETRIEVAL",
        ] {
            assert_eq!(Assessment::parse(raw), Assessment::NeedRetrieval, "{:?}", raw);
        }
    }

    #[test]
    fn test_plain_answer_is_direct() {
        assert_eq!(
            Assessment::parse("  2 + 2 equals 4.  "),
            Assessment::Direct("2 + 2 equals 4.".to_string())
        );
    }

    #[test]
    fn test_sentinel_inside_sentence_is_direct() {
        // Only a bare sentinel triggers retrieval
        assert!(matches!(
            Assessment::parse("I would reply NEED_RETRIEVAL if unsure, but the answer is 4."),
            Assessment::Direct(_)
        ));
    }

    #[test]
    fn test_empty_reply_needs_retrieval() {
        assert_eq!(Assessment::parse("   "), Assessment::NeedRetrieval);
    }

    #[test]
    fn test_structured_decisions() {
        assert_eq!(
            Assessment::parse(r#"{"decision": "answer", "answer": "The answer is 4."}"#),
            Assessment::Direct("The answer is 4.".to_string())
        );
        assert_eq!(
            Assessment::parse(r#"{"decision": "need_retrieval", "answer": ""}"#),
            Assessment::NeedRetrieval
        );
        assert_eq!(
            Assessment::parse("```json\n{\"decision\": \"NEED_RETRIEVAL\"}\n```"),
            Assessment::NeedRetrieval
        );
    }

    #[test]
    fn test_structured_answer_without_text_needs_retrieval() {
        assert_eq!(
            Assessment::parse(r#"{"decision": "answer", "answer": "  "}"#),
            Assessment::NeedRetrieval
        );
        assert_eq!(
            Assessment::parse(r#"{"decision": "answer", "answer": "NEED_RETRIEVAL"}"#),
            Assessment::NeedRetrieval
        );
    }

    #[test]
    fn test_unknown_decision_needs_retrieval() {
        assert_eq!(
            Assessment::parse(r#"{"decision": "maybe", "answer": "perhaps"}"#),
            Assessment::NeedRetrieval
        );
    }
}
