//! Prompt templates for assessment and grounded answering

use crate::retrieval::ScoredChunk;

/// Token the model replies with when it needs the documents
pub const NEED_RETRIEVAL: &str = "NEED_RETRIEVAL";

/// System role shared by every call
pub const SYSTEM_ROLE: &str =
    "You are an expert assistant who provides professionally formatted and formally written answers.";

/// Separator between retrieved passages in the context
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Prompt builder for the assistant
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk texts into the context block
    pub fn build_context(chunks: &[ScoredChunk]) -> String {
        chunks
            .iter()
            .map(|c| c.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    /// Build the grounded answer prompt
    pub fn build_answer_prompt(question: &str, context: &str) -> String {
        format!(
            r#"As a professional assistant, provide a detailed and formally written answer to the question using the provided context. Ensure that the response is professionally formatted and avoids informal language.

Context:
{context}

Question:
{question}

Answer:"#,
            context = context,
            question = question
        )
    }

    /// Build the self-assessment prompt
    ///
    /// The structured form asks for a JSON decision; the plain form asks for the bare
    /// sentinel token.
    pub fn build_assessment_prompt(question: &str, structured: bool) -> String {
        if structured {
            format!(
                r#"If you are confident in answering the following question based on your existing knowledge, provide a detailed and formally written answer directly. If you are not confident or require additional information from the user's documents to answer accurately, do not answer.

Reply with a single JSON object and nothing else:
{{"decision": "answer", "answer": "<your full answer>"}}
or
{{"decision": "need_retrieval", "answer": ""}}

Question: {question}"#,
                question = question
            )
        } else {
            format!(
                r#"If you are confident in answering the following question based on your existing knowledge, please provide a detailed and formally written answer directly. If you are not confident or require additional information to answer accurately, please respond with '{sentinel}'.

Question: {question}"#,
                sentinel = NEED_RETRIEVAL,
                question = question
            )
        }
    }
}
