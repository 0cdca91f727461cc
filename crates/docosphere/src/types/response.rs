//! Response types for processing and querying

use serde::{Deserialize, Serialize};

/// Which path the query router took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerRoute {
    /// Answered from the model's own knowledge (one model call)
    ModelKnowledge,
    /// Answered from retrieved document passages (two model calls)
    Documents,
}

impl AnswerRoute {
    /// Status notice shown alongside the answer
    pub fn notice(&self) -> &'static str {
        match self {
            Self::ModelKnowledge => "Answering based on the model's built-in knowledge...",
            Self::Documents => "Searching through your uploaded documents for the answer...",
        }
    }
}

/// Response from a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Final answer text
    pub answer: String,
    /// Route taken by the self-assessment gate
    pub route: AnswerRoute,
    /// Human-readable notice for the route
    pub notice: String,
    /// Number of chunks retrieved (0 on the direct route)
    pub chunks_retrieved: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl QueryResponse {
    /// Create a response for the given route
    pub fn new(
        answer: String,
        route: AnswerRoute,
        chunks_retrieved: usize,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            answer,
            route,
            notice: route.notice().to_string(),
            chunks_retrieved,
            processing_time_ms,
        }
    }
}

/// A file left out of the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
    /// Filename
    pub filename: String,
    /// Why it was skipped
    pub reason: String,
}

/// Response from processing a batch of documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResponse {
    /// Files whose text made it into the index
    pub documents_indexed: Vec<String>,
    /// Files skipped (unreadable, unsupported or without text)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedFile>,
    /// Characters of extracted text
    pub total_chars: usize,
    /// Chunks embedded into the index
    pub total_chunks: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}
