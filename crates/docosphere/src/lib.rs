//! docosphere: document question answering over PDF and Word files
//!
//! Uploaded documents are parsed, chunked and embedded into a persistent vector index.
//! Each question first goes to the model for a self-assessment; questions it cannot answer
//! confidently are answered from the most similar document chunks instead.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::{AnswerGenerator, QueryRouter};
pub use ingestion::{IngestPipeline, TextChunker, TextExtractor};
pub use providers::{EmbeddingProvider, LlmProvider, Providers};
pub use retrieval::{IndexStore, Indexer, Retriever, VectorIndex};
pub use types::{
    document::{FileType, SourceRecord, TextChunk, UploadedDocument},
    query::QueryRequest,
    response::{AnswerRoute, ProcessResponse, QueryResponse},
};
