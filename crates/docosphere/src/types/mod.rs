//! Core types for the document Q&A system

pub mod document;
pub mod query;
pub mod response;

pub use document::{FileType, SourceRecord, TextChunk, UploadedDocument};
pub use query::QueryRequest;
pub use response::{AnswerRoute, ProcessResponse, QueryResponse, SkippedFile};
