//! Document ingestion: parsing, extraction, chunking and index building

pub mod chunker;
pub mod extractor;
pub mod parser;
pub mod pipeline;

pub use chunker::TextChunker;
pub use extractor::{Extraction, TextExtractor, DOCUMENT_SEPARATOR};
pub use parser::{FileParser, ParsedDocument, TextUnit};
pub use pipeline::IngestPipeline;
