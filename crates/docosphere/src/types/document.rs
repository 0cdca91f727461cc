//! Uploaded document and chunk types

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Anything else
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown,
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Unknown => "Unknown",
        }
    }
}

/// A file uploaded for processing; lives for one processing request
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Original filename
    pub filename: String,
    /// Declared file type
    pub file_type: FileType,
    /// Raw file bytes
    pub data: Vec<u8>,
}

impl UploadedDocument {
    /// Create a document, detecting its type from the filename
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        let filename = filename.into();
        let file_type = FileType::from_filename(&filename);
        Self {
            filename,
            file_type,
            data,
        }
    }

    /// Load a document from disk
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(filename, data))
    }

    /// SHA-256 of the raw bytes, hex encoded
    pub fn content_hash(&self) -> String {
        hex::encode(Sha256::digest(&self.data))
    }
}

/// Record of a document whose text went into the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Original filename
    pub filename: String,
    /// File type
    pub file_type: FileType,
    /// SHA-256 of the uploaded bytes
    pub content_hash: String,
    /// Pages (PDF) or paragraphs (Word) that produced text
    pub text_units: usize,
    /// Characters of extracted text
    pub chars: usize,
}

/// A bounded slice of extracted text, ready for embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Position of the chunk in source order
    pub index: usize,
    /// Chunk text
    pub content: String,
    /// Character offset of the first character in the source text
    pub char_start: usize,
    /// Character offset one past the last character in the source text
    pub char_end: usize,
}

impl TextChunk {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}
