//! Text extraction across a batch of uploaded documents

use crate::types::{SkippedFile, SourceRecord, UploadedDocument};

use super::parser::FileParser;

/// Inserted between the text of consecutive documents so the last words of one
/// document never run into the first words of the next
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Combined text of a batch plus what happened to each file
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Text of all readable documents, in upload order
    pub text: String,
    /// Documents that contributed text
    pub sources: Vec<SourceRecord>,
    /// Documents that contributed nothing
    pub skipped: Vec<SkippedFile>,
}

impl Extraction {
    /// True when there is nothing to index
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Extracts plain text from PDF and Word uploads
pub struct TextExtractor;

impl TextExtractor {
    /// Extract text from every document; unreadable files are skipped, never fatal
    pub fn extract(documents: &[UploadedDocument]) -> Extraction {
        let mut extraction = Extraction::default();

        for doc in documents {
            let parsed = match FileParser::parse(&doc.filename, doc.file_type, &doc.data) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", doc.filename, e);
                    extraction.skipped.push(SkippedFile {
                        filename: doc.filename.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if !parsed.has_text() {
                tracing::warn!("Skipping {}: no readable text", doc.filename);
                extraction.skipped.push(SkippedFile {
                    filename: doc.filename.clone(),
                    reason: "No readable text".to_string(),
                });
                continue;
            }

            tracing::info!(
                "Extracted {} chars from {} ({} {})",
                parsed.content.chars().count(),
                doc.filename,
                parsed.units.len(),
                doc.file_type.display_name()
            );

            if !extraction.text.is_empty() {
                extraction.text.push_str(DOCUMENT_SEPARATOR);
            }
            extraction.text.push_str(&parsed.content);
            extraction.sources.push(SourceRecord {
                filename: doc.filename.clone(),
                file_type: doc.file_type,
                content_hash: doc.content_hash(),
                text_units: parsed.units.len(),
                chars: parsed.content.chars().count(),
            });
        }

        extraction
    }
}
