//! PDF and Word file parsing

use crate::error::{Error, Result};
use crate::types::FileType;

/// How long the whole-document PDF fallback may run before it is abandoned
const PDF_FALLBACK_TIMEOUT_SECS: u64 = 60;

/// Clean up PDF text: glyph-name artefacts, ligatures, stray NULs and ragged line ends
fn cleanup_pdf_text(text: &str) -> String {
    const GLYPHS: &[(&str, &str)] = &[
        ("uni00A0", " "),
        ("uni2010", "-"),
        ("uni2011", "-"),
        ("uni2013", "-"),
        ("uni2014", "--"),
        ("uni2018", "'"),
        ("uni2019", "'"),
        ("uni201C", "\""),
        ("uni201D", "\""),
        ("uni2022", "* "),
        ("uni2026", "..."),
    ];

    let mut result = text.replace('\0', "");
    for (glyph_name, replacement) in GLYPHS {
        if result.contains(glyph_name) {
            result = result.replace(glyph_name, replacement);
        }
    }

    let result = result
        .replace('\u{00A0}', " ") // Non-breaking space -> space
        .replace('\u{FB00}', "ff") // ff ligature
        .replace('\u{FB01}', "fi") // fi ligature
        .replace('\u{FB02}', "fl") // fl ligature
        .replace('\u{FB03}', "ffi") // ffi ligature
        .replace('\u{FB04}', "ffl"); // ffl ligature

    // Trim line ends and keep at most one blank line between paragraphs
    let mut cleaned = String::with_capacity(result.len());
    let mut blank_run = 0usize;
    for line in result.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 || cleaned.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        if !cleaned.is_empty() {
            cleaned.push('\n');
        }
        cleaned.push_str(line);
    }

    cleaned.trim_end().to_string()
}

/// Parsed document with extracted text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text, units joined in document order
    pub content: String,
    /// Non-empty text units: pages for PDF, paragraphs for Word
    pub units: Vec<TextUnit>,
}

impl ParsedDocument {
    fn from_units(file_type: FileType, units: Vec<TextUnit>) -> Self {
        let content = units
            .iter()
            .map(|u| u.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            file_type,
            content,
            units,
        }
    }

    /// Whether any text was found
    pub fn has_text(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// A page or paragraph of extracted text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    /// Page or paragraph number (1-indexed)
    pub number: u32,
    /// Text content
    pub content: String,
}

/// PDF / Word file parser
pub struct FileParser;

impl FileParser {
    /// Parse a file according to its type
    ///
    /// Returns an empty document (not an error) when a readable file simply has no text,
    /// e.g. a scanned PDF.
    pub fn parse(filename: &str, file_type: FileType, data: &[u8]) -> Result<ParsedDocument> {
        match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Docx => Self::parse_docx(filename, data),
            FileType::Unknown => {
                let ext = filename.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
                Err(Error::UnsupportedFileType(format!(".{} ({})", ext, filename)))
            }
        }
    }

    /// Parse PDF page by page, skipping pages without text
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let units = match lopdf::Document::load_mem(data) {
            Ok(doc) => Self::extract_pdf_pages(filename, &doc),
            Err(e) => {
                tracing::warn!("lopdf could not load {}: {}, trying pdf-extract", filename, e);
                Vec::new()
            }
        };

        if !units.is_empty() {
            return Ok(ParsedDocument::from_units(FileType::Pdf, units));
        }

        // No page text via lopdf: try the whole document with pdf-extract
        let text = Self::extract_pdf_with_timeout(filename, data)?;
        let text = cleanup_pdf_text(&text);
        let units = if text.trim().is_empty() {
            tracing::warn!("{} has no extractable text (image-only pages?)", filename);
            Vec::new()
        } else {
            vec![TextUnit {
                number: 1,
                content: text,
            }]
        };

        Ok(ParsedDocument::from_units(FileType::Pdf, units))
    }

    /// Extract each page in order; pages that fail or yield nothing are skipped
    fn extract_pdf_pages(filename: &str, doc: &lopdf::Document) -> Vec<TextUnit> {
        let mut units = Vec::new();

        // get_pages is a BTreeMap keyed by page number, so iteration is in page order
        for page_number in doc.get_pages().keys().copied() {
            match doc.extract_text(&[page_number]) {
                Ok(text) => {
                    let text = cleanup_pdf_text(&text);
                    if text.trim().is_empty() {
                        tracing::debug!("{}: page {} has no text, skipping", filename, page_number);
                        continue;
                    }
                    units.push(TextUnit {
                        number: page_number,
                        content: text,
                    });
                }
                Err(e) => {
                    tracing::debug!("{}: could not extract page {}: {}", filename, page_number, e);
                }
            }
        }

        units
    }

    /// Extract PDF text on a worker thread with a bounded wait
    ///
    /// pdf-extract can hang or panic on problematic fonts; a panic surfaces as a
    /// disconnected channel.
    fn extract_pdf_with_timeout(filename: &str, data: &[u8]) -> Result<String> {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result.map_err(|e| e.to_string()));
        });

        match rx.recv_timeout(Duration::from_secs(PDF_FALLBACK_TIMEOUT_SECS)) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(Error::file_parse(filename, e)),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(Error::file_parse(
                filename,
                format!("PDF extraction timed out after {}s", PDF_FALLBACK_TIMEOUT_SECS),
            )),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(Error::file_parse(filename, "PDF extraction crashed"))
            }
        }
    }

    /// Parse DOCX paragraphs in document order
    fn parse_docx(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = docx_rs::read_docx(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut units = Vec::new();
        let mut paragraph_number = 0u32;

        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                paragraph_number += 1;
                let mut text = String::new();
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            match child {
                                docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                                docx_rs::RunChild::Tab(_) => text.push('\t'),
                                _ => {}
                            }
                        }
                    }
                }
                if !text.trim().is_empty() {
                    units.push(TextUnit {
                        number: paragraph_number,
                        content: text,
                    });
                }
            }
        }

        Ok(ParsedDocument::from_units(FileType::Docx, units))
    }
}

#[cfg(test)]
pub(crate) mod test_files {
    //! Builders for small in-memory PDF and DOCX files

    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// Build a PDF with one page per entry; `None` produces a page without text
    pub fn pdf(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids = Vec::new();
        for page in pages {
            let operations = match page {
                Some(text) => vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
                None => vec![],
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save pdf");
        bytes
    }

    /// Build a DOCX with one paragraph per entry
    pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
        use docx_rs::{Docx, Paragraph, Run};

        let mut docx = Docx::new();
        for text in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
        }

        let mut cursor = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut cursor).expect("pack docx");
        cursor.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_pdf_text() {
        let cleaned = cleanup_pdf_text("e\u{FB03}cient   \n\n\n\nnext\0 line  \n");
        assert_eq!(cleaned, "efficient\n\nnext line");
    }

    #[test]
    fn test_parse_pdf_pages_in_order() {
        let data = test_files::pdf(&[Some("First page text."), None, Some("Third page text.")]);
        let parsed = FileParser::parse("doc.pdf", FileType::Pdf, &data).unwrap();

        assert_eq!(parsed.units.len(), 2);
        assert_eq!(parsed.units[0].number, 1);
        assert_eq!(parsed.units[1].number, 3);
        let first = parsed.content.find("First").unwrap();
        let third = parsed.content.find("Third").unwrap();
        assert!(first < third);
    }

    #[test]
    fn test_parse_docx_paragraphs() {
        let data = test_files::docx(&["Alpha paragraph.", "", "Beta paragraph."]);
        let parsed = FileParser::parse("doc.docx", FileType::Docx, &data).unwrap();

        assert_eq!(parsed.content, "Alpha paragraph.\nBeta paragraph.");
        assert_eq!(parsed.units.len(), 2);
    }

    #[test]
    fn test_corrupt_pdf_is_an_error() {
        let result = FileParser::parse("broken.pdf", FileType::Pdf, b"%PDF-1.4 not really a pdf");
        assert!(matches!(result, Err(Error::FileParse { .. })));
    }

    #[test]
    fn test_corrupt_docx_is_an_error() {
        let result = FileParser::parse("broken.docx", FileType::Docx, b"PK not a zip");
        assert!(matches!(result, Err(Error::FileParse { .. })));
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = FileParser::parse("notes.txt", FileType::Unknown, b"hello");
        assert!(matches!(result, Err(Error::UnsupportedFileType(_))));
    }
}
