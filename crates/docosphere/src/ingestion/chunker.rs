//! Overlapping text chunking that prefers natural boundaries

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::TextChunk;

/// Candidate split points (byte offsets), coarsest level first
struct Boundaries {
    levels: [Vec<usize>; 4],
}

impl Boundaries {
    fn find(text: &str) -> Self {
        // Paragraph: right after a blank line
        let paragraphs = text
            .match_indices("\n\n")
            .map(|(i, sep)| i + sep.len())
            .collect();

        // Line: right after a newline
        let lines = text.match_indices('\n').map(|(i, _)| i + 1).collect();

        // Sentence: start of each sentence segment (segments carry their trailing space)
        let sentences = text
            .split_sentence_bound_indices()
            .map(|(i, _)| i)
            .filter(|&i| i > 0)
            .collect();

        // Word: right after a run of whitespace
        let words = text
            .split_word_bound_indices()
            .filter(|(_, segment)| segment.chars().all(char::is_whitespace))
            .map(|(i, segment)| i + segment.len())
            .collect();

        Self {
            levels: [paragraphs, lines, sentences, words],
        }
    }

    /// Latest boundary in `[lo, hi]` from the coarsest level that has one
    fn best_split(&self, lo: usize, hi: usize) -> Option<usize> {
        self.levels.iter().find_map(|level| {
            let idx = level.partition_point(|&b| b <= hi);
            (idx > 0 && level[idx - 1] >= lo).then(|| level[idx - 1])
        })
    }
}

/// Text chunker with configurable size and overlap (both in characters)
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters shared by consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; the overlap must be smaller than the chunk size
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk size must be positive".to_string()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Create from config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum chunk size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into chunks in source order
    ///
    /// Every chunk is an exact slice of `text` of at most `chunk_size` characters, and each
    /// chunk after the first starts exactly `overlap` characters before its predecessor ends.
    /// A chunk ends on the last paragraph break inside its window, else the last line break,
    /// sentence start or word start, and only as a last resort mid-word.
    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Byte offset of every char, plus the end of the text
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = offsets.len() - 1;
        let boundaries = Boundaries::find(text);

        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let end = if total - start <= self.chunk_size {
                total
            } else {
                // A split must leave more than `overlap` chars so the next chunk moves forward
                let lo = offsets[start + self.overlap + 1];
                let hi = offsets[start + self.chunk_size];
                boundaries
                    .best_split(lo, hi)
                    .map(|byte| offsets.binary_search(&byte).unwrap_or_else(|i| i))
                    .unwrap_or(start + self.chunk_size)
            };

            chunks.push(TextChunk {
                index: chunks.len(),
                content: text[offsets[start]..offsets[end]].to_string(),
                char_start: start,
                char_end: end,
            });

            if end == total {
                break;
            }
            start = end - self.overlap;
        }

        tracing::debug!(
            "Split {} chars into {} chunks (size {}, overlap {})",
            total,
            chunks.len(),
            self.chunk_size,
            self.overlap
        );

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Rebuild the source by dropping each successor's overlap
    fn stitch(chunks: &[TextChunk]) -> String {
        let mut out = String::new();
        let mut covered = 0usize;
        for chunk in chunks {
            let skip = covered.saturating_sub(chunk.char_start);
            out.extend(chunk.content.chars().skip(skip));
            covered = chunk.char_end;
        }
        out
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(100, 100).is_err());
        assert!(TextChunker::new(100, 99).is_ok());
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = TextChunker::new(100, 10).unwrap();
        let chunks = chunker.split("The capital of France is Paris.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "The capital of France is Paris.");
    }

    #[test]
    fn test_blank_text_no_chunks() {
        let chunker = TextChunker::new(100, 10).unwrap();
        assert!(chunker.split("").is_empty());
        assert!(chunker.split(" \n\n\t").is_empty());
    }

    #[test]
    fn test_prefers_paragraph_boundary() {
        let chunker = TextChunker::new(40, 5).unwrap();
        let text = "First paragraph is here.\n\nSecond paragraph follows it.";
        let chunks = chunker.split(text);

        assert_eq!(chunks[0].content, "First paragraph is here.\n\n");
        assert!(chunks[1].content.ends_with("Second paragraph follows it."));
        assert_eq!(stitch(&chunks), text);
    }

    #[test]
    fn test_prefers_word_over_hard_cut() {
        let chunker = TextChunker::new(12, 2).unwrap();
        let chunks = chunker.split("alpha beta gamma delta");

        // "alpha beta " fits in 12 chars and ends after whitespace
        assert_eq!(chunks[0].content, "alpha beta ");
        assert_eq!(stitch(&chunks), "alpha beta gamma delta");
    }

    #[test]
    fn test_hard_cut_without_boundaries() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let chunks = chunker.split("abcdefghij");

        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_multibyte_text() {
        let chunker = TextChunker::new(5, 2).unwrap();
        let text = "日本語のテキストを分割する";
        let chunks = chunker.split(text);

        assert!(chunks.iter().all(|c| c.content.chars().count() <= 5));
        assert_eq!(stitch(&chunks), text);
    }

    proptest! {
        #[test]
        fn prop_chunks_bounded_overlapping_and_lossless(
            text in "[a-zA-Z0-9 .,!?\n\u{e9}\u{4e16}]{1,400}",
            size in 1usize..60,
            overlap_seed in 0usize..60,
        ) {
            let overlap = overlap_seed % size;
            let chunker = TextChunker::new(size, overlap).unwrap();
            let chunks = chunker.split(&text);

            if text.trim().is_empty() {
                prop_assert!(chunks.is_empty());
            } else {
                for chunk in &chunks {
                    prop_assert!(chunk.char_len() <= size);
                    prop_assert_eq!(chunk.content.chars().count(), chunk.char_len());
                }
                for pair in chunks.windows(2) {
                    prop_assert_eq!(pair[1].char_start, pair[0].char_end - overlap);
                }
                prop_assert_eq!(stitch(&chunks), text);
            }
        }
    }
}
