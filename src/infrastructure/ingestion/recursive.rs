//! Recursive boundary-preferring text splitter

use unicode_segmentation::UnicodeSegmentation;

use crate::domain::ingestion::{ChunkingConfig, TextSplitter};
use crate::domain::knowledge_base::{Metadata, TextChunk};

/// Splits text into windows of at most `chunk_size` characters.
///
/// Each window ends at the last paragraph break it contains, else the last
/// sentence break, else the last whitespace, else at the hard size limit.
/// The next window starts exactly `chunk_overlap` characters before the
/// previous end, so consecutive chunks share that many characters.
#[derive(Debug, Clone, Default)]
pub struct RecursiveCharacterSplitter {
    config: ChunkingConfig,
}

impl RecursiveCharacterSplitter {
    /// The config is expected to be validated by the caller.
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }
}

impl TextSplitter for RecursiveCharacterSplitter {
    fn split(&self, text: &str, metadata: &Metadata) -> Vec<TextChunk> {
        let text = text.trim();

        if text.is_empty() {
            return Vec::new();
        }

        let offsets = CharOffsets::new(text);
        let total = offsets.len();
        let size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap.min(size - 1);

        if total <= size {
            return vec![TextChunk::new(text, metadata.clone())];
        }

        let breaks = BreakPoints::scan(text, &offsets);
        let mut chunks = Vec::with_capacity(total / (size - overlap) + 1);
        let mut start = 0;

        loop {
            if total - start <= size {
                chunks.push(TextChunk::new(offsets.slice(text, start, total), metadata.clone()));
                break;
            }

            let end = breaks
                .best_before(start + overlap, start + size)
                .unwrap_or(start + size);

            chunks.push(TextChunk::new(offsets.slice(text, start, end), metadata.clone()));
            start = end - overlap;
        }

        chunks
    }

    fn config(&self) -> ChunkingConfig {
        self.config
    }

    fn name(&self) -> &'static str {
        "recursive_character"
    }
}

/// Byte offset of every char, plus the total byte length at the end
struct CharOffsets(Vec<usize>);

impl CharOffsets {
    fn new(text: &str) -> Self {
        let mut offsets: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        offsets.push(text.len());
        Self(offsets)
    }

    fn len(&self) -> usize {
        self.0.len() - 1
    }

    fn slice<'a>(&self, text: &'a str, start: usize, end: usize) -> &'a str {
        &text[self.0[start]..self.0[end]]
    }

    fn char_at_byte(&self, byte: usize) -> usize {
        self.0.partition_point(|&b| b < byte)
    }
}

/// Candidate break positions (char offsets a chunk may end at), strongest first
struct BreakPoints {
    levels: [Vec<usize>; 3],
}

impl BreakPoints {
    fn scan(text: &str, offsets: &CharOffsets) -> Self {
        let paragraphs = text
            .match_indices("\n\n")
            .map(|(b, sep)| offsets.char_at_byte(b + sep.len()))
            .collect();

        let sentences = text
            .split_sentence_bound_indices()
            .map(|(b, _)| b)
            .filter(|&b| b > 0)
            .map(|b| offsets.char_at_byte(b))
            .collect();

        let words = text
            .chars()
            .enumerate()
            .filter(|(_, c)| c.is_whitespace())
            .map(|(i, _)| i + 1)
            .collect();

        Self {
            levels: [paragraphs, sentences, words],
        }
    }

    /// The last break in `(after, up_to]` at the strongest level that has one
    fn best_before(&self, after: usize, up_to: usize) -> Option<usize> {
        self.levels.iter().find_map(|points| {
            let idx = points.partition_point(|&p| p <= up_to);
            (idx > 0 && points[idx - 1] > after).then(|| points[idx - 1])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn splitter(size: usize, overlap: usize) -> RecursiveCharacterSplitter {
        RecursiveCharacterSplitter::new(ChunkingConfig::new(size, overlap).unwrap())
    }

    fn meta() -> Metadata {
        json!({"fileName": "notes.pdf", "documentId": "doc-1", "pageCount": 3})
            .as_object()
            .cloned()
            .unwrap()
    }

    fn long_text() -> String {
        let paragraph = "Retrieval systems split documents into chunks. Each chunk is embedded \
            separately and stored with its metadata. Queries embed the question and look up \
            the nearest chunks by cosine similarity.";
        (0..12)
            .map(|i| format!("Section {}. {}", i, paragraph))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn assert_overlap(chunks: &[TextChunk], overlap: usize) {
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].content.chars().collect();
            let next: Vec<char> = pair[1].content.chars().collect();
            let tail = &prev[prev.len() - overlap..];
            let head = &next[..overlap];
            assert_eq!(tail, head, "overlap mismatch between consecutive chunks");
        }
    }

    #[test]
    fn test_empty_and_whitespace_yield_nothing() {
        let splitter = splitter(100, 20);
        assert!(splitter.split("", &meta()).is_empty());
        assert!(splitter.split("   \n\t  \n", &meta()).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = splitter(1000, 200).split("  The sky is blue.  ", &meta());

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "The sky is blue.");
        assert_eq!(chunks[0].metadata, meta());
    }

    #[test]
    fn test_chunks_respect_size_and_overlap() {
        for (size, overlap) in [(200, 50), (120, 0), (300, 100), (64, 63)] {
            let chunks = splitter(size, overlap).split(&long_text(), &meta());

            assert!(chunks.len() > 1);
            assert!(chunks.iter().all(|c| c.content.chars().count() <= size));
            assert_overlap(&chunks, overlap);
        }
    }

    #[test]
    fn test_chunks_reassemble_to_original() {
        let text = long_text();
        let overlap = 40;
        let chunks = splitter(180, overlap).split(&text, &meta());

        let mut rebuilt: String = chunks[0].content.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.content.chars().skip(overlap));
        }

        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let text = format!("{}\n\n{}", "a".repeat(60), "b".repeat(60));
        let chunks = splitter(100, 10).split(&text, &meta());

        assert!(chunks[0].content.ends_with("\n\n"));
        assert_eq!(chunks[0].content.chars().count(), 62);
    }

    #[test]
    fn test_falls_back_to_sentence_then_word_breaks() {
        let text = "First sentence here. Second sentence follows it. Third one ends the text now.";
        let chunks = splitter(40, 5).split(text, &meta());

        assert_eq!(chunks[0].content, "First sentence here. ");

        let words = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = splitter(20, 0).split(words, &meta());
        assert!(chunks.iter().all(|c| !c.content.starts_with(' ')));
        assert_eq!(chunks[0].content, "alpha beta gamma ");
    }

    #[test]
    fn test_hard_cut_without_boundaries() {
        let text = "x".repeat(250);
        let chunks = splitter(100, 20).split(&text, &meta());

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content.len(), 100);
        assert_eq!(chunks[1].content.len(), 100);
        assert_eq!(chunks[2].content.len(), 90);
        assert_overlap(&chunks, 20);
    }

    #[test]
    fn test_multibyte_text() {
        let text = "Grüße aus Köln! Ünïcödé façade café naïve. ".repeat(20);
        let chunks = splitter(50, 10).split(&text, &meta());

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 50));
        assert_overlap(&chunks, 10);
    }

    #[test]
    fn test_splitting_is_deterministic() {
        let splitter = splitter(150, 30);
        let first = splitter.split(&long_text(), &meta());
        let second = splitter.split(&long_text(), &meta());

        assert_eq!(first, second);
    }

    #[test]
    fn test_every_chunk_inherits_metadata() {
        let chunks = splitter(100, 10).split(&long_text(), &meta());
        assert!(chunks.iter().all(|c| c.metadata == meta()));
    }

    #[test]
    fn test_name_and_config() {
        let splitter = RecursiveCharacterSplitter::default();
        assert_eq!(splitter.name(), "recursive_character");
        assert_eq!(splitter.config(), ChunkingConfig::default());
    }
}
