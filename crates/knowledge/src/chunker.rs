//! Fixed-size overlapping chunking, measured in characters.

use crate::loader::SourceDocument;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Half-open `[start, end)` character range of a chunk in its source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharSpan {
    pub start: usize,
    pub end: usize,
}

impl CharSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A contiguous window of a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Content-derived identifier, stable across rebuilds of the same text
    pub id: String,
    pub source_document: String,
    pub sequence_index: usize,
    pub text: String,
    pub char_span: CharSpan,
}

impl DocumentChunk {
    fn new(source_document: &str, sequence_index: usize, text: String, char_span: CharSpan) -> Self {
        Self {
            id: chunk_id(source_document, sequence_index, &text),
            source_document: source_document.to_string(),
            sequence_index,
            text,
            char_span,
        }
    }
}

/// sha256 over (source, sequence, text), truncated to 16 hex characters.
fn chunk_id(source_document: &str, sequence_index: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_document.as_bytes());
    hasher.update([0u8]);
    // Fixed width so ids match across 32- and 64-bit builds.
    hasher.update((sequence_index as u64).to_le_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

/// Split a document into windows of `chunk_size` characters, consecutive
/// windows sharing `overlap` characters.
///
/// Windows never split a code point. Whitespace-only windows are skipped,
/// but sequence indices stay dense.
pub fn chunk_document(doc: &SourceDocument, chunk_size: usize, overlap: usize) -> Vec<DocumentChunk> {
    let chunk_size = chunk_size.max(1);
    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    // Byte offset of every char, plus the end of the text.
    let mut boundaries: Vec<usize> = doc.text.char_indices().map(|(i, _)| i).collect();
    let char_count = boundaries.len();
    boundaries.push(doc.text.len());

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < char_count {
        let end = (start + chunk_size).min(char_count);
        let text = &doc.text[boundaries[start]..boundaries[end]];

        if !text.trim().is_empty() {
            chunks.push(DocumentChunk::new(
                &doc.name,
                chunks.len(),
                text.to_string(),
                CharSpan { start, end },
            ));
        }

        if end == char_count {
            break;
        }
        start += step;
    }

    tracing::debug!(
        document = %doc.name,
        chunks = chunks.len(),
        chunk_size,
        overlap,
        "Chunked document"
    );

    chunks
}

/// Chunk every document, in document order.
pub fn chunk_documents(docs: &[SourceDocument], chunk_size: usize, overlap: usize) -> Vec<DocumentChunk> {
    docs.iter()
        .flat_map(|d| chunk_document(d, chunk_size, overlap))
        .collect()
}
