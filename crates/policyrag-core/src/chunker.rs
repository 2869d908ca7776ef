//! Fixed-size character chunking of page-ordered document text.
//!
//! Boundaries are pure character offsets (Unicode scalar values), not word or
//! sentence aware. Each page is sliced independently, so `chunk_id` is stable
//! per page even when some slices are dropped for being blank.

use crate::types::{Chunk, ChunkMetadata};

pub const DEFAULT_CHUNK_SIZE: usize = 500;

#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self { chunk_size: DEFAULT_CHUNK_SIZE }
    }
}

impl Chunker {
    /// `chunk_size` is clamped to at least one character.
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size: chunk_size.max(1) }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk(&self, pages: &[(u32, String)], source: &str) -> Vec<Chunk> {
        chunk_pages(pages, self.chunk_size, source)
    }
}

/// Contiguous, non-overlapping, untrimmed slices of at most `size` characters.
/// Concatenating them yields `text` exactly.
pub fn char_spans(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut spans = Vec::new();
    let mut start = 0usize;
    let mut chars_in_span = 0usize;
    for (byte_idx, _) in text.char_indices() {
        if chars_in_span == size {
            spans.push(&text[start..byte_idx]);
            start = byte_idx;
            chars_in_span = 0;
        }
        chars_in_span += 1;
    }
    if start < text.len() {
        spans.push(&text[start..]);
    }
    spans
}

/// Split every page into trimmed, non-empty chunks tagged with provenance.
pub fn chunk_pages(pages: &[(u32, String)], chunk_size: usize, source: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for (page, text) in pages {
        for (slot, span) in char_spans(text, chunk_size).into_iter().enumerate() {
            let trimmed = span.trim();
            if trimmed.is_empty() {
                continue;
            }
            chunks.push(Chunk {
                text: trimmed.to_string(),
                metadata: ChunkMetadata {
                    source: source.to_string(),
                    page: *page,
                    chunk_id: u32::try_from(slot).unwrap_or(u32::MAX),
                },
            });
        }
    }
    chunks
}
