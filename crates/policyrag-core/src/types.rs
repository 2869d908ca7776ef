//! Domain types shared by the chunker, the embedder, the vector index and the
//! answering pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Provenance of a chunk: which file, which page, which fixed-size slot.
///
/// - `source`: file name of the ingested document (no directory part)
/// - `page`: 1-based page number in the source
/// - `chunk_id`: start character offset within the page divided by the chunk size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub page: u32,
    pub chunk_id: u32,
}

impl fmt::Display for ChunkMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "source={}, page={}, chunk_id={}", self.source, self.page, self.chunk_id)
    }
}

/// The atomic retrieval unit produced by the chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Record id, stable across re-ingestion of the same file.
    pub fn record_id(&self) -> String {
        record_id(&self.metadata)
    }
}

pub fn record_id(meta: &ChunkMetadata) -> String {
    format!("{}_p{}_c{}", meta.source, meta.page, meta.chunk_id)
}

/// One row handed to [`crate::traits::VectorIndex::write`].
#[derive(Debug, Clone)]
pub struct IndexRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: ChunkMetadata,
}

impl IndexRecord {
    pub fn from_chunk(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self { id: chunk.record_id(), vector, text: chunk.text, metadata: chunk.metadata }
    }
}

/// What a collection is created with. The embedder id pins the vector space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub dim: usize,
    pub embedder_id: String,
}

/// Handle to an opened collection.
///
/// `embedder_id` is `None` for stores created outside this workspace, in which
/// case no vector-space check is possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHandle {
    pub name: String,
    pub dim: usize,
    pub embedder_id: Option<String>,
}

/// A single nearest-neighbour hit. Lower `distance` is closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    pub distance: f32,
}

/// Hits ordered by ascending distance, at most `k` long.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetrievalResult {
    pub hits: Vec<RetrievedChunk>,
}

impl RetrievalResult {
    pub fn new(hits: Vec<RetrievedChunk>) -> Self {
        Self { hits }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RetrievedChunk> {
        self.hits.iter()
    }
}

impl IntoIterator for RetrievalResult {
    type Item = RetrievedChunk;
    type IntoIter = std::vec::IntoIter<RetrievedChunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}
