use async_trait::async_trait;

use crate::error::{EmbedError, IndexError};
use crate::types::{CollectionHandle, CollectionSpec, IndexRecord, RetrievalResult};

/// Text to vector. Must be a pure function of the input for a fixed `model_id`.
///
/// Implementations are shared across concurrent requests and are CPU-bound;
/// async callers should run them on the blocking pool.
pub trait Embedder: Send + Sync {
    /// Stable identifier of the model producing the vectors (e.g. `bge-base-en-v1.5:d768`).
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.embed_many(&[text.to_string()])?
            .pop()
            .ok_or_else(|| EmbedError::Inference("embedder returned no vector".into()))
    }
}

/// Persistent store of named collections of `(id, vector, text, metadata)` rows.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Drop the collection if present. `Ok(false)` means there was nothing to drop.
    async fn delete_if_exists(&self, name: &str) -> Result<bool, IndexError>;

    /// Drop any existing collection of that name and create an empty one.
    async fn recreate(&self, name: &str, spec: &CollectionSpec) -> Result<CollectionHandle, IndexError>;

    /// Open an existing collection. Never creates one.
    async fn open(&self, name: &str) -> Result<CollectionHandle, IndexError>;

    /// Upsert by id. Vectors must match the collection dimension.
    async fn write(&self, handle: &CollectionHandle, records: &[IndexRecord]) -> Result<(), IndexError>;

    /// Up to `k` nearest rows by cosine distance, nearest first. `k == 0` is invalid.
    async fn query(&self, handle: &CollectionHandle, vector: &[f32], k: usize) -> Result<RetrievalResult, IndexError>;

    async fn count(&self, handle: &CollectionHandle) -> Result<usize, IndexError>;
}

/// Shared argument checks for `write` and `query` implementations.
pub fn check_dimension(handle: &CollectionHandle, records: &[IndexRecord]) -> Result<(), IndexError> {
    if let Some(bad) = records.iter().find(|r| r.vector.len() != handle.dim) {
        return Err(IndexError::Write {
            collection: handle.name.clone(),
            reason: format!("record '{}' has dimension {}, collection expects {}", bad.id, bad.vector.len(), handle.dim),
        });
    }
    Ok(())
}

pub fn check_query(handle: &CollectionHandle, vector: &[f32], k: usize) -> Result<(), IndexError> {
    if k == 0 {
        return Err(IndexError::InvalidArgument("k must be greater than zero".into()));
    }
    if vector.len() != handle.dim {
        return Err(IndexError::InvalidArgument(format!(
            "query vector has dimension {}, collection '{}' expects {}",
            vector.len(),
            handle.name,
            handle.dim
        )));
    }
    Ok(())
}

/// Cosine distance in `[0, 2]`. A zero vector is treated as orthogonal to everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 1.0;
    }
    1.0 - dot / (na * nb)
}
