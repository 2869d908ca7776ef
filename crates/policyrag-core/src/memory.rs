//! In-process [`VectorIndex`] used by tests and dry runs. Exact cosine search.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::error::IndexError;
use crate::traits::{check_dimension, check_query, cosine_distance, VectorIndex};
use crate::types::{CollectionHandle, CollectionSpec, IndexRecord, RetrievalResult, RetrievedChunk};

#[derive(Debug)]
struct Collection {
    spec: CollectionSpec,
    rows: BTreeMap<String, IndexRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(name: &str, spec: &CollectionSpec) -> CollectionHandle {
        CollectionHandle { name: name.to_string(), dim: spec.dim, embedder_id: Some(spec.embedder_id.clone()) }
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn delete_if_exists(&self, name: &str) -> Result<bool, IndexError> {
        Ok(self.collections.write().await.remove(name).is_some())
    }

    async fn recreate(&self, name: &str, spec: &CollectionSpec) -> Result<CollectionHandle, IndexError> {
        if spec.dim == 0 {
            return Err(IndexError::InvalidArgument("collection dimension must be non-zero".into()));
        }
        let mut guard = self.collections.write().await;
        guard.remove(name);
        guard.insert(name.to_string(), Collection { spec: spec.clone(), rows: BTreeMap::new() });
        Ok(Self::handle(name, spec))
    }

    async fn open(&self, name: &str) -> Result<CollectionHandle, IndexError> {
        let guard = self.collections.read().await;
        let col = guard.get(name).ok_or_else(|| IndexError::CollectionNotFound(name.to_string()))?;
        Ok(Self::handle(name, &col.spec))
    }

    async fn write(&self, handle: &CollectionHandle, records: &[IndexRecord]) -> Result<(), IndexError> {
        check_dimension(handle, records)?;
        let mut guard = self.collections.write().await;
        let col = guard.get_mut(&handle.name).ok_or_else(|| IndexError::CollectionNotFound(handle.name.clone()))?;
        for r in records {
            col.rows.insert(r.id.clone(), r.clone());
        }
        Ok(())
    }

    async fn query(&self, handle: &CollectionHandle, vector: &[f32], k: usize) -> Result<RetrievalResult, IndexError> {
        check_query(handle, vector, k)?;
        let guard = self.collections.read().await;
        let col = guard.get(&handle.name).ok_or_else(|| IndexError::CollectionNotFound(handle.name.clone()))?;
        let mut hits: Vec<RetrievedChunk> = col
            .rows
            .values()
            .map(|r| RetrievedChunk {
                id: r.id.clone(),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
                distance: cosine_distance(vector, &r.vector),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(RetrievalResult::new(hits))
    }

    async fn count(&self, handle: &CollectionHandle) -> Result<usize, IndexError> {
        let guard = self.collections.read().await;
        guard
            .get(&handle.name)
            .map(|c| c.rows.len())
            .ok_or_else(|| IndexError::CollectionNotFound(handle.name.clone()))
    }
}
