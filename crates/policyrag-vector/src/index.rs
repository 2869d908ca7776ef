use arrow_array::{Array, FixedSizeListArray, Float32Array, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use std::path::Path;
use std::sync::Arc;

use policyrag_core::traits::{check_dimension, check_query};
use policyrag_core::{ChunkMetadata, CollectionHandle, CollectionSpec, IndexError, IndexRecord, RetrievalResult, RetrievedChunk, VectorIndex};

use crate::schema::{build_chunk_schema, vector_dim, DISTANCE_COLUMN, EMBEDDER_ID_KEY};
use crate::table::{create_empty, drop_if_exists, open_db, open_existing};

/// [`VectorIndex`] over a LanceDB database directory, one table per collection.
///
/// `Connection` is cheap to clone and safe to share; tables are reopened per
/// call so a rebuild is picked up without restarting the server.
#[derive(Clone)]
pub struct LanceIndex {
    db: Connection,
}

impl LanceIndex {
    pub async fn open(db_path: &Path) -> Result<Self, IndexError> {
        let db = open_db(db_path.to_string_lossy().as_ref()).await?;
        Ok(Self { db })
    }

    pub fn connection(&self) -> &Connection {
        &self.db
    }

    async fn handle_for(name: &str, table: &Table) -> Result<CollectionHandle, IndexError> {
        let schema = table.schema().await.map_err(IndexError::backend)?;
        let dim = vector_dim(&schema)
            .ok_or_else(|| IndexError::Backend(format!("table '{}' has no fixed-size vector column", name)))?;
        Ok(CollectionHandle { name: name.to_string(), dim, embedder_id: schema.metadata().get(EMBEDDER_ID_KEY).cloned() })
    }
}

fn records_to_batch(table_schema: arrow_schema::SchemaRef, dim: usize, records: &[IndexRecord]) -> Result<RecordBatch, IndexError> {
    let width = i32::try_from(dim).map_err(|_| IndexError::InvalidArgument(format!("dimension {} too large", dim)))?;
    let mut ids = Vec::with_capacity(records.len());
    let mut texts = Vec::with_capacity(records.len());
    let mut sources = Vec::with_capacity(records.len());
    let mut pages = Vec::with_capacity(records.len());
    let mut chunk_ids = Vec::with_capacity(records.len());
    let mut vectors: Vec<Option<Vec<Option<f32>>>> = Vec::with_capacity(records.len());
    for r in records {
        ids.push(r.id.clone());
        texts.push(r.text.clone());
        sources.push(r.metadata.source.clone());
        pages.push(i32::try_from(r.metadata.page).unwrap_or(i32::MAX));
        chunk_ids.push(i32::try_from(r.metadata.chunk_id).unwrap_or(i32::MAX));
        vectors.push(Some(r.vector.iter().map(|&x| Some(x)).collect()));
    }
    RecordBatch::try_new(
        table_schema,
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(texts)),
            Arc::new(StringArray::from(sources)),
            Arc::new(Int32Array::from(pages)),
            Arc::new(Int32Array::from(chunk_ids)),
            Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors.into_iter(), width)),
        ],
    )
    .map_err(IndexError::backend)
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T, IndexError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| IndexError::Backend(format!("result column '{}' missing or mistyped", name)))
}

fn batch_to_hits(batch: &RecordBatch, out: &mut Vec<RetrievedChunk>) -> Result<(), IndexError> {
    let ids = column::<StringArray>(batch, "id")?;
    let texts = column::<StringArray>(batch, "text")?;
    let sources = column::<StringArray>(batch, "source")?;
    let pages = column::<Int32Array>(batch, "page")?;
    let chunk_ids = column::<Int32Array>(batch, "chunk_id")?;
    let distances = column::<Float32Array>(batch, DISTANCE_COLUMN)?;
    for i in 0..batch.num_rows() {
        out.push(RetrievedChunk {
            id: ids.value(i).to_string(),
            text: texts.value(i).to_string(),
            metadata: ChunkMetadata {
                source: sources.value(i).to_string(),
                page: u32::try_from(pages.value(i)).unwrap_or(0),
                chunk_id: u32::try_from(chunk_ids.value(i)).unwrap_or(0),
            },
            distance: if distances.is_null(i) { f32::MAX } else { distances.value(i) },
        });
    }
    Ok(())
}

#[async_trait]
impl VectorIndex for LanceIndex {
    async fn delete_if_exists(&self, name: &str) -> Result<bool, IndexError> {
        let dropped = drop_if_exists(&self.db, name).await?;
        if dropped {
            tracing::info!(collection = name, "dropped collection");
        }
        Ok(dropped)
    }

    async fn recreate(&self, name: &str, spec: &CollectionSpec) -> Result<CollectionHandle, IndexError> {
        let width = i32::try_from(spec.dim).ok().filter(|d| *d > 0)
            .ok_or_else(|| IndexError::InvalidArgument(format!("invalid collection dimension {}", spec.dim)))?;
        self.delete_if_exists(name).await?;
        create_empty(&self.db, name, build_chunk_schema(width, &spec.embedder_id)).await?;
        tracing::info!(collection = name, dim = spec.dim, embedder = %spec.embedder_id, "created collection");
        Ok(CollectionHandle { name: name.to_string(), dim: spec.dim, embedder_id: Some(spec.embedder_id.clone()) })
    }

    async fn open(&self, name: &str) -> Result<CollectionHandle, IndexError> {
        let table = open_existing(&self.db, name).await?;
        Self::handle_for(name, &table).await
    }

    async fn write(&self, handle: &CollectionHandle, records: &[IndexRecord]) -> Result<(), IndexError> {
        if records.is_empty() {
            return Ok(());
        }
        check_dimension(handle, records)?;
        let table = open_existing(&self.db, &handle.name).await?;
        let schema = table.schema().await.map_err(IndexError::backend)?;
        let batch = records_to_batch(schema.clone(), handle.dim, records)?;
        let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
        // Upsert behavior via merge_insert: id is unique
        let mut mi = table.merge_insert(&["id"]);
        mi.when_matched_update_all(None).when_not_matched_insert_all();
        mi.execute(reader).await.map_err(|e| IndexError::Write { collection: handle.name.clone(), reason: e.to_string() })?;
        Ok(())
    }

    async fn query(&self, handle: &CollectionHandle, vector: &[f32], k: usize) -> Result<RetrievalResult, IndexError> {
        check_query(handle, vector, k)?;
        let table = open_existing(&self.db, &handle.name).await?;
        let mut stream = table
            .vector_search(vector.to_vec())
            .map_err(IndexError::backend)?
            .distance_type(DistanceType::Cosine)
            .limit(k)
            .execute()
            .await
            .map_err(IndexError::backend)?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await.map_err(IndexError::backend)? {
            batch_to_hits(&batch, &mut hits)?;
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        Ok(RetrievalResult::new(hits))
    }

    async fn count(&self, handle: &CollectionHandle) -> Result<usize, IndexError> {
        let table = open_existing(&self.db, &handle.name).await?;
        table.count_rows(None).await.map_err(IndexError::backend)
    }
}
