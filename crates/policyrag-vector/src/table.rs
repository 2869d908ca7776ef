//! LanceDB connection and housekeeping helpers.
//!
//! One Lance table per collection under a single database root. Collections
//! are dropped explicitly (`drop_if_exists`) rather than by swallowing errors.

use arrow_array::RecordBatchIterator;
use arrow_schema::SchemaRef;
use lancedb::{connect, Connection, Table};

use policyrag_core::IndexError;

pub async fn open_db(uri: &str) -> Result<Connection, IndexError> {
    connect(uri).execute().await.map_err(IndexError::backend)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool, IndexError> {
    let names = conn.table_names().execute().await.map_err(IndexError::backend)?;
    Ok(names.iter().any(|n| n == name))
}

pub async fn drop_if_exists(conn: &Connection, name: &str) -> Result<bool, IndexError> {
    if !table_exists(conn, name).await? {
        return Ok(false);
    }
    conn.drop_table(name, &[]).await.map_err(IndexError::backend)?;
    Ok(true)
}

/// Create an empty table with 0 rows.
pub async fn create_empty(conn: &Connection, name: &str, schema: SchemaRef) -> Result<Table, IndexError> {
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
    conn.create_table(name, Box::new(iter)).execute().await.map_err(IndexError::backend)
}

pub async fn open_existing(conn: &Connection, name: &str) -> Result<Table, IndexError> {
    if !table_exists(conn, name).await? {
        return Err(IndexError::CollectionNotFound(name.to_string()));
    }
    conn.open_table(name).execute().await.map_err(IndexError::backend)
}
