use arrow_schema::{DataType, Field, Schema, SchemaRef};
use std::collections::HashMap;
use std::sync::Arc;

/// Schema metadata key recording which embedder produced the vectors.
pub const EMBEDDER_ID_KEY: &str = "policyrag.embedder_id";
pub const VECTOR_COLUMN: &str = "vector";
pub const DISTANCE_COLUMN: &str = "_distance";

pub fn build_chunk_schema(dim: i32, embedder_id: &str) -> SchemaRef {
    let fields = vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("page", DataType::Int32, false),
        Field::new("chunk_id", DataType::Int32, false),
        Field::new(VECTOR_COLUMN, DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
    ];
    let metadata = HashMap::from([(EMBEDDER_ID_KEY.to_string(), embedder_id.to_string())]);
    Arc::new(Schema::new(fields).with_metadata(metadata))
}

/// Vector width declared by a chunk table schema, if it has one.
pub fn vector_dim(schema: &Schema) -> Option<usize> {
    let field = schema.field_with_name(VECTOR_COLUMN).ok()?;
    match field.data_type() {
        DataType::FixedSizeList(_, n) => usize::try_from(*n).ok(),
        _ => None,
    }
}
