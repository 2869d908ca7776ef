#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod chunker;
pub mod config;
pub mod error;
pub mod memory;
pub mod text;
pub mod traits;
pub mod types;

pub use chunker::{chunk_pages, Chunker, DEFAULT_CHUNK_SIZE};
pub use error::{ConfigError, EmbedError, IndexError, IngestionError};
pub use memory::InMemoryIndex;
pub use traits::{Embedder, VectorIndex};
pub use types::{Chunk, ChunkMetadata, CollectionHandle, CollectionSpec, IndexRecord, RetrievalResult, RetrievedChunk};
