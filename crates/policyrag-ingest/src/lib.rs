//! policyrag-ingest
//!
//! Offline ingestion: page-ordered text extraction (`extract`), the rebuild
//! pipeline (`pipeline`) and the lock that keeps rebuilds exclusive (`lock`).

pub mod extract;
pub mod lock;
pub mod pipeline;

pub use extract::{DocumentExtractor, ExtractError, ExtractorSet, PdfExtractor, PlainTextExtractor};
pub use lock::IngestLock;
pub use pipeline::{expand_paths, resolve_domain, IngestPipeline, IngestReport};
