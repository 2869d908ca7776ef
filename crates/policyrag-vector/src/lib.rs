//! policyrag-vector
//!
//! LanceDB-backed persistent vector index. See `index::LanceIndex` for the
//! collection operations and `table` for connection housekeeping.

pub mod index;
pub mod schema;
pub mod table;

pub use index::LanceIndex;
