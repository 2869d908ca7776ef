//! HTTP surface: `POST /ask`, `POST /ask/routed` and `GET /health`.

mod error;
mod handlers;
mod router;
mod server;

pub use error::{ApiError, ServeError, MISSING_QUESTION};
pub use router::build_router;
pub use server::{AppState, PolicyServer};
