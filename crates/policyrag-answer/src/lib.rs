//! policyrag-answer
//!
//! Question answering over one collection: the completion client
//! (`completion`), the embed-then-query step (`retriever`) and the
//! grounded prompt builder (`composer`).

pub mod completion;
pub mod composer;
pub mod retriever;

pub use completion::{CompletionError, CompletionRequest, CompletionService, OpenAiCompatibleClient};
pub use composer::{Answer, AnswerComposer, AnswerStatus, NO_DOCUMENTS_MESSAGE};
pub use retriever::Retriever;

use policyrag_core::{EmbedError, IndexError};
use thiserror::Error;

/// Anything that can fail while answering one question.
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error(transparent)]
    Embed(#[from] EmbedError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}
