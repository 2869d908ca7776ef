use std::sync::Arc;

use policyrag_core::{EmbedError, Embedder, IndexError, RetrievalResult, VectorIndex};

use crate::AnswerError;

/// Embeds a question and queries one collection.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    collection: String,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>, collection: impl Into<String>, top_k: usize) -> Self {
        Self { embedder, index, collection: collection.into(), top_k }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub async fn retrieve(&self, question: &str) -> Result<RetrievalResult, AnswerError> {
        self.retrieve_k(question, self.top_k).await
    }

    pub async fn retrieve_k(&self, question: &str, k: usize) -> Result<RetrievalResult, AnswerError> {
        let handle = self.index.open(&self.collection).await?;
        if let Some(indexed) = handle.embedder_id.as_deref() {
            if indexed != self.embedder.model_id() {
                return Err(IndexError::EmbedderMismatch {
                    collection: self.collection.clone(),
                    indexed: indexed.to_string(),
                    querying: self.embedder.model_id().to_string(),
                }
                .into());
            }
        }

        let embedder = self.embedder.clone();
        let text = question.to_string();
        let vector = tokio::task::spawn_blocking(move || embedder.embed(&text))
            .await
            .map_err(|e| EmbedError::Inference(format!("embedding task failed: {}", e)))??;

        let result = self.index.query(&handle, &vector, k).await?;
        tracing::debug!(collection = %self.collection, k, hits = result.len(), "retrieved");
        Ok(result)
    }

    /// Row count of the backing collection.
    pub async fn count(&self) -> Result<usize, IndexError> {
        let handle = self.index.open(&self.collection).await?;
        self.index.count(&handle).await
    }
}
