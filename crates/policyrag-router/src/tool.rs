use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use policyrag_answer::Retriever;
use policyrag_core::text::normalize_whitespace;
use policyrag_core::{Embedder, RetrievalResult, VectorIndex};

use crate::AgentError;

pub const NO_CONTENT: &str = "No relevant content found.";

/// A named capability the agent can call with a free-text input.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn invoke(&self, input: &str, cancel: &CancellationToken) -> Result<String, AgentError>;
}

/// Searches one domain's collection and renders the hits as plain text.
pub struct DomainTool {
    name: String,
    description: String,
    retriever: Retriever,
}

impl DomainTool {
    pub fn new(domain: &str, retriever: Retriever) -> Self {
        Self {
            name: format!("{}_policy", domain),
            description: format!("Search the {} policy documents.", domain),
            retriever,
        }
    }

    pub fn collection(&self) -> &str {
        self.retriever.collection()
    }
}

#[async_trait]
impl Tool for DomainTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn invoke(&self, input: &str, cancel: &CancellationToken) -> Result<String, AgentError> {
        let result = tokio::select! {
            r = self.retriever.retrieve(input) => r?,
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
        };
        tracing::debug!(tool = %self.name, hits = result.len(), "tool invoked");
        Ok(format_hits(&result))
    }
}

/// `"{text} (page {p}, dist {d:.3})"` per hit, separated by a blank line.
pub fn format_hits(result: &RetrievalResult) -> String {
    if result.is_empty() {
        return NO_CONTENT.to_string();
    }
    result
        .iter()
        .map(|h| format!("{} (page {}, dist {:.3})", normalize_whitespace(&h.text), h.metadata.page, h.distance))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The tool set for the agent, one [`DomainTool`] per mapped domain.
#[derive(Clone, Default)]
pub struct DomainRouter {
    tools: Vec<Arc<dyn Tool>>,
}

impl DomainRouter {
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        Self { tools }
    }

    pub fn from_mapping(
        domains: &BTreeMap<String, String>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        top_k: usize,
    ) -> Self {
        let tools = domains
            .iter()
            .map(|(domain, collection)| {
                let retriever = Retriever::new(embedder.clone(), index.clone(), collection.clone(), top_k);
                Arc::new(DomainTool::new(domain, retriever)) as Arc<dyn Tool>
            })
            .collect();
        Self { tools }
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use policyrag_core::{ChunkMetadata, CollectionSpec, IndexRecord, InMemoryIndex, RetrievedChunk};
    use policyrag_embed::FakeEmbedder;

    #[test]
    fn hits_render_with_page_and_distance() {
        let result = RetrievalResult::new(vec![
            RetrievedChunk {
                id: "t.pdf_p3_c0".into(),
                text: "Per diem is\n50 EUR.".into(),
                metadata: ChunkMetadata { source: "t.pdf".into(), page: 3, chunk_id: 0 },
                distance: 0.12345,
            },
            RetrievedChunk {
                id: "t.pdf_p4_c1".into(),
                text: "Taxis need receipts.".into(),
                metadata: ChunkMetadata { source: "t.pdf".into(), page: 4, chunk_id: 1 },
                distance: 0.5,
            },
        ]);
        assert_eq!(format_hits(&result), "Per diem is 50 EUR. (page 3, dist 0.123)\n\nTaxis need receipts. (page 4, dist 0.500)");
    }

    #[test]
    fn no_hits_is_sentinel() {
        assert_eq!(format_hits(&RetrievalResult::default()), NO_CONTENT);
    }

    #[tokio::test]
    async fn router_builds_one_tool_per_domain() {
        let embedder: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(16));
        let index = Arc::new(InMemoryIndex::new());
        let spec = CollectionSpec { dim: 16, embedder_id: embedder.model_id().to_string() };
        let handle = index.recreate("travel_policy", &spec).await.unwrap();
        let v = embedder.embed("Hotel budget is 120 per night").unwrap();
        let meta = ChunkMetadata { source: "travel.pdf".into(), page: 2, chunk_id: 0 };
        index
            .write(&handle, &[IndexRecord { id: "travel.pdf_p2_c0".into(), vector: v, text: "Hotel budget is 120 per night".into(), metadata: meta }])
            .await
            .unwrap();

        let mut domains = BTreeMap::new();
        domains.insert("travel".to_string(), "travel_policy".to_string());
        domains.insert("leave".to_string(), "leave_policy".to_string());
        let router = DomainRouter::from_mapping(&domains, embedder, index, 5);

        assert_eq!(router.names(), vec!["leave_policy", "travel_policy"]);
        let travel = router.get("travel_policy").unwrap();
        assert_eq!(travel.description(), "Search the travel policy documents.");
        let out = travel.invoke("hotel budget", &CancellationToken::new()).await.unwrap();
        assert!(out.starts_with("Hotel budget is 120 per night (page 2, dist "));
    }
}
