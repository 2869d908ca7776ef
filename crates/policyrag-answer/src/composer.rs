use serde::Serialize;
use std::sync::Arc;

use policyrag_core::config::CompletionConfig;
use policyrag_core::text::normalize_whitespace;
use policyrag_core::RetrievalResult;

use crate::completion::{CompletionError, CompletionRequest, CompletionService};

pub const NO_DOCUMENTS_MESSAGE: &str = "No indexed documents available. Please ingest PDF first.";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant on leave policy.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerStatus {
    Grounded,
    NoDocuments,
    ServiceError { status: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub status: AnswerStatus,
}

/// Turns retrieved chunks into a grounded prompt and asks the completion service.
#[derive(Clone)]
pub struct AnswerComposer {
    completion: Arc<dyn CompletionService>,
    system_prompt: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnswerComposer {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion, system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(), max_tokens: 500, temperature: 0.3 }
    }

    pub fn from_config(completion: Arc<dyn CompletionService>, cfg: &CompletionConfig) -> Self {
        Self { completion, system_prompt: cfg.system_prompt.clone(), max_tokens: cfg.max_tokens, temperature: cfg.temperature }
    }

    pub async fn compose(&self, question: &str, result: &RetrievalResult) -> Result<Answer, CompletionError> {
        if result.is_empty() {
            return Ok(Answer { text: NO_DOCUMENTS_MESSAGE.to_string(), status: AnswerStatus::NoDocuments });
        }
        let prompt = build_prompt(&self.system_prompt, &build_context(result), question);
        let request = CompletionRequest::new(prompt, self.max_tokens, self.temperature);
        match self.completion.complete(&request).await {
            Ok(text) => Ok(Answer { text: text.trim().to_string(), status: AnswerStatus::Grounded }),
            Err(CompletionError::Status { status, .. }) => {
                Ok(Answer { text: format!("API error: {}", status), status: AnswerStatus::ServiceError { status } })
            }
            Err(e) => Err(e),
        }
    }
}

/// One `Document:`/`Metadata:` block per hit, in retrieval order.
pub fn build_context(result: &RetrievalResult) -> String {
    result
        .iter()
        .map(|hit| format!("Document: {}\nMetadata: {}", normalize_whitespace(&hit.text), hit.metadata))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(system: &str, context: &str, question: &str) -> String {
    format!("{}\n\nContext:\n{}\n\nUser question: {}\nAnswer:", system, context, question)
}
