//! policyrag-router
//!
//! Multi-domain question answering: per-domain search tools (`tool`), the
//! bounded agent loop (`agent`) and an LLM-driven ReAct controller (`react`).

pub mod agent;
pub mod react;
pub mod tool;

pub use agent::{AgentLoop, AgentOutcome, Decision, Orchestrator, Step, StopReason, STOPPED_MESSAGE};
pub use react::ReactOrchestrator;
pub use tool::{format_hits, DomainRouter, DomainTool, Tool, NO_CONTENT};

use policyrag_answer::{AnswerError, CompletionError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("tool failed: {0}")]
    Tool(#[from] AnswerError),

    #[error("controller completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("cancelled")]
    Cancelled,
}
