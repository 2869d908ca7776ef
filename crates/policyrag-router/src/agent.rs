use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::tool::{DomainRouter, Tool};
use crate::AgentError;

pub const STOPPED_MESSAGE: &str = "Agent stopped due to iteration limit or time limit.";

/// What the controller wants to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Call `tool` with `input`. `log` is the controller's reasoning text.
    Invoke { tool: String, input: String, log: String },
    Finish(String),
}

/// One tool call and what it returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub tool: String,
    pub input: String,
    pub observation: String,
    #[serde(skip)]
    pub log: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Finished,
    IterationLimit,
    Deadline,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub answer: String,
    pub stop_reason: StopReason,
    pub steps: Vec<Step>,
}

/// Chooses the next action from the question and the steps taken so far.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    async fn decide(&self, question: &str, tools: &[Arc<dyn Tool>], steps: &[Step]) -> Result<Decision, AgentError>;
}

/// Drives an [`Orchestrator`] over a [`DomainRouter`] with a hard iteration
/// cap, an optional wall-clock deadline and a cancellation token.
///
/// Every decision that names a tool counts as one iteration, including names
/// that do not resolve, so the number of tool calls never exceeds the cap.
pub struct AgentLoop {
    orchestrator: Arc<dyn Orchestrator>,
    router: DomainRouter,
    max_iterations: usize,
    deadline: Option<Duration>,
}

impl AgentLoop {
    pub fn new(orchestrator: Arc<dyn Orchestrator>, router: DomainRouter) -> Self {
        Self { orchestrator, router, max_iterations: 3, deadline: None }
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn router(&self) -> &DomainRouter {
        &self.router
    }

    pub async fn run(&self, question: &str, cancel: &CancellationToken) -> Result<AgentOutcome, AgentError> {
        let deadline = self.deadline.map(|d| Instant::now() + d);
        let mut steps: Vec<Step> = Vec::new();

        loop {
            if cancel.is_cancelled() {
                return Ok(stopped(StopReason::Cancelled, steps));
            }
            if steps.len() >= self.max_iterations {
                tracing::info!(iterations = steps.len(), "agent hit iteration limit");
                return Ok(stopped(StopReason::IterationLimit, steps));
            }

            let next = bounded(deadline, cancel, self.orchestrator.decide(question, self.router.tools(), &steps)).await;
            let decision = match next {
                Bounded::Done(d) => d?,
                Bounded::Stopped(reason) => return Ok(stopped(reason, steps)),
            };

            let (tool, input, log) = match decision {
                Decision::Finish(answer) => {
                    return Ok(AgentOutcome { answer: answer.trim().to_string(), stop_reason: StopReason::Finished, steps });
                }
                Decision::Invoke { tool, input, log } => (tool, input, log),
            };

            let observation = match self.router.get(&tool) {
                Some(t) => match bounded(deadline, cancel, t.invoke(&input, cancel)).await {
                    Bounded::Done(Err(AgentError::Cancelled)) => return Ok(stopped(StopReason::Cancelled, steps)),
                    Bounded::Done(r) => r?,
                    Bounded::Stopped(reason) => return Ok(stopped(reason, steps)),
                },
                None => format!("{} is not a valid tool, try one of [{}].", tool, self.router.names().join(", ")),
            };
            tracing::debug!(step = steps.len() + 1, tool = %tool, "agent step");
            steps.push(Step { tool, input, observation, log });
        }
    }
}

fn stopped(reason: StopReason, steps: Vec<Step>) -> AgentOutcome {
    AgentOutcome { answer: STOPPED_MESSAGE.to_string(), stop_reason: reason, steps }
}

enum Bounded<T> {
    Done(T),
    Stopped(StopReason),
}

async fn bounded<F: std::future::Future>(deadline: Option<Instant>, cancel: &CancellationToken, fut: F) -> Bounded<F::Output> {
    let timed = async {
        match deadline {
            Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
            None => Some(fut.await),
        }
    };
    tokio::select! {
        r = timed => match r {
            Some(v) => Bounded::Done(v),
            None => Bounded::Stopped(StopReason::Deadline),
        },
        _ = cancel.cancelled() => Bounded::Stopped(StopReason::Cancelled),
    }
}
