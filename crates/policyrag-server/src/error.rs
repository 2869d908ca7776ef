use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use policyrag_answer::{AnswerError, CompletionError};
use policyrag_router::AgentError;

pub const MISSING_QUESTION: &str = "Provide 'question'";

/// Startup failures. Fatal.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// Per-request failures, rendered as `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", MISSING_QUESTION)]
    MissingQuestion,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error(transparent)]
    Answer(#[from] AnswerError),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

impl From<CompletionError> for ApiError {
    fn from(e: CompletionError) -> Self {
        Self::Answer(AnswerError::Completion(e))
    }
}

fn completion_status(e: &CompletionError) -> StatusCode {
    match e {
        CompletionError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingQuestion => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Answer(AnswerError::Completion(e)) | Self::Agent(AgentError::Completion(e)) => completion_status(e),
            Self::Agent(AgentError::Tool(AnswerError::Completion(e))) => completion_status(e),
            Self::Answer(_) | Self::Agent(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
