use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use policyrag_answer::AnswerStatus;
use policyrag_core::text::normalize_whitespace;
use policyrag_core::RetrievedChunk;

use crate::error::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct AskRequest {
    #[serde(default)]
    question: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    status: AnswerStatus,
    top_results: Vec<RetrievedChunk>,
}

/// Missing body, bad JSON, no `question` and a blank `question` are all the same client error.
fn question_of(body: Result<Json<AskRequest>, JsonRejection>) -> Result<String, ApiError> {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => return Err(ApiError::PayloadTooLarge),
        Err(_) => return Err(ApiError::MissingQuestion),
    };
    req.question
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or(ApiError::MissingQuestion)
}

pub(crate) async fn ask_handler(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let question = question_of(body)?;
    let result = state.retriever.retrieve(&question).await?;
    let answer = state.composer.compose(&question, &result).await?;
    tracing::info!(hits = result.len(), status = ?answer.status, "answered");
    let top_results = result
        .hits
        .into_iter()
        .map(|hit| RetrievedChunk { text: normalize_whitespace(&hit.text), ..hit })
        .collect();
    Ok(Json(AskResponse { answer: answer.text, status: answer.status, top_results }))
}

pub(crate) async fn ask_routed_handler(
    State(state): State<AppState>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let question = question_of(body)?;
    let outcome = state.agent.run(&question, &state.shutdown.child_token()).await?;
    tracing::info!(steps = outcome.steps.len(), stop_reason = ?outcome.stop_reason, "routed answer");
    Ok(Json(outcome))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> Response {
    match state.retriever.count().await {
        Ok(count) => Json(serde_json::json!({
            "status": "healthy",
            "collection": state.retriever.collection(),
            "count": count,
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "status": "unhealthy", "error": e.to_string() })))
                .into_response()
        }
    }
}
