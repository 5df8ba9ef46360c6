//! Thin HTTP shell over the agent.
//!
//! Presentation layer only: every route is a direct call into `Agent`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::agent::{Agent, ProcessOutcome};
use crate::conversation::{Message, UserProfile};

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Omitted on the first message; the server assigns a fresh thread.
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub thread_id: String,
    pub summary: String,
}

/// Build the API router.
pub fn routes(agent: Arc<Agent>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/chat/{thread_id}/history", get(history))
        .route("/api/chat/{thread_id}/summary", get(summary))
        .route("/api/chat/{thread_id}", delete(clear))
        .layer(CorsLayer::permissive())
        .with_state(agent)
}

async fn chat(
    State(agent): State<Arc<Agent>>,
    Json(request): Json<ChatRequest>,
) -> Json<ProcessOutcome> {
    let thread_id = request
        .thread_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let outcome = agent
        .process_message(&request.message, &thread_id, request.user_profile)
        .await;
    Json(outcome)
}

async fn history(
    State(agent): State<Arc<Agent>>,
    Path(thread_id): Path<String>,
) -> Result<Json<Vec<Message>>, StatusCode> {
    match agent.conversations().history(&thread_id).await {
        Some(messages) => Ok(Json(messages)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

async fn summary(
    State(agent): State<Arc<Agent>>,
    Path(thread_id): Path<String>,
) -> Result<Json<SummaryResponse>, StatusCode> {
    match agent.conversation_summary(&thread_id).await {
        Ok(summary) => Ok(Json(SummaryResponse { thread_id, summary })),
        Err(e) => {
            tracing::error!(thread_id, "Summary failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn clear(State(agent): State<Arc<Agent>>, Path(thread_id): Path<String>) -> StatusCode {
    agent.clear_conversation(&thread_id).await;
    StatusCode::NO_CONTENT
}
