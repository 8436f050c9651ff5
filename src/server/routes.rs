//! HTTP route handlers for the chat memory API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::memory::core::errors::{MemoryError, MemoryResult};
use crate::memory::core::ids::ConversationId;
use crate::memory::core::turn::ConversationTurn;

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/memory/process", post(process_message))
        .route("/memory/{memory_id}", get(conversation_history).delete(delete_conversation))
        .route("/memory/{memory_id}/window", get(conversation_window))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "chat-memory",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.assistant.model_name(),
        "max_messages": state.provider.max_messages(),
    }))
}

/// Chat request scoped to one conversation memory.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRequest {
    /// Conversation identifier.
    pub memory_id: i64,
    /// The user's message.
    pub text_message: String,
}

/// Process a message within its conversation; answers with plain text.
async fn process_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MemoryRequest>,
) -> Result<String, (StatusCode, String)> {
    state
        .assistant
        .chat(ConversationId::new(request.memory_id), &request.text_message)
        .await
        .map_err(error_response)
}

/// One stored turn as returned by the read endpoints.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnDto {
    /// Storage key of the turn.
    pub id: i64,
    /// Author role.
    pub role: String,
    /// Message text.
    pub text: String,
    /// Ordering timestamp.
    pub created_at: DateTime<Utc>,
}

impl<'a> TryFrom<&'a ConversationTurn> for TurnDto {
    type Error = MemoryError;

    fn try_from(turn: &'a ConversationTurn) -> MemoryResult<Self> {
        let message = turn.message()?;
        Ok(Self {
            id: turn.id,
            role: message.role().to_string(),
            text: message.text().to_string(),
            created_at: turn.created_at,
        })
    }
}

fn to_dtos(turns: &[ConversationTurn]) -> MemoryResult<Vec<TurnDto>> {
    turns.iter().map(TurnDto::try_from).collect()
}

/// Full stored history of a conversation.
async fn conversation_history(
    State(state): State<Arc<AppState>>,
    Path(memory_id): Path<i64>,
) -> Result<Json<Vec<TurnDto>>, (StatusCode, String)> {
    let turns = state
        .provider
        .history(ConversationId::new(memory_id))
        .await
        .map_err(error_response)?;
    to_dtos(&turns).map(Json).map_err(error_response)
}

/// The bounded window the model would see next.
async fn conversation_window(
    State(state): State<Arc<AppState>>,
    Path(memory_id): Path<i64>,
) -> Result<Json<Vec<TurnDto>>, (StatusCode, String)> {
    let turns = state
        .provider
        .current_window(ConversationId::new(memory_id))
        .await
        .map_err(error_response)?;
    to_dtos(&turns).map(Json).map_err(error_response)
}

/// Delete every turn of a conversation.
async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(memory_id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    let id = ConversationId::new(memory_id);
    // Wait for in-flight chats on this conversation.
    let guard = state.provider.lock(id).await;
    let result = state.provider.forget(id).await;
    drop(guard);
    result.map_err(error_response)?;
    tracing::info!(conversation = %id, "conversation deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn error_response(err: MemoryError) -> (StatusCode, String) {
    let status = match &err {
        MemoryError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        err if err.is_model_failure() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(%status, "request failed: {err}");
    }
    (status, err.to_string())
}
