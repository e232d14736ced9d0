//! Global chat endpoints

use axum::{extract::State, http::StatusCode, Json};
use dramawave_common::models::ChatMessage;

use crate::error::ApiResult;
use crate::services::comments::{self, NewChatMessage};
use crate::session::Session;
use crate::AppState;

/// GET /api/chat - last messages, oldest first
pub async fn history(State(state): State<AppState>) -> ApiResult<Json<Vec<ChatMessage>>> {
    Ok(Json(comments::chat_history(&state).await?))
}

/// POST /api/chat
pub async fn post_message(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<NewChatMessage>,
) -> ApiResult<(StatusCode, Json<ChatMessage>)> {
    let message = comments::post_chat_message(&state, &session, input).await?;
    Ok((StatusCode::CREATED, Json(message)))
}
