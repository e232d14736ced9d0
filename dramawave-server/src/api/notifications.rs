//! Notification endpoints

use axum::{extract::State, Json};
use dramawave_common::models::Notification;
use serde::Serialize;

use crate::error::ApiResult;
use crate::services::notifications;
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UnreadResponse {
    pub unread: usize,
}

#[derive(Debug, Serialize)]
pub struct SeenResponse {
    pub marked: Vec<String>,
}

/// GET /api/notifications - feed of the last 24 hours, newest first
pub async fn feed(State(state): State<AppState>) -> ApiResult<Json<Vec<Notification>>> {
    let now = dramawave_common::time::now_millis();
    Ok(Json(notifications::feed(&state, now).await?))
}

/// GET /api/notifications/unread
pub async fn unread(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<UnreadResponse>> {
    let now = dramawave_common::time::now_millis();
    let unread = notifications::unread(&state, &session, now).await?;
    Ok(Json(UnreadResponse { unread }))
}

/// POST /api/notifications/seen - marks the current feed as seen
pub async fn mark_seen(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<SeenResponse>> {
    let now = dramawave_common::time::now_millis();
    let marked = notifications::mark_feed_seen(&state, &session, now).await?;
    Ok(Json(SeenResponse { marked }))
}
