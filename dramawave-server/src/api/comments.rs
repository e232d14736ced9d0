//! Comment endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use dramawave_common::models::Comment;
use dramawave_common::threads::ThreadNode;
use serde::Deserialize;

use crate::error::ApiResult;
use crate::services::comments::{self, NewComment};
use crate::services::moderation::{self, CascadeReport};
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ThreadQuery {
    /// Reply levels nested under a top-level comment
    pub depth: Option<usize>,
}

/// GET /api/content/:id/comments[?depth=]
///
/// Top-level comments newest first, replies oldest first.
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ThreadQuery>,
) -> ApiResult<Json<Vec<ThreadNode>>> {
    Ok(Json(comments::list_threads(&state, &id, query.depth).await?))
}

/// POST /api/content/:id/comments
pub async fn post_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
    Json(input): Json<NewComment>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment = comments::post_comment(&state, &session, &id, input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// DELETE /api/content/:id/comments/:comment_id (author or admin)
///
/// Removes the comment and its replies down to the configured cascade depth.
pub async fn cancel_comment(
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(String, String)>,
    session: Session,
) -> ApiResult<Json<CascadeReport>> {
    Ok(Json(
        moderation::cancel_for_session(&state, &session, &id, &comment_id).await?,
    ))
}
