//! Sticker endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use dramawave_common::models::Sticker;

use crate::db;
use crate::error::ApiResult;
use crate::services::stickers::{self, NewSticker};
use crate::session::Session;
use crate::AppState;

/// GET /api/stickers
pub async fn list_stickers(State(state): State<AppState>) -> ApiResult<Json<Vec<Sticker>>> {
    Ok(Json(db::stickers::list_stickers(&state.db).await?))
}

/// POST /api/stickers (admin) - `{"image_url": ..}` or `{"emoji": ..}`
pub async fn add_sticker(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<NewSticker>,
) -> ApiResult<(StatusCode, Json<Sticker>)> {
    let sticker = stickers::add_sticker(&state, &session, input).await?;
    Ok((StatusCode::CREATED, Json(sticker)))
}

/// DELETE /api/stickers/:id (admin)
pub async fn remove_sticker(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
) -> ApiResult<StatusCode> {
    stickers::remove_sticker(&state, &session, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
