//! Catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use dramawave_common::events::DramaEvent;
use dramawave_common::models::{Content, ContentKind, Episode};
use serde::Deserialize;
use tracing::{debug, info};

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::services::catalog::{self, ContentInput, EpisodeInput};
use crate::services::likes::{self, LikeOutcome};
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub kind: Option<ContentKind>,
}

/// GET /api/content[?kind=movie|series]
pub async fn list_content(
    State(state): State<AppState>,
    Query(query): Query<ContentQuery>,
) -> ApiResult<Json<Vec<Content>>> {
    let items = db::content::list_content(&state.db, query.kind).await?;
    debug!("Listing {} catalog entries", items.len());
    Ok(Json(items))
}

/// GET /api/content/:id
pub async fn get_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Content>> {
    db::content::get_content(&state.db, &id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("content {}", id)))
}

/// POST /api/content (admin)
pub async fn create_content(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<ContentInput>,
) -> ApiResult<(StatusCode, Json<Content>)> {
    let content = catalog::create_content(&state, &session, input).await?;
    Ok((StatusCode::CREATED, Json(content)))
}

/// PUT /api/content/:id (admin)
pub async fn update_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
    Json(input): Json<ContentInput>,
) -> ApiResult<Json<Content>> {
    Ok(Json(catalog::update_content(&state, &session, &id, input).await?))
}

/// POST /api/content/:id/episodes (admin)
pub async fn add_episode(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
    Json(input): Json<EpisodeInput>,
) -> ApiResult<(StatusCode, Json<Episode>)> {
    let episode = catalog::add_episode(&state, &session, &id, input).await?;
    Ok((StatusCode::CREATED, Json(episode)))
}

/// POST /api/content/:id/like - toggles the caller's like
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
) -> ApiResult<Json<LikeOutcome>> {
    let now = dramawave_common::time::now_millis();
    let outcome = likes::toggle_like(&state.db, &id, session.uid(), now).await?;

    info!(
        content_id = %id,
        liked = outcome.liked,
        likes = outcome.likes,
        "Like toggled by {}",
        session.uid()
    );
    state.event_bus.emit_lossy(DramaEvent::ContentLikeToggled {
        content_id: id,
        user_id: session.uid().to_string(),
        liked: outcome.liked,
        likes: outcome.likes,
        timestamp: dramawave_common::time::now(),
    });

    Ok(Json(outcome))
}

/// GET /api/favorites - content liked by the caller, most liked first
pub async fn list_favorites(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<Content>>> {
    Ok(Json(db::content::list_favorites(&state.db, session.uid()).await?))
}
