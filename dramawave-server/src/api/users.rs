//! Profile and user management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use dramawave_common::models::UserProfile;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::services::users;
use crate::session::Session;
use crate::AppState;

/// Profile as returned to clients
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub avatar_url: String,
    pub is_suspended: bool,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        let now = dramawave_common::time::now_millis();
        Self {
            avatar_url: profile.avatar_url(),
            is_suspended: profile.is_suspended(now),
            profile,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct SuspendRequest {
    pub days: i64,
}

/// GET /api/me
pub async fn me(session: Session) -> Json<ProfileResponse> {
    Json(session.profile.into())
}

/// PUT /api/me - change display name
pub async fn rename(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RenameRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = users::rename(&state, &session, &request.display_name).await?;
    Ok(Json(profile.into()))
}

/// GET /api/users (admin)
pub async fn list_users(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<Vec<ProfileResponse>>> {
    let profiles = users::list_users(&state, &session).await?;
    Ok(Json(profiles.into_iter().map(Into::into).collect()))
}

/// POST /api/users/:uid/suspend (admin) - `{"days": n}`
pub async fn suspend(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    session: Session,
    Json(request): Json<SuspendRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let now = dramawave_common::time::now_millis();
    let profile = users::suspend(&state, &session, &uid, request.days, now).await?;
    Ok(Json(profile.into()))
}

/// DELETE /api/users/:uid/suspend (admin)
pub async fn lift_suspension(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    session: Session,
) -> ApiResult<Json<ProfileResponse>> {
    Ok(Json(users::lift_suspension(&state, &session, &uid).await?.into()))
}

/// POST /api/users/:uid/admin (admin) - toggles the role
pub async fn toggle_admin(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    session: Session,
) -> ApiResult<Json<ProfileResponse>> {
    Ok(Json(users::toggle_admin(&state, &session, &uid).await?.into()))
}
