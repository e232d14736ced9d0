//! Request identity
//!
//! Authentication happens upstream; the trusted gateway forwards the
//! verified identity in `x-user-id`, `x-user-email` and `x-user-name`.
//! The profile is created on first sight and reloaded on every request,
//! so role and suspension changes apply immediately.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use dramawave_common::models::UserProfile;

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct Session {
    pub profile: UserProfile,
}

impl Session {
    pub fn uid(&self) -> &str {
        &self.profile.uid
    }

    pub fn is_admin(&self) -> bool {
        self.profile.is_admin
    }

    pub fn require_admin(&self) -> ApiResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("admin role required".to_string()))
        }
    }

    /// Suspended users may read but not post
    pub fn require_active(&self, now_ms: i64) -> ApiResult<()> {
        if self.profile.is_suspended(now_ms) {
            Err(ApiError::Forbidden(format!(
                "account suspended until {}",
                dramawave_common::time::from_millis(self.profile.suspended_until.unwrap_or(0))
                    .to_rfc3339()
            )))
        } else {
            Ok(())
        }
    }
}

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn load_session(parts: &Parts, state: &AppState) -> ApiResult<Option<Session>> {
    let Some(uid) = header(parts, USER_ID_HEADER) else {
        return Ok(None);
    };
    let email = header(parts, USER_EMAIL_HEADER);
    let name = header(parts, USER_NAME_HEADER);

    let profile = db::users::ensure_profile(&state.db, &uid, email.as_deref(), name.as_deref())
        .await?;
    Ok(Some(Session { profile }))
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        load_session(parts, state)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("sign in required".to_string()))
    }
}

/// Caller identity when present; anonymous requests are allowed
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(load_session(parts, state).await?))
    }
}
