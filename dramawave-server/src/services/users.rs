//! Profiles and admin user management
//!
//! Role and suspension changes follow [`UserProfile::can_moderate`]: only
//! admins act, never on themselves or on another admin.

use dramawave_common::events::DramaEvent;
use dramawave_common::models::UserProfile;
use dramawave_common::time::DAY_MS;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::validation::display_name;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::AppState;

pub async fn rename(state: &AppState, session: &Session, name: &str) -> ApiResult<UserProfile> {
    let name = display_name(name)?;
    if !db::users::set_display_name(&state.db, session.uid(), &name).await? {
        return Err(ApiError::NotFound(format!("user {}", session.uid())));
    }

    info!(user = session.uid(), "Display name changed to {}", name);
    state.event_bus.emit_lossy(DramaEvent::UserProfileUpdated {
        uid: session.uid().to_string(),
        display_name: name.clone(),
        timestamp: dramawave_common::time::now(),
    });

    Ok(UserProfile {
        display_name: name,
        ..session.profile.clone()
    })
}

pub async fn list_users(state: &AppState, session: &Session) -> ApiResult<Vec<UserProfile>> {
    session.require_admin()?;
    Ok(db::users::list_profiles(&state.db).await?)
}

/// Load `uid` and check that `session` may moderate it
async fn moderation_target(
    state: &AppState,
    session: &Session,
    uid: &str,
) -> ApiResult<UserProfile> {
    session.require_admin()?;
    let target = db::users::get_profile(&state.db, uid)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {}", uid)))?;
    if !session.profile.can_moderate(&target) {
        return Err(ApiError::Forbidden(
            "admins cannot modify themselves or other admins".to_string(),
        ));
    }
    Ok(target)
}

fn announce(state: &AppState, profile: &UserProfile) {
    state.event_bus.emit_lossy(DramaEvent::UserModerated {
        uid: profile.uid.clone(),
        is_admin: profile.is_admin,
        suspended_until: profile.suspended_until,
        timestamp: dramawave_common::time::now(),
    });
}

/// Suspend `uid` for `days` days from `now_ms`
pub async fn suspend(
    state: &AppState,
    session: &Session,
    uid: &str,
    days: i64,
    now_ms: i64,
) -> ApiResult<UserProfile> {
    if days <= 0 {
        return Err(ApiError::BadRequest("days must be positive".to_string()));
    }
    let mut target = moderation_target(state, session, uid).await?;

    let until = now_ms.saturating_add(days.saturating_mul(DAY_MS));
    db::users::set_suspended_until(&state.db, uid, Some(until)).await?;
    target.suspended_until = Some(until);

    info!(user = uid, days = days, "Suspended by {}", session.uid());
    announce(state, &target);
    Ok(target)
}

pub async fn lift_suspension(
    state: &AppState,
    session: &Session,
    uid: &str,
) -> ApiResult<UserProfile> {
    let mut target = moderation_target(state, session, uid).await?;

    db::users::set_suspended_until(&state.db, uid, None).await?;
    target.suspended_until = None;

    info!(user = uid, "Suspension lifted by {}", session.uid());
    announce(state, &target);
    Ok(target)
}

/// Flip the admin role of `uid`
///
/// Since admins cannot be moderated, this only ever promotes.
pub async fn toggle_admin(
    state: &AppState,
    session: &Session,
    uid: &str,
) -> ApiResult<UserProfile> {
    let mut target = moderation_target(state, session, uid).await?;

    target.is_admin = !target.is_admin;
    db::users::set_admin(&state.db, uid, target.is_admin).await?;

    info!(user = uid, is_admin = target.is_admin, "Role changed by {}", session.uid());
    announce(state, &target);
    Ok(target)
}

/// Promote the configured user ids at startup
///
/// Ids without a profile yet get one, so the role applies on first sign-in.
pub async fn bootstrap_admins(pool: &SqlitePool, uids: &[String]) -> dramawave_common::Result<()> {
    for uid in uids.iter().map(|u| u.trim()).filter(|u| !u.is_empty()) {
        db::users::ensure_profile(pool, uid, None, None).await?;
        if db::users::set_admin(pool, uid, true).await? {
            info!("Bootstrap admin: {}", uid);
        } else {
            warn!("Bootstrap admin {} could not be promoted", uid);
        }
    }
    Ok(())
}
