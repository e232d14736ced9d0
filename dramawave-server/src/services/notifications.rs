//! Notification feed and unread counter

use dramawave_common::events::DramaEvent;
use dramawave_common::feed::{unread_count, unseen_ids, visible_feed};
use dramawave_common::models::Notification;
use tracing::debug;

use crate::db;
use crate::error::ApiResult;
use crate::session::Session;
use crate::AppState;

/// Notifications inside the feed window, newest first
pub async fn feed(state: &AppState, now_ms: i64) -> ApiResult<Vec<Notification>> {
    let window = state.config.notifications.window_ms();
    let candidates = db::notifications::list_since(&state.db, now_ms.saturating_sub(window)).await?;
    Ok(visible_feed(candidates, now_ms, window))
}

/// Feed entries `session` has not marked as seen
pub async fn unread(state: &AppState, session: &Session, now_ms: i64) -> ApiResult<usize> {
    let feed = feed(state, now_ms).await?;
    let seen = db::notifications::seen_ids(&state.db, session.uid()).await?;
    Ok(unread_count(&feed, &seen))
}

/// Mark every unseen feed entry as seen; returns the newly marked ids
pub async fn mark_feed_seen(
    state: &AppState,
    session: &Session,
    now_ms: i64,
) -> ApiResult<Vec<String>> {
    let feed = feed(state, now_ms).await?;
    let seen = db::notifications::seen_ids(&state.db, session.uid()).await?;
    let ids = unseen_ids(&feed, &seen);
    if ids.is_empty() {
        return Ok(ids);
    }

    let inserted = db::notifications::mark_seen(&state.db, session.uid(), &ids, now_ms).await?;
    debug!(user = session.uid(), inserted = inserted, "Notifications marked seen");

    state.event_bus.emit_lossy(DramaEvent::NotificationsSeen {
        user_id: session.uid().to_string(),
        notification_ids: ids.clone(),
        timestamp: dramawave_common::time::now(),
    });
    Ok(ids)
}
