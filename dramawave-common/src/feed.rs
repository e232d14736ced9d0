//! Notification feed window and unread counting
//!
//! Notifications are never deleted. The feed is a time-windowed read: a
//! notification is visible while it is younger than the window.

use std::collections::HashSet;

use crate::models::Notification;
use crate::time::HOUR_MS;

/// Default feed window: 24 hours in milliseconds
pub const DEFAULT_WINDOW_MS: i64 = 24 * HOUR_MS;

/// Whether a notification created at `created_at` is still in the feed
pub fn is_visible(created_at: i64, now_ms: i64, window_ms: i64) -> bool {
    now_ms.saturating_sub(created_at) < window_ms
}

/// Visible notifications, newest first
pub fn visible_feed(
    notifications: Vec<Notification>,
    now_ms: i64,
    window_ms: i64,
) -> Vec<Notification> {
    let mut feed: Vec<Notification> = notifications
        .into_iter()
        .filter(|n| is_visible(n.created_at, now_ms, window_ms))
        .collect();
    feed.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    feed
}

/// Ids in the feed that are absent from the seen set, in feed order
pub fn unseen_ids(feed: &[Notification], seen: &HashSet<String>) -> Vec<String> {
    feed.iter()
        .filter(|n| !seen.contains(&n.id))
        .map(|n| n.id.clone())
        .collect()
}

/// Number of feed notifications the user has not seen
pub fn unread_count(feed: &[Notification], seen: &HashSet<String>) -> usize {
    feed.iter().filter(|n| !seen.contains(&n.id)).count()
}
