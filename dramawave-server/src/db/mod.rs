//! Database access layer
//!
//! Plain functions over `SqlitePool` (reads) or `SqliteConnection` (writes
//! that callers may group in a transaction). Author names and avatars are
//! joined from `users` at read time.

pub mod app_state;
pub mod chat;
pub mod comments;
pub mod content;
pub mod notifications;
pub mod stickers;
pub mod users;

/// Shown when a comment's author has no profile row
pub const UNKNOWN_AUTHOR: &str = "Unknown user";

/// Author display name and avatar from joined `users` columns
pub(crate) fn author_fields(
    author_id: &str,
    display_name: Option<String>,
    email: Option<String>,
) -> (String, String) {
    let name = display_name.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    let avatar = dramawave_common::models::avatar_url_for(email.as_deref().unwrap_or(author_id));
    (name, avatar)
}
