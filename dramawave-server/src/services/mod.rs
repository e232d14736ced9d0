//! Domain operations behind the HTTP handlers
//!
//! Services take the shared [`AppState`](crate::AppState) and, for writes,
//! the caller's [`Session`](crate::session::Session).

pub mod catalog;
pub mod comments;
pub mod generator;
pub mod likes;
pub mod moderation;
pub mod notifications;
pub mod recommendation;
pub mod stickers;
pub mod users;
pub mod validation;
