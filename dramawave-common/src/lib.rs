//! # DramaWave Common Library
//!
//! Shared code for the DramaWave backend:
//! - Data model (content, comments, notifications, profiles, stickers)
//! - Comment thread building and the notification feed window
//! - Push-key identifiers
//! - Event types (DramaEvent) and the EventBus
//! - Configuration loading and database initialisation

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod feed;
pub mod ids;
pub mod models;
pub mod sse;
pub mod threads;
pub mod time;

pub use error::{Error, Result};
pub use models::{Comment, CommentBody, Content, ContentKind, Notification, UserProfile};
