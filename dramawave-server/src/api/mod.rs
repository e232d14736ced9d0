//! HTTP API handlers for dramawave-server

pub mod chat;
pub mod comments;
pub mod content;
pub mod health;
pub mod notifications;
pub mod recommendations;
pub mod sse;
pub mod stickers;
pub mod users;

pub use health::health_routes;
pub use sse::event_stream;
