//! dramawave-server library
//!
//! HTTP backend for the DramaWave streaming catalog: content, episodes,
//! likes, threaded comments with cascade moderation, notifications, global
//! chat, stickers and the daily recommendation card.

use axum::Router;
use dramawave_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod services;
pub mod session;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};

use services::generator::{GeneratorError, HttpRecommendationGenerator, RecommendationGenerator};
use services::recommendation::RecommendationCache;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Change broadcast for SSE clients
    pub event_bus: EventBus,
    pub config: Arc<ServerConfig>,
    pub recommendations: RecommendationCache,
}

impl AppState {
    /// State with the HTTP recommendation generator from `config`
    pub fn new(db: SqlitePool, config: ServerConfig) -> Result<Self, GeneratorError> {
        let generator = HttpRecommendationGenerator::new(&config.recommendation)?;
        Ok(Self::with_generator(db, config, Arc::new(generator)))
    }

    pub fn with_generator(
        db: SqlitePool,
        config: ServerConfig,
        generator: Arc<dyn RecommendationGenerator>,
    ) -> Self {
        let recommendations = RecommendationCache::new(
            db.clone(),
            generator,
            config.recommendation.claim_ttl_secs,
        );
        Self {
            db,
            event_bus: EventBus::new(config.event_capacity),
            config: Arc::new(config),
            recommendations,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post};

    let api = Router::new()
        .route("/api/events", get(api::event_stream))
        .route(
            "/api/content",
            get(api::content::list_content).post(api::content::create_content),
        )
        .route(
            "/api/content/:id",
            get(api::content::get_content).put(api::content::update_content),
        )
        .route("/api/content/:id/episodes", post(api::content::add_episode))
        .route("/api/content/:id/like", post(api::content::toggle_like))
        .route("/api/favorites", get(api::content::list_favorites))
        .route(
            "/api/content/:id/comments",
            get(api::comments::list_comments).post(api::comments::post_comment),
        )
        .route(
            "/api/content/:id/comments/:comment_id",
            delete(api::comments::cancel_comment),
        )
        .route("/api/notifications", get(api::notifications::feed))
        .route("/api/notifications/unread", get(api::notifications::unread))
        .route("/api/notifications/seen", post(api::notifications::mark_seen))
        .route(
            "/api/chat",
            get(api::chat::history).post(api::chat::post_message),
        )
        .route("/api/me", get(api::users::me).put(api::users::rename))
        .route("/api/users", get(api::users::list_users))
        .route(
            "/api/users/:uid/suspend",
            post(api::users::suspend).delete(api::users::lift_suspension),
        )
        .route("/api/users/:uid/admin", post(api::users::toggle_admin))
        .route(
            "/api/stickers",
            get(api::stickers::list_stickers).post(api::stickers::add_sticker),
        )
        .route("/api/stickers/:id", delete(api::stickers::remove_sticker))
        .route(
            "/api/recommendations/daily",
            get(api::recommendations::daily),
        );

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
