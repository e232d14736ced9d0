//! Catalog management
//!
//! Admin-only writes. Every write is validated in full before the store is
//! touched; content creation and new episodes publish a notification in the
//! same transaction.

use dramawave_common::events::DramaEvent;
use dramawave_common::ids::stamped_push_key;
use dramawave_common::models::{Content, ContentKind, Episode, Notification};
use serde::Deserialize;
use tracing::info;

use super::validation::{is_valid_url, require_url};
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::AppState;

/// Minimum characters in a description
pub const MIN_DESCRIPTION_LEN: usize = 10;

/// Body of create and update requests
#[derive(Debug, Clone, Deserialize)]
pub struct ContentInput {
    pub kind: ContentKind,
    pub title: String,
    pub description: String,
    pub image_url: String,
    #[serde(default)]
    pub video_url: Option<String>,
    pub genres: Vec<String>,
    #[serde(default)]
    pub in_emission: bool,
    /// Full episode list; on update `None` keeps the stored one
    #[serde(default)]
    pub episodes: Option<Vec<EpisodeInput>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EpisodeInput {
    pub title: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default)]
    pub description: String,
}

fn validate_episode(episode: &EpisodeInput) -> ApiResult<()> {
    if episode.title.trim().is_empty() {
        return Err(ApiError::BadRequest("episode title is required".to_string()));
    }
    let url = episode.video_url.trim();
    if !url.is_empty() && !is_valid_url(url) {
        return Err(ApiError::BadRequest(
            "episode video_url must be a valid URL or empty".to_string(),
        ));
    }
    Ok(())
}

/// Reject invalid input before any write
pub fn validate_content(input: &ContentInput) -> ApiResult<()> {
    if input.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    if input.description.trim().chars().count() < MIN_DESCRIPTION_LEN {
        return Err(ApiError::BadRequest(format!(
            "description must be at least {} characters",
            MIN_DESCRIPTION_LEN
        )));
    }
    require_url("image_url", &input.image_url)?;
    if !input.genres.iter().any(|g| !g.trim().is_empty()) {
        return Err(ApiError::BadRequest("at least one genre is required".to_string()));
    }
    if input.kind == ContentKind::Movie {
        match input.video_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => require_url("video_url", url)?,
            _ => {
                return Err(ApiError::BadRequest(
                    "movies require a video_url".to_string(),
                ))
            }
        }
    }
    for episode in input.episodes.iter().flatten() {
        validate_episode(episode)?;
    }
    Ok(())
}

fn number_episodes(episodes: &[EpisodeInput]) -> Vec<Episode> {
    episodes
        .iter()
        .enumerate()
        .map(|(i, e)| Episode {
            episode_number: i as i64 + 1,
            title: e.title.trim().to_string(),
            video_url: e.video_url.trim().to_string(),
            description: e.description.trim().to_string(),
        })
        .collect()
}

/// Apply the input to `content`, normalizing kind-specific fields
///
/// Movies carry no episodes; series carry no video_url.
fn apply_input(content: &mut Content, input: ContentInput) {
    content.kind = input.kind;
    content.title = input.title.trim().to_string();
    content.description = input.description.trim().to_string();
    content.image_url = input.image_url.trim().to_string();
    content.genres = input
        .genres
        .iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect();
    content.in_emission = input.in_emission;
    if let Some(episodes) = &input.episodes {
        content.episodes = number_episodes(episodes);
    }

    match content.kind {
        ContentKind::Movie => {
            content.video_url = input.video_url.map(|u| u.trim().to_string());
            content.episodes.clear();
        }
        ContentKind::Series => content.video_url = None,
    }
}

pub async fn create_content(
    state: &AppState,
    session: &Session,
    input: ContentInput,
) -> ApiResult<Content> {
    session.require_admin()?;
    validate_content(&input)?;

    let now = dramawave_common::time::now_millis();
    let (id, created_at) = stamped_push_key(now);
    let mut content = Content {
        id,
        kind: input.kind,
        title: String::new(),
        description: String::new(),
        image_url: String::new(),
        video_url: None,
        genres: Vec::new(),
        in_emission: false,
        likes: 0,
        liked_by: Vec::new(),
        created_at,
        episodes: Vec::new(),
    };
    apply_input(&mut content, input);

    let (id, created_at) = stamped_push_key(now);
    let notification = Notification {
        id,
        content_id: content.id.clone(),
        title: content.title.clone(),
        description: content.description.clone(),
        image_url: content.image_url.clone(),
        created_at,
        kind: content.kind,
    };

    let mut tx = state.db.begin().await?;
    db::content::insert_content(&mut *tx, &content).await?;
    db::notifications::insert_notification(&mut *tx, &notification).await?;
    tx.commit().await?;

    info!(
        content_id = %content.id,
        kind = %content.kind,
        episodes = content.episodes.len(),
        "Content published by {}",
        session.uid()
    );

    let timestamp = dramawave_common::time::now();
    state.event_bus.emit_lossy(DramaEvent::ContentPublished {
        content_id: content.id.clone(),
        kind: content.kind,
        timestamp,
    });
    state.event_bus.emit_lossy(DramaEvent::NotificationPublished {
        notification,
        timestamp,
    });

    Ok(content)
}

pub async fn update_content(
    state: &AppState,
    session: &Session,
    content_id: &str,
    input: ContentInput,
) -> ApiResult<Content> {
    session.require_admin()?;
    validate_content(&input)?;

    let mut content = db::content::get_content(&state.db, content_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("content {}", content_id)))?;
    apply_input(&mut content, input);

    let mut tx = state.db.begin().await?;
    if !db::content::update_content(&mut *tx, &content).await? {
        return Err(ApiError::NotFound(format!("content {}", content_id)));
    }
    tx.commit().await?;

    info!(content_id = content_id, "Content updated by {}", session.uid());
    state.event_bus.emit_lossy(DramaEvent::ContentUpdated {
        content_id: content_id.to_string(),
        timestamp: dramawave_common::time::now(),
    });

    Ok(content)
}

/// Append an episode to a series and announce it
pub async fn add_episode(
    state: &AppState,
    session: &Session,
    content_id: &str,
    input: EpisodeInput,
) -> ApiResult<Episode> {
    session.require_admin()?;
    validate_episode(&input)?;

    let content = db::content::get_content(&state.db, content_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("content {}", content_id)))?;
    if content.kind != ContentKind::Series {
        return Err(ApiError::BadRequest("episodes can only be added to a series".to_string()));
    }

    let now = dramawave_common::time::now_millis();
    let mut tx = state.db.begin().await?;
    let episode = Episode {
        episode_number: db::content::next_episode_number(&mut *tx, content_id).await?,
        title: input.title.trim().to_string(),
        video_url: input.video_url.trim().to_string(),
        description: input.description.trim().to_string(),
    };
    db::content::insert_episode(&mut *tx, content_id, &episode).await?;

    let (id, created_at) = stamped_push_key(now);
    let notification = Notification {
        id,
        content_id: content_id.to_string(),
        title: format!("{}: {}", content.title, episode.title),
        description: if episode.description.is_empty() {
            content.description.clone()
        } else {
            episode.description.clone()
        },
        image_url: content.image_url.clone(),
        created_at,
        kind: ContentKind::Series,
    };
    db::notifications::insert_notification(&mut *tx, &notification).await?;
    tx.commit().await?;

    info!(
        content_id = content_id,
        episode = episode.episode_number,
        "Episode published by {}",
        session.uid()
    );

    let timestamp = dramawave_common::time::now();
    state.event_bus.emit_lossy(DramaEvent::EpisodePublished {
        content_id: content_id.to_string(),
        episode_number: episode.episode_number,
        timestamp,
    });
    state.event_bus.emit_lossy(DramaEvent::NotificationPublished {
        notification,
        timestamp,
    });

    Ok(episode)
}
