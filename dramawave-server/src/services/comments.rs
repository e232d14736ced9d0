//! Comment threads and the global chat room

use dramawave_common::events::DramaEvent;
use dramawave_common::ids::stamped_push_key;
use dramawave_common::models::{ChatMessage, Comment, CommentBody};
use dramawave_common::threads::{build_threads, collapse_threads, ThreadNode};
use serde::Deserialize;
use tracing::{debug, info};

use super::validation::normalize_body;
use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct NewComment {
    pub body: CommentBody,
    /// Set for replies; an unknown parent renders the reply top-level
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewChatMessage {
    pub body: CommentBody,
}

/// Threads of a content item, nested down to `display_depth` reply levels
pub async fn list_threads(
    state: &AppState,
    content_id: &str,
    display_depth: Option<usize>,
) -> ApiResult<Vec<ThreadNode>> {
    if !db::content::content_exists(&state.db, content_id).await? {
        return Err(ApiError::NotFound(format!("content {}", content_id)));
    }

    let comments = db::comments::list_comments(&state.db, content_id).await?;
    debug!(content_id = content_id, count = comments.len(), "Building comment threads");

    let limits = &state.config.comments;
    let depth = display_depth
        .unwrap_or(limits.display_depth)
        .min(limits.max_display_depth)
        .max(1);
    Ok(collapse_threads(build_threads(comments), depth))
}

pub async fn post_comment(
    state: &AppState,
    session: &Session,
    content_id: &str,
    input: NewComment,
) -> ApiResult<Comment> {
    let now = dramawave_common::time::now_millis();
    session.require_active(now)?;
    let body = normalize_body(input.body, state.config.comments.max_text_len)?;

    if !db::content::content_exists(&state.db, content_id).await? {
        return Err(ApiError::NotFound(format!("content {}", content_id)));
    }

    let profile = &session.profile;
    let (id, timestamp) = stamped_push_key(now);
    let comment = Comment {
        id,
        content_id: content_id.to_string(),
        author_id: profile.uid.clone(),
        author_name: profile.display_name.clone(),
        author_avatar: profile.avatar_url(),
        timestamp,
        body,
        parent_id: input.parent_id.filter(|p| !p.trim().is_empty()),
    };
    db::comments::insert_comment(&state.db, &comment).await?;

    info!(
        content_id = content_id,
        comment_id = %comment.id,
        reply = comment.parent_id.is_some(),
        "Comment posted by {}",
        profile.uid
    );
    state.event_bus.emit_lossy(DramaEvent::CommentAdded {
        comment: comment.clone(),
        timestamp: dramawave_common::time::now(),
    });

    Ok(comment)
}

/// Most recent chat messages, oldest first
pub async fn chat_history(state: &AppState) -> ApiResult<Vec<ChatMessage>> {
    let limit = state.config.chat.history_limit;
    Ok(db::chat::recent_messages(&state.db, limit).await?)
}

pub async fn post_chat_message(
    state: &AppState,
    session: &Session,
    input: NewChatMessage,
) -> ApiResult<ChatMessage> {
    let now = dramawave_common::time::now_millis();
    session.require_active(now)?;
    let body = normalize_body(input.body, state.config.comments.max_text_len)?;

    let profile = &session.profile;
    let (id, timestamp) = stamped_push_key(now);
    let message = ChatMessage {
        id,
        author_id: profile.uid.clone(),
        author_name: profile.display_name.clone(),
        author_avatar: profile.avatar_url(),
        timestamp,
        body,
    };
    db::chat::insert_message(&state.db, &message).await?;

    debug!(message_id = %message.id, "Chat message from {}", profile.uid);
    state.event_bus.emit_lossy(DramaEvent::ChatMessagePosted {
        message: message.clone(),
        timestamp: dramawave_common::time::now(),
    });

    Ok(message)
}
