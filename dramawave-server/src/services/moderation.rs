//! Moderation canceller
//!
//! Removes a comment and its replies level by level, down to a fixed number
//! of descendant levels. Replies below that depth stay in the store and read
//! back as top-level comments. Every deletion stands on its own: a failure is
//! recorded and the cascade carries on, including below the failed comment.

use async_trait::async_trait;
use dramawave_common::events::DramaEvent;
use dramawave_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::db;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use crate::AppState;

/// Storage operations the cascade needs
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// (id, parent_id) for every comment of a content item
    async fn parent_links(&self, content_id: &str) -> Result<Vec<(String, Option<String>)>>;

    /// Returns false when the comment was already gone
    async fn delete_comment(&self, content_id: &str, comment_id: &str) -> Result<bool>;
}

/// SQLite-backed comment store
pub struct SqliteCommentStore {
    pool: SqlitePool,
}

impl SqliteCommentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentStore for SqliteCommentStore {
    async fn parent_links(&self, content_id: &str) -> Result<Vec<(String, Option<String>)>> {
        db::comments::parent_links(&self.pool, content_id).await
    }

    async fn delete_comment(&self, content_id: &str, comment_id: &str) -> Result<bool> {
        db::comments::delete_comment(&self.pool, content_id, comment_id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDeletion {
    pub id: String,
    pub reason: String,
}

/// Outcome of one cancellation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    /// Deleted ids, target first, then level by level
    pub removed: Vec<String>,
    pub failed: Vec<FailedDeletion>,
}

/// Ids to delete per level: `[target]`, its replies, their replies, ...
///
/// At most `depth` descendant levels. Ids already scheduled are skipped, so
/// corrupt parent cycles terminate.
pub fn cascade_levels(
    links: &[(String, Option<String>)],
    target: &str,
    depth: usize,
) -> Vec<Vec<String>> {
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for (id, parent) in links {
        if let Some(parent) = parent.as_deref() {
            children.entry(parent).or_default().push(id.as_str());
        }
    }

    let mut scheduled: HashSet<&str> = HashSet::from([target]);
    let mut levels = vec![vec![target.to_string()]];

    for _ in 0..depth {
        let mut next: Vec<&str> = Vec::new();
        if let Some(previous) = levels.last() {
            for id in previous {
                for &child in children.get(id.as_str()).into_iter().flatten() {
                    if scheduled.insert(child) {
                        next.push(child);
                    }
                }
            }
        }
        if next.is_empty() {
            break;
        }
        next.sort_unstable();
        levels.push(next.into_iter().map(str::to_string).collect());
    }

    levels
}

/// Delete `comment_id` and up to `depth` levels of replies
///
/// Fails only when the comment does not exist or the store cannot be read;
/// individual deletion failures land in the report.
pub async fn cancel_comment(
    store: &dyn CommentStore,
    content_id: &str,
    comment_id: &str,
    depth: usize,
) -> Result<CascadeReport> {
    let links = store.parent_links(content_id).await?;
    if !links.iter().any(|(id, _)| id == comment_id) {
        return Err(Error::NotFound(format!("comment {}", comment_id)));
    }

    let mut report = CascadeReport::default();
    for level in cascade_levels(&links, comment_id, depth) {
        for id in level {
            match store.delete_comment(content_id, &id).await {
                Ok(true) => report.removed.push(id),
                Ok(false) => report.failed.push(FailedDeletion {
                    id,
                    reason: "already removed".to_string(),
                }),
                Err(e) => {
                    warn!("Failed to delete comment {}: {}", id, e);
                    report.failed.push(FailedDeletion {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    Ok(report)
}

/// Cancel a comment on behalf of `session` (its author or an admin)
pub async fn cancel_for_session(
    state: &AppState,
    session: &Session,
    content_id: &str,
    comment_id: &str,
) -> ApiResult<CascadeReport> {
    let comment = db::comments::get_comment(&state.db, content_id, comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("comment {}", comment_id)))?;

    if !session.is_admin() && comment.author_id != session.uid() {
        return Err(ApiError::Forbidden(
            "only the author or an admin can remove a comment".to_string(),
        ));
    }

    let store = SqliteCommentStore::new(state.db.clone());
    let depth = state.config.comments.cascade_depth;
    let report = cancel_comment(&store, content_id, comment_id, depth).await?;

    info!(
        content_id = content_id,
        comment_id = comment_id,
        removed = report.removed.len(),
        failed = report.failed.len(),
        "Comment cancelled by {}",
        session.uid()
    );

    if !report.removed.is_empty() {
        state.event_bus.emit_lossy(DramaEvent::CommentsRemoved {
            content_id: content_id.to_string(),
            removed: report.removed.clone(),
            timestamp: dramawave_common::time::now(),
        });
    }

    Ok(report)
}
