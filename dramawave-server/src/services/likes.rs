//! Like toggle and favorites

use dramawave_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;

/// State after a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeOutcome {
    pub liked: bool,
    pub likes: i64,
}

/// Flip `uid`'s like on a content item in one transaction
///
/// The first statement writes, so concurrent toggles serialize on the
/// SQLite write lock instead of reading a stale counter.
pub async fn toggle_like(
    pool: &SqlitePool,
    content_id: &str,
    uid: &str,
    now_ms: i64,
) -> Result<LikeOutcome> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM content_likes WHERE content_id = ? AND user_id = ?")
        .bind(content_id)
        .bind(uid)
        .execute(&mut *tx)
        .await?
        .rows_affected()
        > 0;

    let liked = if removed {
        sqlx::query("UPDATE content SET likes = MAX(likes - 1, 0) WHERE id = ?")
            .bind(content_id)
            .execute(&mut *tx)
            .await?;
        false
    } else {
        let updated = sqlx::query("UPDATE content SET likes = likes + 1 WHERE id = ?")
            .bind(content_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if updated == 0 {
            return Err(Error::NotFound(format!("content {}", content_id)));
        }
        sqlx::query("INSERT INTO content_likes (content_id, user_id, liked_at) VALUES (?, ?, ?)")
            .bind(content_id)
            .bind(uid)
            .bind(now_ms)
            .execute(&mut *tx)
            .await?;
        true
    };

    let likes: i64 = sqlx::query_scalar("SELECT likes FROM content WHERE id = ?")
        .bind(content_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(LikeOutcome { liked, likes })
}
