//! Notifications and per-user seen sets

use dramawave_common::models::{ContentKind, Notification};
use dramawave_common::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::HashSet;

pub async fn insert_notification(
    conn: &mut SqliteConnection,
    notification: &Notification,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO notifications (id, content_id, title, description, image_url, created_at, kind)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&notification.id)
    .bind(&notification.content_id)
    .bind(&notification.title)
    .bind(&notification.description)
    .bind(&notification.image_url)
    .bind(notification.created_at)
    .bind(notification.kind.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Notifications created after `since_ms`, newest first
pub async fn list_since(pool: &SqlitePool, since_ms: i64) -> Result<Vec<Notification>> {
    let rows = sqlx::query(
        r#"
        SELECT id, content_id, title, description, image_url, created_at, kind
        FROM notifications
        WHERE created_at > ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(since_ms)
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let kind: String = row.get("kind");
            Ok(Notification {
                id: row.get("id"),
                content_id: row.get("content_id"),
                title: row.get("title"),
                description: row.get("description"),
                image_url: row.get("image_url"),
                created_at: row.get("created_at"),
                kind: ContentKind::parse(&kind)?,
            })
        })
        .collect()
}

pub async fn seen_ids(pool: &SqlitePool, uid: &str) -> Result<HashSet<String>> {
    let ids: Vec<String> =
        sqlx::query_scalar("SELECT notification_id FROM seen_notifications WHERE user_id = ?")
            .bind(uid)
            .fetch_all(pool)
            .await?;
    Ok(ids.into_iter().collect())
}

/// Add ids to the user's seen set; returns how many were new
pub async fn mark_seen(pool: &SqlitePool, uid: &str, ids: &[String], now_ms: i64) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut added = 0;
    for id in ids {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO seen_notifications (user_id, notification_id, seen_at) VALUES (?, ?, ?)",
        )
        .bind(uid)
        .bind(id)
        .bind(now_ms)
        .execute(&mut *tx)
        .await?;
        added += result.rows_affected();
    }
    tx.commit().await?;
    Ok(added)
}
