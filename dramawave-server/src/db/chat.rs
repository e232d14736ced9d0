//! Global chat room

use dramawave_common::models::{ChatMessage, CommentBody};
use dramawave_common::Result;
use sqlx::{Row, SqlitePool};

use super::author_fields;

pub async fn insert_message(pool: &SqlitePool, message: &ChatMessage) -> Result<()> {
    sqlx::query(
        "INSERT INTO global_chat (id, author_id, timestamp, body_type, body) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&message.id)
    .bind(&message.author_id)
    .bind(message.timestamp)
    .bind(message.body.kind())
    .bind(message.body.value())
    .execute(pool)
    .await?;
    Ok(())
}

/// The last `limit` messages, oldest first
pub async fn recent_messages(pool: &SqlitePool, limit: i64) -> Result<Vec<ChatMessage>> {
    let rows = sqlx::query(
        r#"
        SELECT m.id, m.author_id, m.timestamp, m.body_type, m.body, u.display_name, u.email
        FROM global_chat m
        LEFT JOIN users u ON u.uid = m.author_id
        ORDER BY m.id DESC
        LIMIT ?
        "#,
    )
    .bind(limit.max(0))
    .fetch_all(pool)
    .await?;

    let mut messages = rows
        .iter()
        .map(|row| {
            let author_id: String = row.get("author_id");
            let (author_name, author_avatar) =
                author_fields(&author_id, row.get("display_name"), row.get("email"));
            let body_type: String = row.get("body_type");
            Ok(ChatMessage {
                id: row.get("id"),
                author_id,
                author_name,
                author_avatar,
                timestamp: row.get("timestamp"),
                body: CommentBody::from_parts(&body_type, row.get("body"))?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    messages.reverse();
    Ok(messages)
}
