//! Comment store

use dramawave_common::models::{Comment, CommentBody};
use dramawave_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::author_fields;

const SELECT_COMMENTS: &str = r#"
    SELECT c.id, c.content_id, c.author_id, c.timestamp, c.body_type, c.body, c.parent_id,
           u.display_name, u.email
    FROM comments c
    LEFT JOIN users u ON u.uid = c.author_id
"#;

fn row_to_comment(row: &SqliteRow) -> Result<Comment> {
    let author_id: String = row.get("author_id");
    let (author_name, author_avatar) =
        author_fields(&author_id, row.get("display_name"), row.get("email"));
    let body_type: String = row.get("body_type");

    Ok(Comment {
        id: row.get("id"),
        content_id: row.get("content_id"),
        author_id,
        author_name,
        author_avatar,
        timestamp: row.get("timestamp"),
        body: CommentBody::from_parts(&body_type, row.get("body"))?,
        parent_id: row.get("parent_id"),
    })
}

/// Store a new comment (names are not stored)
pub async fn insert_comment(pool: &SqlitePool, comment: &Comment) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO comments (id, content_id, author_id, timestamp, body_type, body, parent_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&comment.id)
    .bind(&comment.content_id)
    .bind(&comment.author_id)
    .bind(comment.timestamp)
    .bind(comment.body.kind())
    .bind(comment.body.value())
    .bind(&comment.parent_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Every comment of a content item, in key order
pub async fn list_comments(pool: &SqlitePool, content_id: &str) -> Result<Vec<Comment>> {
    let rows = sqlx::query(&format!("{} WHERE c.content_id = ? ORDER BY c.id", SELECT_COMMENTS))
        .bind(content_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(row_to_comment).collect()
}

pub async fn get_comment(
    pool: &SqlitePool,
    content_id: &str,
    comment_id: &str,
) -> Result<Option<Comment>> {
    let row = sqlx::query(&format!(
        "{} WHERE c.content_id = ? AND c.id = ?",
        SELECT_COMMENTS
    ))
    .bind(content_id)
    .bind(comment_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_comment).transpose()
}

/// (id, parent_id) pairs for a content item
pub async fn parent_links(
    pool: &SqlitePool,
    content_id: &str,
) -> Result<Vec<(String, Option<String>)>> {
    let rows = sqlx::query("SELECT id, parent_id FROM comments WHERE content_id = ?")
        .bind(content_id)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| (row.get("id"), row.get("parent_id")))
        .collect())
}

/// Returns false when nothing was deleted
pub async fn delete_comment(pool: &SqlitePool, content_id: &str, comment_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM comments WHERE content_id = ? AND id = ?")
        .bind(content_id)
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
