//! Catalog: content, episodes and likes

use dramawave_common::models::{Content, ContentKind, Episode};
use dramawave_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

const CONTENT_COLUMNS: &str =
    "id, kind, title, description, image_url, video_url, genres, in_emission, likes, created_at";

fn row_to_content(row: &SqliteRow) -> Result<Content> {
    let kind: String = row.get("kind");
    let genres: String = row.get("genres");
    let genres: Vec<String> = serde_json::from_str(&genres)
        .map_err(|e| Error::Internal(format!("corrupt genres column: {}", e)))?;

    Ok(Content {
        id: row.get("id"),
        kind: ContentKind::parse(&kind)?,
        title: row.get("title"),
        description: row.get("description"),
        image_url: row.get("image_url"),
        video_url: row.get("video_url"),
        genres,
        in_emission: row.get::<i64, _>("in_emission") != 0,
        likes: row.get("likes"),
        liked_by: Vec::new(),
        created_at: row.get("created_at"),
        episodes: Vec::new(),
    })
}

fn genres_json(genres: &[String]) -> Result<String> {
    serde_json::to_string(genres).map_err(|e| Error::Internal(e.to_string()))
}

/// Fill episodes and liked_by for a content row
async fn hydrate(pool: &SqlitePool, mut content: Content) -> Result<Content> {
    content.episodes = list_episodes(pool, &content.id).await?;
    content.liked_by = sqlx::query_scalar(
        "SELECT user_id FROM content_likes WHERE content_id = ? ORDER BY liked_at, user_id",
    )
    .bind(&content.id)
    .fetch_all(pool)
    .await?;
    Ok(content)
}

/// Episodes ordered by number
pub async fn list_episodes(pool: &SqlitePool, content_id: &str) -> Result<Vec<Episode>> {
    let rows = sqlx::query(
        r#"
        SELECT episode_number, title, video_url, description
        FROM episodes
        WHERE content_id = ?
        ORDER BY episode_number
        "#,
    )
    .bind(content_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| Episode {
            episode_number: row.get("episode_number"),
            title: row.get("title"),
            video_url: row.get("video_url"),
            description: row.get("description"),
        })
        .collect())
}

pub async fn get_content(pool: &SqlitePool, id: &str) -> Result<Option<Content>> {
    let row = sqlx::query(&format!("SELECT {} FROM content WHERE id = ?", CONTENT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(Some(hydrate(pool, row_to_content(&row)?).await?)),
        None => Ok(None),
    }
}

pub async fn content_exists(pool: &SqlitePool, id: &str) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM content WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Newest first, optionally one kind only
pub async fn list_content(pool: &SqlitePool, kind: Option<ContentKind>) -> Result<Vec<Content>> {
    let rows = match kind {
        Some(kind) => {
            sqlx::query(&format!(
                "SELECT {} FROM content WHERE kind = ? ORDER BY created_at DESC, id DESC",
                CONTENT_COLUMNS
            ))
            .bind(kind.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(&format!(
                "SELECT {} FROM content ORDER BY created_at DESC, id DESC",
                CONTENT_COLUMNS
            ))
            .fetch_all(pool)
            .await?
        }
    };

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(hydrate(pool, row_to_content(row)?).await?);
    }
    Ok(items)
}

/// Content liked by `uid`, most liked first
pub async fn list_favorites(pool: &SqlitePool, uid: &str) -> Result<Vec<Content>> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.kind, c.title, c.description, c.image_url, c.video_url,
               c.genres, c.in_emission, c.likes, c.created_at
        FROM content c
        JOIN content_likes l ON l.content_id = c.id
        WHERE l.user_id = ?
        ORDER BY c.likes DESC, c.created_at DESC
        "#,
    )
    .bind(uid)
    .fetch_all(pool)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(hydrate(pool, row_to_content(row)?).await?);
    }
    Ok(items)
}

/// Insert a content row and its episodes
pub async fn insert_content(conn: &mut SqliteConnection, content: &Content) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO content (id, kind, title, description, image_url, video_url,
                             genres, in_emission, likes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?)
        "#,
    )
    .bind(&content.id)
    .bind(content.kind.as_str())
    .bind(&content.title)
    .bind(&content.description)
    .bind(&content.image_url)
    .bind(&content.video_url)
    .bind(genres_json(&content.genres)?)
    .bind(content.in_emission as i64)
    .bind(content.created_at)
    .execute(&mut *conn)
    .await?;

    for episode in &content.episodes {
        insert_episode(&mut *conn, &content.id, episode).await?;
    }
    Ok(())
}

/// Overwrite editable fields and replace the episode list
///
/// Likes and creation time are left alone. Returns false when the content
/// does not exist.
pub async fn update_content(conn: &mut SqliteConnection, content: &Content) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE content
        SET kind = ?, title = ?, description = ?, image_url = ?, video_url = ?,
            genres = ?, in_emission = ?
        WHERE id = ?
        "#,
    )
    .bind(content.kind.as_str())
    .bind(&content.title)
    .bind(&content.description)
    .bind(&content.image_url)
    .bind(&content.video_url)
    .bind(genres_json(&content.genres)?)
    .bind(content.in_emission as i64)
    .bind(&content.id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM episodes WHERE content_id = ?")
        .bind(&content.id)
        .execute(&mut *conn)
        .await?;
    for episode in &content.episodes {
        insert_episode(&mut *conn, &content.id, episode).await?;
    }
    Ok(true)
}

pub async fn insert_episode(
    conn: &mut SqliteConnection,
    content_id: &str,
    episode: &Episode,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO episodes (content_id, episode_number, title, video_url, description)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(content_id)
    .bind(episode.episode_number)
    .bind(&episode.title)
    .bind(&episode.video_url)
    .bind(&episode.description)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Next free 1-based episode number
pub async fn next_episode_number(conn: &mut SqliteConnection, content_id: &str) -> Result<i64> {
    let max: Option<i64> =
        sqlx::query_scalar("SELECT MAX(episode_number) FROM episodes WHERE content_id = ?")
            .bind(content_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(max.unwrap_or(0) + 1)
}
