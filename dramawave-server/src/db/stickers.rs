//! Sticker catalogue

use dramawave_common::models::{Sticker, StickerKind};
use dramawave_common::Result;
use sqlx::{Row, SqlitePool};

pub async fn list_stickers(pool: &SqlitePool) -> Result<Vec<Sticker>> {
    let rows = sqlx::query("SELECT id, kind, value FROM stickers ORDER BY created_at, id")
        .fetch_all(pool)
        .await?;

    rows.iter()
        .map(|row| {
            let kind: String = row.get("kind");
            Ok(Sticker {
                id: row.get("id"),
                kind: StickerKind::parse(&kind)?,
                value: row.get("value"),
            })
        })
        .collect()
}

pub async fn insert_sticker(pool: &SqlitePool, sticker: &Sticker, now_ms: i64) -> Result<()> {
    sqlx::query("INSERT INTO stickers (id, kind, value, created_at) VALUES (?, ?, ?, ?)")
        .bind(&sticker.id)
        .bind(sticker.kind.as_str())
        .bind(&sticker.value)
        .bind(now_ms)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_sticker(pool: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM stickers WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
