//! Application-wide singleton rows
//!
//! The daily recommendation lives in the `dorama_update` row. Filling it is
//! guarded by a claim: a token plus claim time and day, taken inside a
//! transaction and checked again when the result is stored.

use dramawave_common::Result;
use sqlx::{Row, SqliteConnection, SqlitePool};

/// Key of the recommendation row
pub const RECOMMENDATION_KEY: &str = "dorama_update";

/// Snapshot of the recommendation row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendationRow {
    pub last_fetch_date: Option<String>,
    pub recommendations: Option<String>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<i64>,
    pub claim_date: Option<String>,
}

impl RecommendationRow {
    /// Non-empty text stored for `date`
    pub fn fresh_text(&self, date: &str) -> Option<&str> {
        match (&self.last_fetch_date, &self.recommendations) {
            (Some(d), Some(text)) if d == date && !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }

    /// Whether someone holds an unexpired claim for `date`
    pub fn has_live_claim(&self, date: &str, now_ms: i64, ttl_ms: i64) -> bool {
        match (&self.claimed_by, self.claimed_at, &self.claim_date) {
            (Some(_), Some(at), Some(d)) => d == date && now_ms - at < ttl_ms,
            _ => false,
        }
    }

    /// Previous text, if any
    pub fn stale_text(&self) -> Option<&str> {
        self.recommendations
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}

/// Create the row if missing
///
/// Issued first inside the claim transaction so SQLite takes the write lock
/// before the row is read.
pub async fn ensure_recommendation_row(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO app_state (key) VALUES (?)")
        .bind(RECOMMENDATION_KEY)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn load_recommendation_row(conn: &mut SqliteConnection) -> Result<RecommendationRow> {
    let row = sqlx::query(
        r#"
        SELECT last_fetch_date, recommendations, claimed_by, claimed_at, claim_date
        FROM app_state WHERE key = ?
        "#,
    )
    .bind(RECOMMENDATION_KEY)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row
        .map(|row| RecommendationRow {
            last_fetch_date: row.get("last_fetch_date"),
            recommendations: row.get("recommendations"),
            claimed_by: row.get("claimed_by"),
            claimed_at: row.get("claimed_at"),
            claim_date: row.get("claim_date"),
        })
        .unwrap_or_default())
}

/// Read-only lookup outside any transaction
pub async fn read_recommendation_row(pool: &SqlitePool) -> Result<RecommendationRow> {
    let mut conn = pool.acquire().await?;
    load_recommendation_row(&mut conn).await
}

pub async fn set_claim(
    conn: &mut SqliteConnection,
    token: &str,
    now_ms: i64,
    date: &str,
) -> Result<()> {
    sqlx::query(
        "UPDATE app_state SET claimed_by = ?, claimed_at = ?, claim_date = ? WHERE key = ?",
    )
    .bind(token)
    .bind(now_ms)
    .bind(date)
    .bind(RECOMMENDATION_KEY)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Store the text if `token` still holds the claim; clears the claim
pub async fn store_if_claimed(
    pool: &SqlitePool,
    token: &str,
    date: &str,
    text: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE app_state
        SET last_fetch_date = ?, recommendations = ?,
            claimed_by = NULL, claimed_at = NULL, claim_date = NULL
        WHERE key = ? AND claimed_by = ?
        "#,
    )
    .bind(date)
    .bind(text)
    .bind(RECOMMENDATION_KEY)
    .bind(token)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop the claim held by `token`
pub async fn release_claim(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE app_state
        SET claimed_by = NULL, claimed_at = NULL, claim_date = NULL
        WHERE key = ? AND claimed_by = ?
        "#,
    )
    .bind(RECOMMENDATION_KEY)
    .bind(token)
    .execute(pool)
    .await?;
    Ok(())
}
