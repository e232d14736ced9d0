//! User profiles

use dramawave_common::models::UserProfile;
use dramawave_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// Name given to a profile created without one
pub const DEFAULT_DISPLAY_NAME: &str = "User";

fn row_to_profile(row: &SqliteRow) -> UserProfile {
    UserProfile {
        uid: row.get("uid"),
        email: row.get("email"),
        display_name: row.get("display_name"),
        is_admin: row.get::<i64, _>("is_admin") != 0,
        suspended_until: row.get("suspended_until"),
    }
}

/// Create the profile on first sight, refresh the e-mail otherwise
///
/// The display name is only used when the row is created; later renames
/// go through [`set_display_name`].
pub async fn ensure_profile(
    pool: &SqlitePool,
    uid: &str,
    email: Option<&str>,
    display_name: Option<&str>,
) -> Result<UserProfile> {
    let name = display_name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| email.and_then(|e| e.split('@').next()).map(str::to_string))
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

    sqlx::query(
        r#"
        INSERT INTO users (uid, email, display_name, is_admin, created_at)
        VALUES (?, ?, ?, 0, ?)
        ON CONFLICT(uid) DO UPDATE SET email = COALESCE(excluded.email, users.email)
        "#,
    )
    .bind(uid)
    .bind(email)
    .bind(&name)
    .bind(dramawave_common::time::now_millis())
    .execute(pool)
    .await?;

    get_profile(pool, uid)
        .await?
        .ok_or_else(|| dramawave_common::Error::Internal(format!("profile {} vanished", uid)))
}

pub async fn get_profile(pool: &SqlitePool, uid: &str) -> Result<Option<UserProfile>> {
    let row = sqlx::query(
        "SELECT uid, email, display_name, is_admin, suspended_until FROM users WHERE uid = ?",
    )
    .bind(uid)
    .fetch_optional(pool)
    .await?;

    Ok(row.as_ref().map(row_to_profile))
}

/// All profiles ordered by display name
pub async fn list_profiles(pool: &SqlitePool) -> Result<Vec<UserProfile>> {
    let rows = sqlx::query(
        r#"
        SELECT uid, email, display_name, is_admin, suspended_until
        FROM users
        ORDER BY display_name COLLATE NOCASE, uid
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(row_to_profile).collect())
}

/// Returns false when the user does not exist
pub async fn set_display_name(pool: &SqlitePool, uid: &str, display_name: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET display_name = ? WHERE uid = ?")
        .bind(display_name)
        .bind(uid)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_suspended_until(
    pool: &SqlitePool,
    uid: &str,
    suspended_until: Option<i64>,
) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET suspended_until = ? WHERE uid = ?")
        .bind(suspended_until)
        .bind(uid)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_admin(pool: &SqlitePool, uid: &str, is_admin: bool) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET is_admin = ? WHERE uid = ?")
        .bind(is_admin as i64)
        .bind(uid)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
