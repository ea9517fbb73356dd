//! Per-user export cursors

use crate::error::Result;
use curator_core::types::UserId;
use sqlx::SqlitePool;

/// Last exported action id; 0 when the user was never exported
pub async fn get(pool: &SqlitePool, user_id: UserId) -> Result<i64> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT last_song_action_id FROM export_cursors WHERE user_id = ?")
            .bind(user_id.get())
            .fetch_optional(pool)
            .await?;

    Ok(row.map_or(0, |(last_id,)| last_id))
}

/// Upsert the cursor
pub async fn set(pool: &SqlitePool, user_id: UserId, last_action_id: i64) -> Result<()> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO export_cursors (user_id, last_song_action_id, updated_at)
         VALUES (?, ?, ?)
         ON CONFLICT(user_id)
         DO UPDATE SET last_song_action_id = excluded.last_song_action_id,
                       updated_at = excluded.updated_at",
    )
    .bind(user_id.get())
    .bind(last_action_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}
