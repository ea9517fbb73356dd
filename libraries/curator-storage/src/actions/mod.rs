//! Append-only action audit trail

use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use curator_core::types::{ActionKind, ActionRecord, ActionStats, NewActionRecord, UserId};
use sqlx::SqlitePool;

#[derive(sqlx::FromRow)]
struct ActionRow {
    id: i64,
    user_id: i64,
    track_id: String,
    track_uri: Option<String>,
    track_name: String,
    artist_name: String,
    album_name: Option<String>,
    album_art: Option<String>,
    action: String,
    source_playlist_id: Option<String>,
    source_playlist_name: Option<String>,
    guard_blocked: bool,
    created_at: i64,
}

impl TryFrom<ActionRow> for ActionRecord {
    type Error = StorageError;

    fn try_from(row: ActionRow) -> Result<Self> {
        let action = ActionKind::parse(&row.action).ok_or_else(|| {
            StorageError::SerializationError(format!(
                "unknown action '{}' on song_actions row {}",
                row.action, row.id
            ))
        })?;
        let created_at = DateTime::<Utc>::from_timestamp(row.created_at, 0).ok_or_else(|| {
            StorageError::SerializationError(format!("invalid created_at on row {}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            user_id: UserId::new(row.user_id),
            track_id: row.track_id,
            track_uri: row.track_uri,
            track_name: row.track_name,
            artist_name: row.artist_name,
            album_name: row.album_name,
            album_art: row.album_art,
            action,
            source_playlist_id: row.source_playlist_id,
            source_playlist_name: row.source_playlist_name,
            guard_blocked: row.guard_blocked,
            created_at,
        })
    }
}

const ACTION_COLUMNS: &str = "id, user_id, track_id, track_uri, track_name, artist_name, album_name,
     album_art, action, source_playlist_id, source_playlist_name, guard_blocked, created_at";

fn into_records(rows: Vec<ActionRow>) -> Result<Vec<ActionRecord>> {
    rows.into_iter().map(ActionRecord::try_from).collect()
}

/// Append one record
pub async fn append(pool: &SqlitePool, record: &NewActionRecord) -> Result<ActionRecord> {
    let now = Utc::now().timestamp();

    let row = sqlx::query_as::<_, ActionRow>(&format!(
        "INSERT INTO song_actions (user_id, track_id, track_uri, track_name, artist_name,
            album_name, album_art, action, source_playlist_id, source_playlist_name,
            guard_blocked, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         RETURNING {ACTION_COLUMNS}"
    ))
    .bind(record.user_id.get())
    .bind(&record.track_id)
    .bind(&record.track_uri)
    .bind(&record.track_name)
    .bind(&record.artist_name)
    .bind(&record.album_name)
    .bind(&record.album_art)
    .bind(record.action.as_str())
    .bind(&record.source_playlist_id)
    .bind(&record.source_playlist_name)
    .bind(record.guard_blocked)
    .bind(now)
    .fetch_one(pool)
    .await?;

    row.try_into()
}

/// Most recent records first
pub async fn list_recent(pool: &SqlitePool, user_id: UserId, limit: u32) -> Result<Vec<ActionRecord>> {
    let rows = sqlx::query_as::<_, ActionRow>(&format!(
        "SELECT {ACTION_COLUMNS} FROM song_actions
         WHERE user_id = ? ORDER BY id DESC LIMIT ?"
    ))
    .bind(user_id.get())
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    into_records(rows)
}

/// Records after a cursor, ascending by id for stable cursoring
pub async fn list_since(
    pool: &SqlitePool,
    user_id: UserId,
    after_id: i64,
    limit: u32,
) -> Result<Vec<ActionRecord>> {
    let rows = sqlx::query_as::<_, ActionRow>(&format!(
        "SELECT {ACTION_COLUMNS} FROM song_actions
         WHERE user_id = ? AND id > ? ORDER BY id ASC LIMIT ?"
    ))
    .bind(user_id.get())
    .bind(after_id)
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    into_records(rows)
}

/// Like/dislike counts for a user
pub async fn stats(pool: &SqlitePool, user_id: UserId) -> Result<ActionStats> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT action, COUNT(*) FROM song_actions WHERE user_id = ? GROUP BY action",
    )
    .bind(user_id.get())
    .fetch_all(pool)
    .await?;

    let mut stats = ActionStats::default();
    for (action, count) in rows {
        match ActionKind::parse(&action) {
            Some(ActionKind::Like) => stats.likes = count as u64,
            Some(ActionKind::Dislike) => stats.dislikes = count as u64,
            None => tracing::warn!(action = %action, "Ignoring unknown action kind in stats"),
        }
    }

    Ok(stats)
}
