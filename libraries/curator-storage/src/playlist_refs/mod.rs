//! Target and approved-source playlist queries
//!
//! Both relations share one shape, so they share one set of queries keyed
//! by [`PlaylistTable`].

use crate::error::Result;
use curator_core::types::{NewPlaylistRef, PlaylistRef, UserId};
use sqlx::SqlitePool;

/// Which playlist relation to query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistTable {
    /// Playlists that receive liked tracks
    Target,
    /// Guard allow-list
    Approved,
}

impl PlaylistTable {
    fn name(self) -> &'static str {
        match self {
            Self::Target => "target_playlists",
            Self::Approved => "approved_source_playlists",
        }
    }
}

#[derive(sqlx::FromRow)]
struct PlaylistRefRow {
    id: i64,
    user_id: i64,
    playlist_id: String,
    playlist_name: String,
}

impl From<PlaylistRefRow> for PlaylistRef {
    fn from(row: PlaylistRefRow) -> Self {
        Self {
            id: row.id,
            user_id: UserId::new(row.user_id),
            playlist_id: row.playlist_id,
            playlist_name: row.playlist_name,
        }
    }
}

/// List a user's playlists in insertion order
pub async fn list(pool: &SqlitePool, table: PlaylistTable, user_id: UserId) -> Result<Vec<PlaylistRef>> {
    let sql = format!(
        "SELECT id, user_id, playlist_id, playlist_name FROM {} WHERE user_id = ? ORDER BY id",
        table.name()
    );

    let rows = sqlx::query_as::<_, PlaylistRefRow>(&sql)
        .bind(user_id.get())
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(PlaylistRef::from).collect())
}

/// Register a playlist for a user
pub async fn add(
    pool: &SqlitePool,
    table: PlaylistTable,
    user_id: UserId,
    playlist: &NewPlaylistRef,
) -> Result<PlaylistRef> {
    let sql = format!(
        "INSERT INTO {} (user_id, playlist_id, playlist_name) VALUES (?, ?, ?)
         RETURNING id, user_id, playlist_id, playlist_name",
        table.name()
    );

    let row = sqlx::query_as::<_, PlaylistRefRow>(&sql)
        .bind(user_id.get())
        .bind(&playlist.playlist_id)
        .bind(&playlist.playlist_name)
        .fetch_one(pool)
        .await?;

    Ok(row.into())
}

/// Remove a playlist row owned by `user_id`
pub async fn remove(pool: &SqlitePool, table: PlaylistTable, id: i64, user_id: UserId) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE id = ? AND user_id = ?", table.name());

    sqlx::query(&sql)
        .bind(id)
        .bind(user_id.get())
        .execute(pool)
        .await?;

    Ok(())
}
