//! User and credential queries

use crate::error::{Result, StorageError};
use chrono::{DateTime, Utc};
use curator_core::types::{NewUser, User, UserId, UserUpdate};
use sqlx::SqlitePool;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    spotify_id: String,
    display_name: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    token_expiry: Option<i64>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            spotify_id: row.spotify_id,
            display_name: row.display_name,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            token_expiry: row
                .token_expiry
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0)),
        }
    }
}

const SELECT_USER: &str = "SELECT id, spotify_id, display_name, access_token, refresh_token, token_expiry
     FROM users";

/// Get a user by external account id
pub async fn get_by_spotify_id(pool: &SqlitePool, spotify_id: &str) -> Result<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE spotify_id = ?"))
        .bind(spotify_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(User::from))
}

/// Get a user by internal id
pub async fn get_by_id(pool: &SqlitePool, id: UserId) -> Result<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = ?"))
        .bind(id.get())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(User::from))
}

/// Get all users
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<User>> {
    let rows = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} ORDER BY id"))
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(User::from).collect())
}

/// Create a user
pub async fn create(pool: &SqlitePool, user: &NewUser) -> Result<User> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (spotify_id, display_name, access_token, refresh_token, token_expiry)
         VALUES (?, ?, ?, ?, ?)
         RETURNING id, spotify_id, display_name, access_token, refresh_token, token_expiry",
    )
    .bind(&user.spotify_id)
    .bind(&user.display_name)
    .bind(&user.access_token)
    .bind(&user.refresh_token)
    .bind(user.token_expiry.map(|t| t.timestamp()))
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Apply a partial update
///
/// Columns whose update field is `None` keep their stored value, so a
/// refresh response without a new refresh token never clears the old one.
pub async fn update(pool: &SqlitePool, id: UserId, update: &UserUpdate) -> Result<User> {
    let row = sqlx::query_as::<_, UserRow>(
        "UPDATE users SET
            display_name = COALESCE(?, display_name),
            access_token = COALESCE(?, access_token),
            refresh_token = COALESCE(?, refresh_token),
            token_expiry = COALESCE(?, token_expiry)
         WHERE id = ?
         RETURNING id, spotify_id, display_name, access_token, refresh_token, token_expiry",
    )
    .bind(&update.display_name)
    .bind(&update.access_token)
    .bind(&update.refresh_token)
    .bind(update.token_expiry.map(|t| t.timestamp()))
    .bind(id.get())
    .fetch_optional(pool)
    .await?;

    row.map(User::from)
        .ok_or_else(|| StorageError::not_found("user", id.to_string()))
}
