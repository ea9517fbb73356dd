use crate::error::Result;
use crate::{actions, export_cursors, playlist_refs, users};
use crate::playlist_refs::PlaylistTable;
use async_trait::async_trait;
use curator_core::{
    ActionRecord, ActionRepository, ActionStats, ApprovedPlaylistRepository,
    ExportCursorRepository, NewActionRecord, NewPlaylistRef, NewUser, PlaylistRef, StoreResult,
    TargetPlaylistRepository, User, UserId, UserRepository, UserUpdate,
};
use sqlx::SqlitePool;

/// `SQLite`-backed store implementing every repository trait
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect and bring the schema up to date
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = crate::create_pool(database_url).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool without running migrations
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UserRepository for Database {
    async fn get_user_by_spotify_id(&self, spotify_id: &str) -> StoreResult<Option<User>> {
        Ok(users::get_by_spotify_id(&self.pool, spotify_id).await?)
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(users::get_by_id(&self.pool, id).await?)
    }

    async fn get_all_users(&self) -> StoreResult<Vec<User>> {
        Ok(users::get_all(&self.pool).await?)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        Ok(users::create(&self.pool, &user).await?)
    }

    async fn update_user(&self, id: UserId, update: UserUpdate) -> StoreResult<User> {
        Ok(users::update(&self.pool, id, &update).await?)
    }
}

#[async_trait]
impl TargetPlaylistRepository for Database {
    async fn list_target_playlists(&self, user_id: UserId) -> StoreResult<Vec<PlaylistRef>> {
        Ok(playlist_refs::list(&self.pool, PlaylistTable::Target, user_id).await?)
    }

    async fn add_target_playlist(
        &self,
        user_id: UserId,
        playlist: NewPlaylistRef,
    ) -> StoreResult<PlaylistRef> {
        Ok(playlist_refs::add(&self.pool, PlaylistTable::Target, user_id, &playlist).await?)
    }

    async fn remove_target_playlist(&self, id: i64, user_id: UserId) -> StoreResult<()> {
        Ok(playlist_refs::remove(&self.pool, PlaylistTable::Target, id, user_id).await?)
    }
}

#[async_trait]
impl ApprovedPlaylistRepository for Database {
    async fn list_approved_playlists(&self, user_id: UserId) -> StoreResult<Vec<PlaylistRef>> {
        Ok(playlist_refs::list(&self.pool, PlaylistTable::Approved, user_id).await?)
    }

    async fn add_approved_playlist(
        &self,
        user_id: UserId,
        playlist: NewPlaylistRef,
    ) -> StoreResult<PlaylistRef> {
        Ok(playlist_refs::add(&self.pool, PlaylistTable::Approved, user_id, &playlist).await?)
    }

    async fn remove_approved_playlist(&self, id: i64, user_id: UserId) -> StoreResult<()> {
        Ok(playlist_refs::remove(&self.pool, PlaylistTable::Approved, id, user_id).await?)
    }
}

#[async_trait]
impl ActionRepository for Database {
    async fn append_action(&self, record: NewActionRecord) -> StoreResult<ActionRecord> {
        Ok(actions::append(&self.pool, &record).await?)
    }

    async fn list_recent_actions(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> StoreResult<Vec<ActionRecord>> {
        Ok(actions::list_recent(&self.pool, user_id, limit).await?)
    }

    async fn list_actions_since(
        &self,
        user_id: UserId,
        after_id: i64,
        limit: u32,
    ) -> StoreResult<Vec<ActionRecord>> {
        Ok(actions::list_since(&self.pool, user_id, after_id, limit).await?)
    }

    async fn action_stats(&self, user_id: UserId) -> StoreResult<ActionStats> {
        Ok(actions::stats(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl ExportCursorRepository for Database {
    async fn get_export_cursor(&self, user_id: UserId) -> StoreResult<i64> {
        Ok(export_cursors::get(&self.pool, user_id).await?)
    }

    async fn set_export_cursor(&self, user_id: UserId, last_action_id: i64) -> StoreResult<()> {
        Ok(export_cursors::set(&self.pool, user_id, last_action_id).await?)
    }
}
