//! Repository traits forming the storage boundary
//!
//! Each persisted concern gets its own trait so services only depend on what
//! they touch. A single backend usually implements all of them; use
//! [`Repositories::from_store`] to fan one backend out into trait objects.

use crate::error::StoreResult;
use crate::types::{
    ActionRecord, ActionStats, NewActionRecord, NewPlaylistRef, NewUser, PlaylistRef, User,
    UserId, UserUpdate,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Users and their external credentials
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user by external account id
    async fn get_user_by_spotify_id(&self, spotify_id: &str) -> StoreResult<Option<User>>;

    /// Look up a user by internal id
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// All users, ordered by id
    async fn get_all_users(&self) -> StoreResult<Vec<User>>;

    /// Create a user
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Apply a partial update, returning the stored row
    async fn update_user(&self, id: UserId, update: UserUpdate) -> StoreResult<User>;
}

/// Playlists that receive liked tracks
#[async_trait]
pub trait TargetPlaylistRepository: Send + Sync {
    async fn list_target_playlists(&self, user_id: UserId) -> StoreResult<Vec<PlaylistRef>>;

    async fn add_target_playlist(
        &self,
        user_id: UserId,
        playlist: NewPlaylistRef,
    ) -> StoreResult<PlaylistRef>;

    /// Remove by row id; rows owned by other users are left alone
    async fn remove_target_playlist(&self, id: i64, user_id: UserId) -> StoreResult<()>;
}

/// Guard allow-list of source playlists
///
/// Implementations must report an unprovisioned relation as
/// [`StoreError::RelationMissing`](crate::StoreError::RelationMissing).
#[async_trait]
pub trait ApprovedPlaylistRepository: Send + Sync {
    async fn list_approved_playlists(&self, user_id: UserId) -> StoreResult<Vec<PlaylistRef>>;

    async fn add_approved_playlist(
        &self,
        user_id: UserId,
        playlist: NewPlaylistRef,
    ) -> StoreResult<PlaylistRef>;

    /// Remove by row id; rows owned by other users are left alone
    async fn remove_approved_playlist(&self, id: i64, user_id: UserId) -> StoreResult<()>;
}

/// Append-only action audit trail
#[async_trait]
pub trait ActionRepository: Send + Sync {
    /// Append one record; the assigned id is strictly greater than any before it
    async fn append_action(&self, record: NewActionRecord) -> StoreResult<ActionRecord>;

    /// Most recent records first
    async fn list_recent_actions(&self, user_id: UserId, limit: u32)
        -> StoreResult<Vec<ActionRecord>>;

    /// Records with `id > after_id`, ascending by id
    async fn list_actions_since(
        &self,
        user_id: UserId,
        after_id: i64,
        limit: u32,
    ) -> StoreResult<Vec<ActionRecord>>;

    /// Counts grouped by action kind
    async fn action_stats(&self, user_id: UserId) -> StoreResult<ActionStats>;
}

/// Export progress per user
#[async_trait]
pub trait ExportCursorRepository: Send + Sync {
    /// Last exported action id, 0 when nothing was exported yet
    async fn get_export_cursor(&self, user_id: UserId) -> StoreResult<i64>;

    async fn set_export_cursor(&self, user_id: UserId, last_action_id: i64) -> StoreResult<()>;
}

/// All repositories as shareable trait objects
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub target_playlists: Arc<dyn TargetPlaylistRepository>,
    pub approved_playlists: Arc<dyn ApprovedPlaylistRepository>,
    pub actions: Arc<dyn ActionRepository>,
    pub export_cursors: Arc<dyn ExportCursorRepository>,
}

impl Repositories {
    /// Fan a single backend out into one trait object per concern.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + TargetPlaylistRepository
            + ApprovedPlaylistRepository
            + ActionRepository
            + ExportCursorRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            target_playlists: store.clone(),
            approved_playlists: store.clone(),
            actions: store.clone(),
            export_cursors: store,
        }
    }
}
