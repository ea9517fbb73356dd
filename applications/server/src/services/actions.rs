/// Like and dislike workflows
///
/// Each action reads the current playback, consults the safeguard, applies
/// its playlist/library changes, skips, and appends one audit record.
/// Only the initial playback read and the final record write can fail the
/// action; every step in between is best-effort and reported back.
use crate::error::{Result, ServerError};
use crate::services::guard::{GuardDecision, GuardService};
use curator_core::{ActionKind, NewActionRecord, Repositories, UserId};
use curator_spotify::{PlaybackContext, RetryPolicy, SpotifyClient, TrackItem};
use serde::Serialize;

/// Maximum number of add errors echoed back to the client
const MAX_REPORTED_ERRORS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceContext {
    #[serde(rename = "type")]
    pub kind: String,
    pub uri: String,
}

impl From<&PlaybackContext> for SourceContext {
    fn from(context: &PlaybackContext) -> Self {
        Self {
            kind: context.kind.clone(),
            uri: context.uri.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeReport {
    pub success: bool,
    pub added_to_targets: usize,
    pub target_playlists_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_errors: Option<Vec<String>>,
    pub removed_from_source: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal_error: Option<String>,
    pub guard_enabled: bool,
    pub guard_blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard_message: Option<&'static str>,
    pub current_playlist_id: Option<String>,
    pub source_context: Option<SourceContext>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalTarget {
    Playlist,
    Library,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DislikeReport {
    pub success: bool,
    pub removed_from_source: bool,
    pub removal_target: Option<RemovalTarget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removal_error: Option<String>,
    pub guard_enabled: bool,
    pub guard_blocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard_message: Option<&'static str>,
    pub current_playlist_id: Option<String>,
    pub source_context: Option<SourceContext>,
}

/// Outcome of a best-effort removal
#[derive(Debug, Default)]
struct Removal {
    removed: bool,
    target: Option<RemovalTarget>,
    error: Option<String>,
}

#[derive(Clone)]
pub struct ActionService {
    spotify: SpotifyClient,
    repos: Repositories,
    guard: GuardService,
}

impl ActionService {
    pub fn new(spotify: SpotifyClient, repos: Repositories) -> Self {
        let guard = GuardService::new(repos.approved_playlists.clone());
        Self {
            spotify,
            repos,
            guard,
        }
    }

    /// Add the playing track to every target playlist, then take it out of
    /// the source playlist.
    pub async fn like(&self, user_id: UserId) -> Result<LikeReport> {
        let (track, context) = self.now_playing(user_id, "Failed to process like action").await?;
        let targets = self.repos.target_playlists.list_target_playlists(user_id).await?;
        let guard = self.guard.decide(user_id, context.as_ref()).await?;
        let source_context = context.as_ref().map(SourceContext::from);

        if guard.blocked {
            self.record_blocked(user_id, &track, ActionKind::Like, &guard).await?;
            return Ok(LikeReport {
                success: true,
                added_to_targets: 0,
                target_playlists_count: targets.len(),
                add_errors: None,
                removed_from_source: false,
                removal_error: None,
                guard_enabled: guard.enabled,
                guard_blocked: true,
                guard_message: guard.message,
                current_playlist_id: guard.current_playlist_id,
                source_context,
            });
        }

        let mut added_to_targets = 0;
        let mut add_errors = Vec::new();
        for target in &targets {
            match self
                .spotify
                .add_to_playlist(user_id, &target.playlist_id, &track.uri, RetryPolicy::PATIENT)
                .await
            {
                Ok(()) => added_to_targets += 1,
                Err(e) => {
                    tracing::warn!(user_id = %user_id, playlist_id = %target.playlist_id, error = %e, "Failed to add track to target playlist");
                    add_errors.push(e.to_string());
                }
            }
        }

        let removal = match context.as_ref().and_then(PlaybackContext::playlist_id) {
            Some(playlist_id) => self.remove_from_playlist(user_id, playlist_id, &track).await,
            None => Removal::default(),
        };

        self.skip(user_id).await;
        self.record(user_id, &track, ActionKind::Like, context.as_ref())
            .await?;

        Ok(LikeReport {
            success: true,
            added_to_targets,
            target_playlists_count: targets.len(),
            add_errors: (!add_errors.is_empty()).then(|| {
                add_errors.truncate(MAX_REPORTED_ERRORS);
                add_errors
            }),
            removed_from_source: removal.removed,
            removal_error: removal.error,
            guard_enabled: guard.enabled,
            guard_blocked: false,
            guard_message: None,
            current_playlist_id: guard.current_playlist_id,
            source_context,
        })
    }

    /// Take the playing track out of wherever it is playing from: the
    /// playlist, or the saved-tracks library.
    pub async fn dislike(&self, user_id: UserId) -> Result<DislikeReport> {
        let (track, context) = self
            .now_playing(user_id, "Failed to process dislike action")
            .await?;
        let guard = self.guard.decide(user_id, context.as_ref()).await?;
        let source_context = context.as_ref().map(SourceContext::from);

        if guard.blocked {
            self.record_blocked(user_id, &track, ActionKind::Dislike, &guard)
                .await?;
            return Ok(DislikeReport {
                success: true,
                removed_from_source: false,
                removal_target: None,
                removal_error: None,
                guard_enabled: guard.enabled,
                guard_blocked: true,
                guard_message: guard.message,
                current_playlist_id: guard.current_playlist_id,
                source_context,
            });
        }

        let removal = match context.as_ref() {
            Some(ctx) if ctx.is_playlist() => match ctx.playlist_id() {
                Some(playlist_id) => self.remove_from_playlist(user_id, playlist_id, &track).await,
                None => Removal::default(),
            },
            Some(ctx) if ctx.is_collection() => match track.id.as_deref() {
                Some(track_id) => self.remove_from_library(user_id, track_id).await,
                None => Removal::default(),
            },
            _ => Removal::default(),
        };

        self.skip(user_id).await;
        self.record(user_id, &track, ActionKind::Dislike, context.as_ref())
            .await?;

        Ok(DislikeReport {
            success: true,
            removed_from_source: removal.removed,
            removal_target: removal.target,
            removal_error: removal.error,
            guard_enabled: guard.enabled,
            guard_blocked: false,
            guard_message: None,
            current_playlist_id: guard.current_playlist_id,
            source_context,
        })
    }

    async fn now_playing(
        &self,
        user_id: UserId,
        context: &'static str,
    ) -> Result<(TrackItem, Option<PlaybackContext>)> {
        let state = self
            .spotify
            .current_track(user_id, RetryPolicy::PATIENT)
            .await
            .map_err(ServerError::upstream(context))?
            .ok_or(ServerError::NothingPlaying)?;

        let track = state.item.ok_or(ServerError::NothingPlaying)?;
        Ok((track, state.context))
    }

    async fn remove_from_playlist(
        &self,
        user_id: UserId,
        playlist_id: &str,
        track: &TrackItem,
    ) -> Removal {
        match self
            .spotify
            .remove_from_playlist(user_id, playlist_id, &track.uri, RetryPolicy::PATIENT)
            .await
        {
            Ok(()) => Removal {
                removed: true,
                target: Some(RemovalTarget::Playlist),
                error: None,
            },
            Err(e) => {
                tracing::warn!(user_id = %user_id, playlist_id = %playlist_id, error = %e, "Failed to remove track from source playlist");
                Removal {
                    error: Some(e.to_string()),
                    ..Removal::default()
                }
            }
        }
    }

    async fn remove_from_library(&self, user_id: UserId, track_id: &str) -> Removal {
        match self
            .spotify
            .remove_from_library(user_id, track_id, RetryPolicy::PATIENT)
            .await
        {
            Ok(()) => Removal {
                removed: true,
                target: Some(RemovalTarget::Library),
                error: None,
            },
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Failed to remove track from library");
                Removal {
                    error: Some(e.to_string()),
                    ..Removal::default()
                }
            }
        }
    }

    /// Skip is never gated and never fails the action
    async fn skip(&self, user_id: UserId) {
        if let Err(e) = self.spotify.next(user_id, RetryPolicy::PATIENT).await {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to skip track");
        }
    }

    async fn source_playlist_name(
        &self,
        user_id: UserId,
        context: Option<&PlaybackContext>,
    ) -> Option<String> {
        let playlist_id = context.and_then(PlaybackContext::playlist_id)?;
        match self.spotify.playlist_name(user_id, playlist_id).await {
            Ok(name) => name,
            Err(e) => {
                tracing::debug!(user_id = %user_id, playlist_id = %playlist_id, error = %e, "Playlist name unavailable");
                None
            }
        }
    }

    async fn record(
        &self,
        user_id: UserId,
        track: &TrackItem,
        action: ActionKind,
        context: Option<&PlaybackContext>,
    ) -> Result<()> {
        let source_playlist_name = self.source_playlist_name(user_id, context).await;
        let source_playlist_id = context.and_then(PlaybackContext::uri_tail).map(String::from);

        self.append(
            track_record(user_id, track, action, false),
            source_playlist_id,
            source_playlist_name,
        )
        .await
    }

    async fn record_blocked(
        &self,
        user_id: UserId,
        track: &TrackItem,
        action: ActionKind,
        guard: &GuardDecision,
    ) -> Result<()> {
        tracing::info!(user_id = %user_id, action = %action, "Safeguard blocked playlist changes");
        self.skip(user_id).await;
        self.append(
            track_record(user_id, track, action, true),
            guard.current_playlist_id.clone(),
            None,
        )
        .await
    }

    async fn append(
        &self,
        mut record: NewActionRecord,
        source_playlist_id: Option<String>,
        source_playlist_name: Option<String>,
    ) -> Result<()> {
        record.source_playlist_id = source_playlist_id;
        record.source_playlist_name = source_playlist_name;
        let stored = self.repos.actions.append_action(record).await?;
        tracing::info!(
            user_id = %stored.user_id,
            action_id = stored.id,
            action = %stored.action,
            guard_blocked = stored.guard_blocked,
            "Recorded action"
        );
        Ok(())
    }
}

fn track_record(
    user_id: UserId,
    track: &TrackItem,
    action: ActionKind,
    guard_blocked: bool,
) -> NewActionRecord {
    NewActionRecord {
        user_id,
        // Local files carry no id; fall back to the URI
        track_id: track.id.clone().unwrap_or_else(|| track.uri.clone()),
        track_uri: Some(track.uri.clone()),
        track_name: track.name.clone(),
        artist_name: track.artist_names(),
        album_name: track.album.as_ref().map(|a| a.name.clone()),
        album_art: track.album_art().map(String::from),
        action,
        source_playlist_id: None,
        source_playlist_name: None,
        guard_blocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_spotify::types::{AlbumRef, ArtistRef, Image};

    #[test]
    fn test_track_record_fields() {
        let track = TrackItem {
            id: None,
            uri: "spotify:local:abc".to_string(),
            name: "Demo".to_string(),
            artists: vec![
                ArtistRef {
                    name: "A".to_string(),
                },
                ArtistRef {
                    name: "B".to_string(),
                },
            ],
            album: Some(AlbumRef {
                name: "Album".to_string(),
                images: vec![Image {
                    url: "https://img/1".to_string(),
                }],
            }),
            duration_ms: 0,
        };

        let record = track_record(UserId::new(3), &track, ActionKind::Dislike, true);
        assert_eq!(record.track_id, "spotify:local:abc");
        assert_eq!(record.artist_name, "A, B");
        assert_eq!(record.album_name.as_deref(), Some("Album"));
        assert_eq!(record.album_art.as_deref(), Some("https://img/1"));
        assert!(record.guard_blocked);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = DislikeReport {
            success: true,
            removed_from_source: true,
            removal_target: Some(RemovalTarget::Library),
            removal_error: None,
            guard_enabled: false,
            guard_blocked: false,
            guard_message: None,
            current_playlist_id: None,
            source_context: Some(SourceContext {
                kind: "collection".to_string(),
                uri: "spotify:user:alice:collection".to_string(),
            }),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["removalTarget"], "library");
        assert_eq!(json["sourceContext"]["type"], "collection");
        assert!(json["currentPlaylistId"].is_null());
        assert!(json.get("removalError").is_none());
    }
}
