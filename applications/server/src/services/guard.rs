/// Safeguard policy for playlist mutations
///
/// A user with no approved source playlists has the safeguard off. Once
/// any playlist is approved, like/dislike may only touch playlists when
/// playback comes from one of them.
use curator_core::{ApprovedPlaylistRepository, PlaylistRef, StoreResult, UserId};
use curator_spotify::PlaybackContext;
use serde::Serialize;
use std::sync::Arc;

pub const NOT_FROM_PLAYLIST: &str =
    "Safeguard enabled: not playing from an approved playlist. No playlist changes were made.";
pub const PLAYLIST_NOT_APPROVED: &str =
    "Safeguard enabled: current playlist is not approved. No playlist changes were made.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardDecision {
    pub enabled: bool,
    pub blocked: bool,
    pub message: Option<&'static str>,
    /// Playlist id taken from the playback context, if it is a playlist
    pub current_playlist_id: Option<String>,
}

/// Decide against an already loaded allow-list
pub fn evaluate(approved: &[PlaylistRef], context: Option<&PlaybackContext>) -> GuardDecision {
    let current_playlist_id = context.and_then(PlaybackContext::playlist_id).map(String::from);

    if approved.is_empty() {
        return GuardDecision {
            enabled: false,
            blocked: false,
            message: None,
            current_playlist_id,
        };
    }

    let message = match current_playlist_id.as_deref() {
        None => Some(NOT_FROM_PLAYLIST),
        Some(id) if !approved.iter().any(|p| p.playlist_id == id) => Some(PLAYLIST_NOT_APPROVED),
        Some(_) => None,
    };

    GuardDecision {
        enabled: true,
        blocked: message.is_some(),
        message,
        current_playlist_id,
    }
}

#[derive(Clone)]
pub struct GuardService {
    approved: Arc<dyn ApprovedPlaylistRepository>,
}

impl GuardService {
    pub fn new(approved: Arc<dyn ApprovedPlaylistRepository>) -> Self {
        Self { approved }
    }

    /// Load the user's allow-list and decide.
    ///
    /// A missing allow-list relation disables the safeguard; other storage
    /// failures propagate.
    pub async fn decide(
        &self,
        user_id: UserId,
        context: Option<&PlaybackContext>,
    ) -> StoreResult<GuardDecision> {
        let approved = match self.approved.list_approved_playlists(user_id).await {
            Ok(approved) => approved,
            Err(e) if e.is_relation_missing() => {
                tracing::warn!(
                    user_id = %user_id,
                    error = %e,
                    "Approved playlist table missing, treating safeguard as disabled"
                );
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(evaluate(&approved, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approved(ids: &[&str]) -> Vec<PlaylistRef> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| PlaylistRef {
                id: i as i64 + 1,
                user_id: UserId::new(1),
                playlist_id: (*id).to_string(),
                playlist_name: format!("Playlist {id}"),
            })
            .collect()
    }

    fn playlist(id: &str) -> PlaybackContext {
        PlaybackContext {
            kind: "playlist".to_string(),
            uri: format!("spotify:playlist:{id}"),
            name: None,
        }
    }

    #[test]
    fn test_empty_allow_list_never_blocks() {
        let collection = PlaybackContext {
            kind: "collection".to_string(),
            uri: "spotify:user:alice:collection".to_string(),
            name: None,
        };

        for context in [None, Some(playlist("P2")), Some(collection)] {
            let decision = evaluate(&[], context.as_ref());
            assert!(!decision.enabled);
            assert!(!decision.blocked);
            assert_eq!(decision.message, None);
        }
    }

    #[test]
    fn test_unapproved_playlist_blocked() {
        let decision = evaluate(&approved(&["P1"]), Some(&playlist("P2")));
        assert!(decision.enabled);
        assert!(decision.blocked);
        assert_eq!(decision.message, Some(PLAYLIST_NOT_APPROVED));
        assert_eq!(decision.current_playlist_id.as_deref(), Some("P2"));
    }

    #[test]
    fn test_approved_playlist_allowed() {
        let decision = evaluate(&approved(&["P9", "P1"]), Some(&playlist("P1")));
        assert!(decision.enabled);
        assert!(!decision.blocked);
        assert_eq!(decision.message, None);
    }

    #[test]
    fn test_non_playlist_context_blocked_when_enabled() {
        let album = PlaybackContext {
            kind: "album".to_string(),
            uri: "spotify:album:A1".to_string(),
            name: None,
        };

        let decision = evaluate(&approved(&["P1"]), Some(&album));
        assert!(decision.blocked);
        assert_eq!(decision.message, Some(NOT_FROM_PLAYLIST));
        assert_eq!(decision.current_playlist_id, None);

        let decision = evaluate(&approved(&["P1"]), None);
        assert!(decision.blocked);
    }
}
