/// Playlist references configured by a user
use crate::types::UserId;
use serde::{Deserialize, Serialize};

/// A playlist the user registered with Curator.
///
/// Used for both target playlists (receive liked tracks) and approved
/// source playlists (the guard allow-list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistRef {
    /// Row id
    pub id: i64,
    /// Owner
    pub user_id: UserId,
    /// External playlist id
    pub playlist_id: String,
    /// Display name captured when the playlist was registered
    pub playlist_name: String,
}

/// Input for registering a playlist
///
/// Missing fields deserialize as empty so [`validate`](Self::validate)
/// can report them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewPlaylistRef {
    /// External playlist id
    pub playlist_id: String,
    /// Display name
    pub playlist_name: String,
}

impl NewPlaylistRef {
    /// Check the input, reporting the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if self.playlist_id.trim().is_empty() {
            return Err("playlistId is required".to_string());
        }
        if self.playlist_name.trim().is_empty() {
            return Err("playlistName is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_reports_first_violation() {
        let input = NewPlaylistRef {
            playlist_id: String::new(),
            playlist_name: String::new(),
        };
        assert_eq!(input.validate().unwrap_err(), "playlistId is required");

        let input = NewPlaylistRef {
            playlist_id: "P1".to_string(),
            playlist_name: "  ".to_string(),
        };
        assert_eq!(input.validate().unwrap_err(), "playlistName is required");

        let input = NewPlaylistRef {
            playlist_id: "P1".to_string(),
            playlist_name: "Keepers".to_string(),
        };
        assert!(input.validate().is_ok());
    }
}
