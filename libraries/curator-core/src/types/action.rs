/// Action audit trail types
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the user did to a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Like,
    Dislike,
}

impl ActionKind {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(Self::Like),
            "dislike" => Some(Self::Dislike),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable, append-only audit record of one like/dislike invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    /// Monotonic id
    pub id: i64,
    /// Acting user
    pub user_id: UserId,
    /// External track id
    pub track_id: String,
    /// External track URI
    pub track_uri: Option<String>,
    /// Track title
    pub track_name: String,
    /// Artists joined with ", "
    pub artist_name: String,
    /// Album title
    pub album_name: Option<String>,
    /// Album art url
    pub album_art: Option<String>,
    /// Requested action
    pub action: ActionKind,
    /// Playlist the track was playing from
    pub source_playlist_id: Option<String>,
    /// Resolved name of the source playlist
    pub source_playlist_name: Option<String>,
    /// Whether the guard prevented playlist mutation
    pub guard_blocked: bool,
    /// Append time
    pub created_at: DateTime<Utc>,
}

/// Fields for appending an action record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewActionRecord {
    pub user_id: UserId,
    pub track_id: String,
    pub track_uri: Option<String>,
    pub track_name: String,
    pub artist_name: String,
    pub album_name: Option<String>,
    pub album_art: Option<String>,
    pub action: ActionKind,
    pub source_playlist_id: Option<String>,
    pub source_playlist_name: Option<String>,
    pub guard_blocked: bool,
}

/// Per-user action counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionStats {
    pub likes: u64,
    pub dislikes: u64,
}
