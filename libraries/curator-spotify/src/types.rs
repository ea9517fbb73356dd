//! Types mirroring the Spotify Web API payloads this crate consumes.

use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";

/// Connection settings for the Spotify Web API and accounts service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyConfig {
    /// OAuth client id
    pub client_id: Option<String>,
    /// OAuth client secret
    pub client_secret: Option<String>,
    /// Redirect URI registered for the authorization code flow
    pub redirect_uri: String,
    /// Base URL for Web API calls (no trailing slash)
    pub api_base_url: String,
    /// Base URL for the accounts service (no trailing slash)
    pub accounts_base_url: String,
}

impl SpotifyConfig {
    /// Create a config pointing at the public Spotify endpoints.
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri: redirect_uri.into(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            accounts_base_url: DEFAULT_ACCOUNTS_BASE_URL.to_string(),
        }
    }

    /// Override both base URLs (used against mock servers).
    #[must_use]
    pub fn with_base_urls(mut self, api_base_url: &str, accounts_base_url: &str) -> Self {
        self.api_base_url = api_base_url.trim_end_matches('/').to_string();
        self.accounts_base_url = accounts_base_url.trim_end_matches('/').to_string();
        self
    }

    /// Client id and secret, if both are configured.
    pub fn client_credentials(&self) -> Option<(&str, &str)> {
        match (self.client_id.as_deref(), self.client_secret.as_deref()) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => Some((id, secret)),
            _ => None,
        }
    }

    pub(crate) fn token_url(&self) -> String {
        format!("{}/api/token", self.accounts_base_url)
    }

    pub(crate) fn authorize_url(&self) -> String {
        format!("{}/authorize", self.accounts_base_url)
    }
}

/// Token endpoint response for both code and refresh grants.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime of the access token in seconds
    pub expires_in: i64,
    /// Only present when the accounts service reissues one
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Subset of the `/me` profile.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// The playing item.
///
/// `id` is absent for local files; `uri` is always present. The two are
/// distinct on the wire: playlist mutation takes URIs, library removal
/// takes ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackItem {
    #[serde(default)]
    pub id: Option<String>,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl TrackItem {
    /// Artist names joined with ", "
    pub fn artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// First album image, if any
    pub fn album_art(&self) -> Option<&str> {
        self.album
            .as_ref()
            .and_then(|album| album.images.first())
            .map(|image| image.url.as_str())
    }
}

/// Where playback originates: a playlist, the library collection, an album...
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackContext {
    #[serde(rename = "type")]
    pub kind: String,
    pub uri: String,
    /// Resolved playlist name, attached by us, never sent by the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl PlaybackContext {
    /// Whether the context is (or its URI names) a playlist
    pub fn is_playlist(&self) -> bool {
        self.kind == "playlist" || self.uri.contains("playlist")
    }

    /// Whether the context is the user's saved-tracks library
    pub fn is_collection(&self) -> bool {
        self.kind == "collection" || self.uri.contains(":collection")
    }

    /// Last `:`-separated segment of the URI
    pub fn uri_tail(&self) -> Option<&str> {
        self.uri.rsplit(':').next().filter(|tail| !tail.is_empty())
    }

    /// Playlist id, only when the context is a playlist
    pub fn playlist_id(&self) -> Option<&str> {
        if self.is_playlist() {
            self.uri_tail()
        } else {
            None
        }
    }
}

/// Current playback, as returned by `/me/player` and
/// `/me/player/currently-playing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub item: Option<TrackItem>,
    #[serde(default)]
    pub progress_ms: Option<u64>,
    #[serde(default)]
    pub context: Option<PlaybackContext>,
    #[serde(default)]
    pub shuffle_state: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackCount {
    pub total: u64,
}

/// One entry of `/me/playlists`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub tracks: Option<TrackCount>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlaylistName {
    #[serde(default)]
    pub name: Option<String>,
}
