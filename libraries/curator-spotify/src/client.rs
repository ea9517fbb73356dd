//! Typed wrappers for the Web API endpoints the curator uses.

use crate::cache::CatalogCache;
use crate::error::Result;
use crate::fetcher::{ApiRequest, Fetcher, RetryPolicy};
use crate::oauth::OAuthClient;
use crate::token::TokenManager;
use crate::types::{Page, PlaybackState, PlaylistName, PlaylistSummary, SpotifyConfig};
use curator_core::{UserId, UserRepository};
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::form_urlencoded;

/// Spotify Web API client shared by all requests.
///
/// Cheap to clone; clones share the HTTP connection pool and the catalog
/// caches.
///
/// # Example
///
/// ```ignore
/// use curator_spotify::{CatalogCache, RetryPolicy, SpotifyClient, SpotifyConfig};
///
/// let config = SpotifyConfig::new(Some(id), Some(secret), redirect_uri);
/// let client = SpotifyClient::new(config, users, CatalogCache::default())?;
///
/// if let Some(state) = client.current_track(user_id, RetryPolicy::FAST).await? {
///     println!("Playing: {:?}", state.item.map(|t| t.name));
/// }
/// ```
#[derive(Clone)]
pub struct SpotifyClient {
    fetcher: Fetcher,
    oauth: OAuthClient,
    cache: CatalogCache,
}

impl SpotifyClient {
    /// Create a client backed by `users` for credential storage.
    pub fn new(
        config: SpotifyConfig,
        users: Arc<dyn UserRepository>,
        cache: CatalogCache,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Curator/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        let config = Arc::new(config);
        let oauth = OAuthClient::new(http.clone(), Arc::clone(&config));
        let tokens = TokenManager::new(users, oauth.clone());
        let fetcher = Fetcher::new(http, config, tokens);

        Ok(Self {
            fetcher,
            oauth,
            cache,
        })
    }

    pub fn oauth(&self) -> &OAuthClient {
        &self.oauth
    }

    pub fn tokens(&self) -> &TokenManager {
        self.fetcher.tokens()
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    // ---- Playback state ----

    /// `GET /me/player`
    pub async fn player_state(
        &self,
        user_id: UserId,
        policy: RetryPolicy,
    ) -> Result<Option<PlaybackState>> {
        self.fetcher
            .call_as(user_id, &ApiRequest::get("/me/player"), policy)
            .await
    }

    /// `GET /me/player/currently-playing`
    pub async fn currently_playing(
        &self,
        user_id: UserId,
        policy: RetryPolicy,
    ) -> Result<Option<PlaybackState>> {
        self.fetcher
            .call_as(
                user_id,
                &ApiRequest::get("/me/player/currently-playing"),
                policy,
            )
            .await
    }

    /// Playback state with an active item.
    ///
    /// Prefers `/me/player`, which carries richer context on some devices,
    /// and falls back to `/me/player/currently-playing` when it has no item.
    pub async fn current_track(
        &self,
        user_id: UserId,
        policy: RetryPolicy,
    ) -> Result<Option<PlaybackState>> {
        let state = self.player_state(user_id, policy).await?;
        if state.as_ref().is_some_and(|s| s.item.is_some()) {
            return Ok(state);
        }

        let state = self.currently_playing(user_id, policy).await?;
        Ok(state.filter(|s| s.item.is_some()))
    }

    // ---- Player control ----

    pub async fn next(&self, user_id: UserId, policy: RetryPolicy) -> Result<()> {
        self.send(user_id, ApiRequest::post("/me/player/next"), policy)
            .await
    }

    pub async fn previous(&self, user_id: UserId, policy: RetryPolicy) -> Result<()> {
        self.send(user_id, ApiRequest::post("/me/player/previous"), policy)
            .await
    }

    pub async fn play(&self, user_id: UserId, policy: RetryPolicy) -> Result<()> {
        self.send(user_id, ApiRequest::put("/me/player/play"), policy)
            .await
    }

    pub async fn pause(&self, user_id: UserId, policy: RetryPolicy) -> Result<()> {
        self.send(user_id, ApiRequest::put("/me/player/pause"), policy)
            .await
    }

    pub async fn set_shuffle(&self, user_id: UserId, state: bool, policy: RetryPolicy) -> Result<()> {
        let path = format!("/me/player/shuffle?state={state}");
        self.send(user_id, ApiRequest::put(path), policy).await
    }

    pub async fn seek(&self, user_id: UserId, position_ms: u64, policy: RetryPolicy) -> Result<()> {
        let path = format!("/me/player/seek?position_ms={position_ms}");
        self.send(user_id, ApiRequest::put(path), policy).await
    }

    // ---- Library and playlist mutation ----

    /// Append a track (by URI) to a playlist.
    pub async fn add_to_playlist(
        &self,
        user_id: UserId,
        playlist_id: &str,
        track_uri: &str,
        policy: RetryPolicy,
    ) -> Result<()> {
        let request = ApiRequest::post(format!("/playlists/{playlist_id}/tracks"))
            .json(json!({ "uris": [track_uri] }));
        self.send(user_id, request, policy).await
    }

    /// Remove every occurrence of a track (by URI) from a playlist.
    pub async fn remove_from_playlist(
        &self,
        user_id: UserId,
        playlist_id: &str,
        track_uri: &str,
        policy: RetryPolicy,
    ) -> Result<()> {
        let request = ApiRequest::delete(format!("/playlists/{playlist_id}/tracks"))
            .json(json!({ "tracks": [{ "uri": track_uri }] }));
        self.send(user_id, request, policy).await
    }

    /// Remove a track (by id) from the saved-tracks library.
    pub async fn remove_from_library(
        &self,
        user_id: UserId,
        track_id: &str,
        policy: RetryPolicy,
    ) -> Result<()> {
        let query: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("ids", track_id)
            .finish();
        self.send(user_id, ApiRequest::delete(format!("/me/tracks?{query}")), policy)
            .await
    }

    // ---- Cached catalog reads ----

    /// The user's playlists (first page of 50), cached per user.
    pub async fn playlists(&self, user_id: UserId) -> Result<Vec<PlaylistSummary>> {
        let fetcher = self.fetcher.clone();
        self.cache
            .playlists
            .get_or_fetch(user_id, self.cache.ttls.playlists, move || async move {
                let page: Option<Page<PlaylistSummary>> = fetcher
                    .call_as(
                        user_id,
                        &ApiRequest::get("/me/playlists?limit=50"),
                        RetryPolicy::FAST,
                    )
                    .await?;
                Ok(page.map(|p| p.items).unwrap_or_default())
            })
            .await
    }

    /// A playlist's display name, cached per user and playlist.
    pub async fn playlist_name(&self, user_id: UserId, playlist_id: &str) -> Result<Option<String>> {
        let fetcher = self.fetcher.clone();
        let path = format!("/playlists/{playlist_id}?fields=name");
        self.cache
            .playlist_names
            .get_or_fetch(
                (user_id, playlist_id.to_string()),
                self.cache.ttls.playlist_name,
                move || async move {
                    let playlist: Option<PlaylistName> = fetcher
                        .call_as(user_id, &ApiRequest::get(path), RetryPolicy::FAST)
                        .await?;
                    Ok(playlist.and_then(|p| p.name))
                },
            )
            .await
    }

    async fn send(&self, user_id: UserId, request: ApiRequest, policy: RetryPolicy) -> Result<()> {
        self.fetcher.call(user_id, &request, policy).await?;
        Ok(())
    }
}
