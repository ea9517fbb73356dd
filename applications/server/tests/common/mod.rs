//! Common test utilities and fixtures
#![allow(dead_code)]

use axum::Router;
use chrono::{Duration, Utc};
use curator_core::{NewPlaylistRef, NewUser, Repositories, User, UserId};
use curator_server::{api, config::ServerConfig, state::AppState};
use curator_spotify::{CatalogCache, SpotifyClient};
use curator_storage::Database;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::MockServer;

/// A server wired to a real SQLite file and a mocked Spotify
pub struct TestApp {
    pub db: Arc<Database>,
    pub repos: Repositories,
    pub state: AppState,
    pub config: ServerConfig,
    pub spotify: MockServer,
    pub user: User,
    pub dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let spotify = MockServer::start().await;

        let mut config = ServerConfig::default();
        config.storage.database_url = format!("sqlite://{}", dir.path().join("test.db").display());
        config.auth.session_secret = "test-session-secret".to_string();
        config.server.web_dir = dir.path().join("web");
        config.spotify.client_id = Some("client".to_string());
        config.spotify.client_secret = Some("secret".to_string());
        config.spotify.api_base_url = spotify.uri();
        config.spotify.accounts_base_url = spotify.uri();
        config.exporter.dir = dir.path().join("exports");

        let db = Arc::new(
            Database::new(&config.storage.database_url)
                .await
                .expect("Failed to create database"),
        );
        let repos = Repositories::from_store(db.clone());

        let user = repos
            .users
            .create_user(NewUser {
                spotify_id: "alice".to_string(),
                display_name: Some("Alice".to_string()),
                access_token: Some("access-1".to_string()),
                refresh_token: Some("refresh-1".to_string()),
                token_expiry: Some(Utc::now() + Duration::hours(1)),
            })
            .await
            .expect("Failed to create test user");

        let client = SpotifyClient::new(
            config.spotify.client_config(),
            repos.users.clone(),
            CatalogCache::new(config.cache.ttls()),
        )
        .expect("Failed to build Spotify client");

        let state = AppState::new(&config, repos.clone(), client);

        Self {
            db,
            repos,
            state,
            config,
            spotify,
            user,
            dir,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user.id
    }

    pub fn router(&self) -> Router {
        api::router(self.state.clone(), self.config.server.web_dir.clone())
    }

    /// `Authorization` header value for the test user
    pub fn bearer(&self) -> String {
        let token = self
            .state
            .sessions
            .create_token(self.user.id)
            .expect("Failed to create session token");
        format!("Bearer {token}")
    }

    pub async fn add_target(&self, playlist_id: &str) {
        self.repos
            .target_playlists
            .add_target_playlist(self.user.id, playlist(playlist_id))
            .await
            .expect("Failed to add target playlist");
    }

    pub async fn approve(&self, playlist_id: &str) {
        self.repos
            .approved_playlists
            .add_approved_playlist(self.user.id, playlist(playlist_id))
            .await
            .expect("Failed to approve playlist");
    }
}

pub fn playlist(playlist_id: &str) -> NewPlaylistRef {
    NewPlaylistRef {
        playlist_id: playlist_id.to_string(),
        playlist_name: format!("Playlist {playlist_id}"),
    }
}

/// `/me/player` body for a track playing in the given context
pub fn playing(track_id: &str, context_type: &str, context_uri: &str) -> Value {
    json!({
        "is_playing": true,
        "progress_ms": 1000,
        "shuffle_state": false,
        "item": {
            "id": track_id,
            "uri": format!("spotify:track:{track_id}"),
            "name": format!("Track {track_id}"),
            "artists": [{"name": "Artist A"}, {"name": "Artist B"}],
            "album": {"name": "Album", "images": [{"url": "https://img/cover.jpg"}]},
            "duration_ms": 200_000
        },
        "context": {"type": context_type, "uri": context_uri}
    })
}
