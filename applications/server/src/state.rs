/// Shared application state
use crate::config::ServerConfig;
use crate::services::{ActionService, SessionService};
use curator_core::Repositories;
use curator_spotify::SpotifyClient;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub spotify: SpotifyClient,
    pub sessions: Arc<SessionService>,
    pub actions: Arc<ActionService>,
}

impl AppState {
    pub fn new(config: &ServerConfig, repos: Repositories, spotify: SpotifyClient) -> Self {
        let sessions = SessionService::new(
            config.auth.session_secret.clone(),
            config.auth.session_hours,
        );
        let actions = ActionService::new(spotify.clone(), repos.clone());

        Self {
            repos,
            spotify,
            sessions: Arc::new(sessions),
            actions: Arc::new(actions),
        }
    }
}
