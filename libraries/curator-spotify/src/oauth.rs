//! Authorization-code flow and token endpoint calls.

use crate::error::{Result, SpotifyError};
use crate::types::{SpotifyConfig, TokenResponse, UserProfile};
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Scopes requested at login.
pub const SCOPES: &[&str] = &[
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "playlist-read-private",
    "playlist-read-collaborative",
    "playlist-modify-public",
    "playlist-modify-private",
];

/// Client for the accounts service (authorize URL, code and refresh grants)
/// plus the profile lookup that completes a login.
#[derive(Clone)]
pub struct OAuthClient {
    http: Client,
    config: Arc<SpotifyConfig>,
}

impl OAuthClient {
    pub fn new(http: Client, config: Arc<SpotifyConfig>) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &SpotifyConfig {
        &self.config
    }

    /// Build the URL the browser is redirected to for consent.
    pub fn authorize_url(&self, state: &str) -> Result<String> {
        let (client_id, _) = self.credentials()?;
        let scope = SCOPES.join(" ");

        let url = Url::parse_with_params(
            &self.config.authorize_url(),
            &[
                ("client_id", client_id),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", scope.as_str()),
                ("show_dialog", "true"),
                ("state", state),
            ],
        )
        .map_err(|e| SpotifyError::Config(format!("Invalid accounts URL: {e}")))?;

        Ok(url.into())
    }

    /// Exchange an authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ])
        .await
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    /// Fetch the profile owning `access_token`.
    pub async fn fetch_profile(&self, access_token: &str) -> Result<UserProfile> {
        let url = format!("{}/me", self.config.api_base_url);
        let response = self.http.get(&url).bearer_auth(access_token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let (client_id, client_secret) = self.credentials()?;
        let url = self.config.token_url();
        debug!(url = %url, grant_type = form[0].1, "Requesting token");

        let response = self
            .http
            .post(&url)
            .basic_auth(client_id, Some(client_secret))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpotifyError::TokenExchange(format!("{status} - {body}")));
        }

        Ok(response.json().await?)
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        self.config
            .client_credentials()
            .ok_or_else(|| SpotifyError::Config("Spotify client credentials not configured".into()))
    }
}
