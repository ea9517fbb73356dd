//! Per-user access token lifecycle.

use crate::error::Result;
use crate::oauth::OAuthClient;
use chrono::{Duration, Utc};
use curator_core::{Credential, UserId, UserRepository, UserUpdate};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Keeps each user's access token fresh.
///
/// Tokens are refreshed lazily when the stored expiry has passed, and on
/// demand through [`TokenManager::force_refresh`] when the API rejects a
/// token that still looked valid locally.
#[derive(Clone)]
pub struct TokenManager {
    users: Arc<dyn UserRepository>,
    oauth: OAuthClient,
}

impl TokenManager {
    pub fn new(users: Arc<dyn UserRepository>, oauth: OAuthClient) -> Self {
        Self { users, oauth }
    }

    /// Return a usable access token, refreshing it first if it has expired.
    ///
    /// `Ok(None)` means no token can be had: unknown user, no refresh token,
    /// missing client credentials, or a rejected refresh. Storage failures
    /// propagate.
    pub async fn get_valid_access_token(&self, user_id: UserId) -> Result<Option<String>> {
        let Some(user) = self.users.get_user(user_id).await? else {
            return Ok(None);
        };
        let credential = user.credential();

        if credential.refresh_token.is_none() {
            return Ok(None);
        }

        if let Some(token) = credential.usable_access_token(Utc::now()) {
            return Ok(Some(token.to_string()));
        }

        debug!(user_id = %user_id, "Access token expired, refreshing");
        self.refresh(&credential).await
    }

    /// Refresh regardless of the stored expiry.
    pub async fn force_refresh(&self, user_id: UserId) -> Result<Option<String>> {
        let Some(user) = self.users.get_user(user_id).await? else {
            return Ok(None);
        };

        warn!(user_id = %user_id, "Forcing token refresh after auth rejection");
        self.refresh(&user.credential()).await
    }

    async fn refresh(&self, credential: &Credential) -> Result<Option<String>> {
        let Some(refresh_token) = credential.refresh_token.as_deref() else {
            return Ok(None);
        };

        if self.oauth.config().client_credentials().is_none() {
            warn!(user_id = %credential.user_id, "Cannot refresh token: client credentials missing");
            return Ok(None);
        }

        let response = match self.oauth.refresh(refresh_token).await {
            Ok(response) => response,
            Err(e) => {
                warn!(user_id = %credential.user_id, error = %e, "Token refresh failed");
                return Ok(None);
            }
        };

        let expiry = Utc::now() + Duration::seconds(response.expires_in);
        self.users
            .update_user(
                credential.user_id,
                UserUpdate {
                    access_token: Some(response.access_token.clone()),
                    // Not always reissued; keep the stored one otherwise
                    refresh_token: response.refresh_token,
                    token_expiry: Some(expiry),
                    ..UserUpdate::default()
                },
            )
            .await?;

        info!(user_id = %credential.user_id, "Access token refreshed");
        Ok(Some(response.access_token))
    }
}
