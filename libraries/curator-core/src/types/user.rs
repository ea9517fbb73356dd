/// User and credential types
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered user together with the external account credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Internal id
    pub id: UserId,
    /// External streaming account id
    pub spotify_id: String,
    /// Display name from the external profile
    pub display_name: Option<String>,
    /// Current access token
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Long-lived refresh token
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    /// When the access token stops being valid
    #[serde(skip_serializing)]
    pub token_expiry: Option<DateTime<Utc>>,
}

impl User {
    /// Snapshot of the credential pair held for this user
    pub fn credential(&self) -> Credential {
        Credential {
            user_id: self.id,
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expiry: self.token_expiry,
        }
    }
}

/// Access/refresh token pair for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Owner
    pub user_id: UserId,
    /// Current access token
    pub access_token: Option<String>,
    /// Long-lived refresh token
    pub refresh_token: Option<String>,
    /// Access token expiry
    pub expiry: Option<DateTime<Utc>>,
}

impl Credential {
    /// Returns the access token if it is present and has not expired at `now`.
    pub fn usable_access_token(&self, now: DateTime<Utc>) -> Option<&str> {
        match (&self.access_token, self.expiry) {
            (Some(token), Some(expiry)) if expiry > now => Some(token.as_str()),
            _ => None,
        }
    }
}

/// Fields for creating a user
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    /// External streaming account id
    pub spotify_id: String,
    /// Display name
    pub display_name: Option<String>,
    /// Access token
    pub access_token: Option<String>,
    /// Refresh token
    pub refresh_token: Option<String>,
    /// Access token expiry
    pub token_expiry: Option<DateTime<Utc>>,
}

/// Partial update; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New display name
    pub display_name: Option<String>,
    /// New access token
    pub access_token: Option<String>,
    /// New refresh token
    pub refresh_token: Option<String>,
    /// New access token expiry
    pub token_expiry: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn credential(expiry: Option<DateTime<Utc>>) -> Credential {
        Credential {
            user_id: UserId::new(1),
            access_token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
            expiry,
        }
    }

    #[test]
    fn test_usable_access_token() {
        let now = Utc::now();

        let fresh = credential(Some(now + Duration::minutes(5)));
        assert_eq!(fresh.usable_access_token(now), Some("access"));

        let expired = credential(Some(now - Duration::seconds(1)));
        assert_eq!(expired.usable_access_token(now), None);

        let unknown_expiry = credential(None);
        assert_eq!(unknown_expiry.usable_access_token(now), None);
    }

    #[test]
    fn test_tokens_never_serialized() {
        let user = User {
            id: UserId::new(3),
            spotify_id: "spotify-user".to_string(),
            display_name: Some("Dana".to_string()),
            access_token: Some("secret".to_string()),
            refresh_token: Some("secret-refresh".to_string()),
            token_expiry: None,
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("spotifyId"));
        assert!(!json.contains("secret"));
    }
}
