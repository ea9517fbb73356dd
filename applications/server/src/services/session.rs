/// Browser sessions as signed JWTs
use crate::error::{Result, ServerError};
use chrono::{Duration, Utc};
use curator_core::UserId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "curator_session";

#[derive(Debug, Clone)]
pub struct SessionService {
    secret: String,
    lifetime: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
}

impl SessionService {
    pub fn new(secret: String, lifetime_hours: u64) -> Self {
        Self {
            secret,
            lifetime: Duration::hours(lifetime_hours as i64),
        }
    }

    /// Issue a session token for `user_id`
    pub fn create_token(&self, user_id: UserId) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.lifetime).timestamp(),
            iat: now.timestamp(),
        };

        let encoding_key = EncodingKey::from_secret(self.secret.as_bytes());
        encode(&Header::default(), &claims, &encoding_key).map_err(ServerError::from)
    }

    /// Verify a session token and return its user
    pub fn verify_token(&self, token: &str) -> Result<UserId> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())?;

        token_data
            .claims
            .sub
            .parse::<i64>()
            .map(UserId::new)
            .map_err(|_| ServerError::Auth("Invalid session subject".to_string()))
    }

    /// `Set-Cookie` value carrying `token`
    pub fn cookie(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.lifetime.num_seconds()
        )
    }

    /// `Set-Cookie` value that removes the session
    pub fn clear_cookie() -> String {
        format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}
