//! Error types for the Spotify client.

use curator_core::StoreError;
use thiserror::Error;

/// Errors that can occur when talking to the Spotify Web API.
///
/// Cloneable so that callers coalesced onto one in-flight request can all
/// observe the same failure.
#[derive(Error, Debug, Clone)]
pub enum SpotifyError {
    /// No usable access token and none could be obtained by refreshing
    #[error("No valid access token")]
    NoAccessToken,

    /// The API rejected the token even after a forced refresh
    #[error("Spotify rejected the access token")]
    AuthRejected,

    /// Rate limited and the retry budget is spent
    #[error(
        "Spotify API error: 429 - Too many requests (retry-after={}) - {body}",
        retry_after_label(.retry_after_secs)
    )]
    RateLimited {
        retry_after_secs: Option<u64>,
        body: String,
    },

    /// Any other non-2xx response
    #[error("Spotify API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// Token endpoint refused an exchange
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// Transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Credential store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Client is missing configuration it needs
    #[error("Configuration error: {0}")]
    Config(String),

    /// Background task failure
    #[error("Internal error: {0}")]
    Internal(String),
}

fn retry_after_label(retry_after_secs: &Option<u64>) -> String {
    retry_after_secs.map_or_else(|| "?".to_string(), |secs| format!("{secs}s"))
}

impl SpotifyError {
    /// Whether this is an authentication failure (surfaced as 401)
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::NoAccessToken | Self::AuthRejected)
    }
}

impl From<reqwest::Error> for SpotifyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Parse(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

/// Result type for Spotify client operations.
pub type Result<T> = std::result::Result<T, SpotifyError>;
