/// Server error types
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use curator_core::StoreError;
use curator_spotify::SpotifyError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("No track currently playing")]
    NothingPlaying,

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Spotify call failed; `context` is what the user sees
    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        #[source]
        source: SpotifyError,
    },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl ServerError {
    /// Attach a user-facing description to a Spotify failure.
    ///
    /// ```ignore
    /// client.next(user, policy).await.map_err(ServerError::upstream("Failed to skip"))?;
    /// ```
    pub fn upstream(context: &'static str) -> impl FnOnce(SpotifyError) -> Self {
        move |source| Self::Upstream { context, source }
    }
}

impl From<SpotifyError> for ServerError {
    fn from(source: SpotifyError) -> Self {
        Self::Upstream {
            context: "Spotify request failed",
            source,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg),
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ServerError::NothingPlaying => (
                StatusCode::BAD_REQUEST,
                "No track currently playing".to_string(),
            ),
            ServerError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ServerError::Upstream { ref source, .. } if source.is_auth() => {
                tracing::warn!(error = %source, "Spotify credentials unusable");
                (StatusCode::UNAUTHORIZED, source.to_string())
            }
            ServerError::Upstream { context, ref source } => {
                tracing::error!(error = %source, "{}", context);
                (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
            }
            ServerError::Store(StoreError::NotFound { ref entity, .. }) => {
                (StatusCode::NOT_FOUND, format!("{entity} not found"))
            }
            ServerError::Store(ref e) => {
                tracing::error!("Storage error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
            ServerError::Config(ref msg) => {
                tracing::error!("Config error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration error".to_string(),
                )
            }
            ServerError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ServerError::Io(ref e) => {
                tracing::error!("IO error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "IO error".to_string())
            }
            ServerError::Jwt(ref e) => {
                tracing::debug!("JWT error: {:?}", e);
                (StatusCode::UNAUTHORIZED, "Not authenticated".to_string())
            }
        };

        let body = Json(json!({
            "message": message,
        }));

        (status, body).into_response()
    }
}
