/// Player API routes: playback state, controls, and like/dislike
use crate::{
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    services::{DislikeReport, LikeReport},
    state::AppState,
};
use axum::{extract::State, Json};
use curator_spotify::{PlaybackState, RetryPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

const OK: Json<SuccessResponse> = Json(SuccessResponse { success: true });

#[derive(Debug, Serialize)]
pub struct ShuffleResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub shuffle_state: bool,
}

#[derive(Debug, Deserialize)]
pub struct ShuffleRequest {
    pub state: bool,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub position_ms: u64,
}

/// GET /api/player/current
/// Currently playing track; `null` when nothing plays or Spotify fails
pub async fn current(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Json<Option<PlaybackState>> {
    let user_id = auth.user_id();
    let spotify = &app_state.spotify;

    let mut state = match spotify.current_track(user_id, RetryPolicy::FAST).await {
        Ok(state) => state,
        Err(e) => {
            tracing::debug!(user_id = %user_id, error = %e, "Current playback unavailable");
            return Json(None);
        }
    };

    if let Some(context) = state.as_mut().and_then(|s| s.context.as_mut()) {
        if let Some(playlist_id) = context.playlist_id().map(String::from) {
            context.name = spotify
                .playlist_name(user_id, &playlist_id)
                .await
                .unwrap_or_else(|e| {
                    tracing::debug!(playlist_id = %playlist_id, error = %e, "Playlist name unavailable");
                    None
                });
        }
    }

    Json(state)
}

/// POST /api/player/like
pub async fn like(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<LikeReport>> {
    Ok(Json(app_state.actions.like(auth.user_id()).await?))
}

/// POST /api/player/dislike
pub async fn dislike(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<DislikeReport>> {
    Ok(Json(app_state.actions.dislike(auth.user_id()).await?))
}

/// POST /api/player/skip
pub async fn skip(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<SuccessResponse>> {
    app_state
        .spotify
        .next(auth.user_id(), RetryPolicy::PATIENT)
        .await
        .map_err(ServerError::upstream("Failed to skip"))?;
    Ok(OK)
}

/// POST /api/player/previous
pub async fn previous(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<SuccessResponse>> {
    app_state
        .spotify
        .previous(auth.user_id(), RetryPolicy::PATIENT)
        .await
        .map_err(ServerError::upstream("Failed to go to previous track"))?;
    Ok(OK)
}

/// POST /api/player/play
pub async fn play(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<SuccessResponse>> {
    app_state
        .spotify
        .play(auth.user_id(), RetryPolicy::PATIENT)
        .await
        .map_err(ServerError::upstream("Failed to resume playback"))?;
    Ok(OK)
}

/// POST /api/player/pause
pub async fn pause(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<SuccessResponse>> {
    app_state
        .spotify
        .pause(auth.user_id(), RetryPolicy::PATIENT)
        .await
        .map_err(ServerError::upstream("Failed to pause"))?;
    Ok(OK)
}

/// GET /api/player/shuffle
pub async fn shuffle_state(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Json<ShuffleResponse> {
    let shuffle_state = app_state
        .spotify
        .player_state(auth.user_id(), RetryPolicy::FAST)
        .await
        .map(|state| state.is_some_and(|s| s.shuffle_state))
        .unwrap_or(false);

    Json(ShuffleResponse {
        success: None,
        shuffle_state,
    })
}

/// POST /api/player/shuffle
pub async fn set_shuffle(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<ShuffleRequest>,
) -> Result<Json<ShuffleResponse>> {
    app_state
        .spotify
        .set_shuffle(auth.user_id(), req.state, RetryPolicy::PATIENT)
        .await
        .map_err(ServerError::upstream("Failed to set shuffle"))?;

    Ok(Json(ShuffleResponse {
        success: Some(true),
        shuffle_state: req.state,
    }))
}

/// POST /api/player/seek
pub async fn seek(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Json(req): Json<SeekRequest>,
) -> Result<Json<SuccessResponse>> {
    app_state
        .spotify
        .seek(auth.user_id(), req.position_ms, RetryPolicy::PATIENT)
        .await
        .map_err(ServerError::upstream("Failed to seek"))?;
    Ok(OK)
}
