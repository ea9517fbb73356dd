/// Playlists API routes
use crate::{
    error::{Result, ServerError},
    middleware::AuthenticatedUser,
    state::AppState,
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use curator_core::{NewPlaylistRef, PlaylistRef};
use curator_spotify::PlaylistSummary;

/// Malformed bodies are rejected as 400 like any other invalid input
fn validated(
    payload: std::result::Result<Json<NewPlaylistRef>, JsonRejection>,
) -> Result<NewPlaylistRef> {
    let Json(input) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    input.validate().map_err(ServerError::BadRequest)?;
    Ok(NewPlaylistRef {
        playlist_id: input.playlist_id.trim().to_string(),
        playlist_name: input.playlist_name.trim().to_string(),
    })
}

/// GET /api/playlists
/// The user's Spotify playlists, served from the catalog cache
pub async fn list_spotify_playlists(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<PlaylistSummary>>> {
    let playlists = app_state
        .spotify
        .playlists(auth.user_id())
        .await
        .map_err(ServerError::upstream("Failed to fetch playlists"))?;
    Ok(Json(playlists))
}

// ---- Target playlists ----

/// GET /api/target-playlists
pub async fn list_targets(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<PlaylistRef>>> {
    let targets = app_state
        .repos
        .target_playlists
        .list_target_playlists(auth.user_id())
        .await?;
    Ok(Json(targets))
}

/// POST /api/target-playlists
pub async fn add_target(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    payload: std::result::Result<Json<NewPlaylistRef>, JsonRejection>,
) -> Result<(StatusCode, Json<PlaylistRef>)> {
    let input = validated(payload)?;
    let created = app_state
        .repos
        .target_playlists
        .add_target_playlist(auth.user_id(), input)
        .await?;

    tracing::info!(user_id = %auth.user_id(), playlist_id = %created.playlist_id, "Target playlist added");
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/target-playlists/:id
pub async fn remove_target(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    app_state
        .repos
        .target_playlists
        .remove_target_playlist(id, auth.user_id())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Approved source playlists ----

/// GET /api/approved-source-playlists
pub async fn list_approved(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<PlaylistRef>>> {
    let approved = app_state
        .repos
        .approved_playlists
        .list_approved_playlists(auth.user_id())
        .await?;
    Ok(Json(approved))
}

/// POST /api/approved-source-playlists
pub async fn add_approved(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    payload: std::result::Result<Json<NewPlaylistRef>, JsonRejection>,
) -> Result<(StatusCode, Json<PlaylistRef>)> {
    let input = validated(payload)?;
    let created = app_state
        .repos
        .approved_playlists
        .add_approved_playlist(auth.user_id(), input)
        .await?;

    tracing::info!(user_id = %auth.user_id(), playlist_id = %created.playlist_id, "Source playlist approved");
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/approved-source-playlists/:id
pub async fn remove_approved(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    app_state
        .repos
        .approved_playlists
        .remove_approved_playlist(id, auth.user_id())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
