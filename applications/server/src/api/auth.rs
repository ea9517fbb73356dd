/// Authentication API routes (Spotify authorization-code login)
use crate::{
    error::Result,
    middleware::auth::{cookie_value, session_user},
    services::SessionService,
    state::AppState,
};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use curator_core::{NewUser, StoreResult, User, UserUpdate};
use curator_spotify::{SpotifyError, TokenResponse, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::json;

const STATE_COOKIE: &str = "curator_oauth_state";

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub spotify_id: String,
    pub display_name: Option<String>,
}

/// 302 to `location`, setting each cookie
fn redirect(location: &str, cookies: &[String]) -> Response {
    let mut response = (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response();
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

fn failed(reason: &str) -> Response {
    redirect(&format!("/?error={reason}"), &[clear_state_cookie()])
}

fn clear_state_cookie() -> String {
    format!("{STATE_COOKIE}=; Path=/api/auth; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// GET /api/auth/login
pub async fn login(State(app_state): State<AppState>) -> Response {
    let state = uuid::Uuid::new_v4().simple().to_string();

    match app_state.spotify.oauth().authorize_url(&state) {
        Ok(url) => redirect(
            &url,
            &[format!(
                "{STATE_COOKIE}={state}; Path=/api/auth; HttpOnly; SameSite=Lax; Max-Age=600"
            )],
        ),
        Err(e) => {
            tracing::error!("Cannot start login: {}", e);
            let config = app_state.spotify.oauth().config();
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "message": "Spotify credentials not configured. Set CURATOR_SPOTIFY__CLIENT_ID and CURATOR_SPOTIFY__CLIENT_SECRET.",
                    "details": {
                        "hasClientId": config.client_id.is_some(),
                        "hasClientSecret": config.client_secret.is_some(),
                    }
                })),
            )
                .into_response()
        }
    }
}

/// GET /api/auth/callback
pub async fn callback(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let Some(code) = query.code.filter(|_| query.error.is_none()) else {
        return failed("auth_failed");
    };

    if query.state.is_none() || query.state.as_deref() != cookie_value(&headers, STATE_COOKIE) {
        tracing::warn!("OAuth state mismatch");
        return failed("state_mismatch");
    }

    let oauth = app_state.spotify.oauth();
    let tokens = match oauth.exchange_code(&code).await {
        Ok(tokens) => tokens,
        Err(SpotifyError::Config(msg)) => {
            tracing::error!("Cannot complete login: {}", msg);
            return failed("no_credentials");
        }
        Err(e) => {
            tracing::warn!("Authorization code exchange failed: {}", e);
            return failed("token_failed");
        }
    };

    let profile = match oauth.fetch_profile(&tokens.access_token).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!("Profile fetch failed: {}", e);
            return failed("profile_failed");
        }
    };

    let user = match upsert_user(&app_state, tokens, profile).await {
        Ok(user) => user,
        Err(e) => {
            tracing::error!("Failed to store user: {}", e);
            return failed("auth_error");
        }
    };

    let token = match app_state.sessions.create_token(user.id) {
        Ok(token) => token,
        Err(e) => {
            tracing::error!("Failed to issue session: {}", e);
            return failed("session_failed");
        }
    };

    tracing::info!(user_id = %user.id, spotify_id = %user.spotify_id, "User logged in");
    redirect("/", &[app_state.sessions.cookie(&token), clear_state_cookie()])
}

async fn upsert_user(
    app_state: &AppState,
    tokens: TokenResponse,
    profile: UserProfile,
) -> StoreResult<User> {
    let token_expiry = Utc::now() + Duration::seconds(tokens.expires_in);
    let users = &app_state.repos.users;

    match users.get_user_by_spotify_id(&profile.id).await? {
        Some(existing) => {
            users
                .update_user(
                    existing.id,
                    UserUpdate {
                        display_name: profile.display_name,
                        access_token: Some(tokens.access_token),
                        // Not always reissued on re-authorization
                        refresh_token: tokens.refresh_token,
                        token_expiry: Some(token_expiry),
                    },
                )
                .await
        }
        None => {
            users
                .create_user(NewUser {
                    spotify_id: profile.id,
                    display_name: profile.display_name,
                    access_token: Some(tokens.access_token),
                    refresh_token: tokens.refresh_token,
                    token_expiry: Some(token_expiry),
                })
                .await
        }
    }
}

/// POST /api/auth/logout
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, SessionService::clear_cookie())],
        Json(json!({ "success": true })),
    )
}

/// GET /api/auth/me
pub async fn me(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<MeResponse>>> {
    let Some(user_id) = session_user(&app_state.sessions, &headers) else {
        return Ok(Json(None));
    };

    let user = app_state.repos.users.get_user(user_id).await?;
    Ok(Json(user.map(|u| MeResponse {
        id: u.id.get(),
        spotify_id: u.spotify_id,
        display_name: u.display_name,
    })))
}
