/// API route modules
pub mod auth;
pub mod health;
pub mod player;
pub mod playlists;
pub mod stats;

use crate::{middleware, state::AppState};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use std::path::PathBuf;
use tower::ServiceExt;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Build the full application router: the JSON API under `/api` and the
/// web UI from `web_dir` for every other path.
pub fn router(app_state: AppState, web_dir: PathBuf) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", get(auth::login))
        .route("/auth/callback", get(auth::callback))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        // Playlists
        .route("/playlists", get(playlists::list_spotify_playlists))
        .route(
            "/target-playlists",
            get(playlists::list_targets).post(playlists::add_target),
        )
        .route("/target-playlists/:id", delete(playlists::remove_target))
        .route(
            "/approved-source-playlists",
            get(playlists::list_approved).post(playlists::add_approved),
        )
        .route(
            "/approved-source-playlists/:id",
            delete(playlists::remove_approved),
        )
        // Player
        .route("/player/current", get(player::current))
        .route("/player/like", post(player::like))
        .route("/player/dislike", post(player::dislike))
        .route("/player/skip", post(player::skip))
        .route("/player/previous", post(player::previous))
        .route("/player/play", post(player::play))
        .route("/player/pause", post(player::pause))
        .route(
            "/player/shuffle",
            get(player::shuffle_state).post(player::set_shuffle),
        )
        .route("/player/seek", post(player::seek))
        // Stats
        .route("/stats/summary", get(stats::summary))
        .route("/stats/history", get(stats::history))
        .layer(axum_middleware::from_fn_with_state(
            app_state.sessions.clone(),
            middleware::auth_middleware,
        ));

    // Static file serving for web UI (SPA with fallback to index.html)
    let spa_fallback = move |req: Request<Body>| {
        let web_dir = web_dir.clone();
        async move {
            let path = req.uri().path().trim_start_matches('/');
            let file_path = web_dir.join(path);

            if !path.is_empty() && file_path.is_file() {
                return match ServeDir::new(&web_dir).oneshot(req).await {
                    Ok(res) => res.into_response(),
                    Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
                };
            }

            match tokio::fs::read(web_dir.join("index.html")).await {
                Ok(contents) => index_response(contents),
                Err(_) => StatusCode::NOT_FOUND.into_response(),
            }
        }
    };

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .fallback(spa_fallback)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

fn index_response(contents: Vec<u8>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        contents,
    )
        .into_response()
}
