/// Action statistics API routes
use crate::{error::Result, middleware::AuthenticatedUser, state::AppState};
use axum::{extract::State, Json};
use curator_core::{ActionRecord, ActionStats};

const HISTORY_LIMIT: u32 = 100;

/// GET /api/stats/summary
pub async fn summary(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<ActionStats>> {
    let stats = app_state.repos.actions.action_stats(auth.user_id()).await?;
    Ok(Json(stats))
}

/// GET /api/stats/history
/// Most recent actions first
pub async fn history(
    State(app_state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Vec<ActionRecord>>> {
    let records = app_state
        .repos
        .actions
        .list_recent_actions(auth.user_id(), HISTORY_LIMIT)
        .await?;
    Ok(Json(records))
}
