//! Display settings endpoints.

use axum::{extract::State, Json};

use super::{error, notify_player, success, ApiResult};
use crate::models::{AppSettings, UpdateSettingsRequest};
use crate::AppState;

/// GET /api/settings - Current display settings.
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<AppSettings> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_settings().await {
        Ok(settings) => success(settings, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/admin/settings - Partial settings update.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(request): Json<UpdateSettingsRequest>,
) -> ApiResult<AppSettings> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.save_settings(&request).await {
        Ok(settings) => {
            tracing::info!("Settings updated");
            notify_player(&state).await;
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(settings, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
