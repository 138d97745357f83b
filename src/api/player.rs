//! Player endpoints used by the display page.

use axum::{extract::State, Json};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::player::NowShowing;
use crate::AppState;

/// Completion report from the display.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishedRequest {
    pub playback_id: u64,
}

/// GET /api/player/now - The record on screen, or null when idle.
pub async fn now_playing(State(state): State<AppState>) -> ApiResult<Option<NowShowing>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    success(state.player.now_showing(), revision_id)
}

/// POST /api/player/finished - The display reports that a video ended.
pub async fn media_finished(
    State(state): State<AppState>,
    Json(request): Json<FinishedRequest>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.player.media_finished(request.playback_id).await {
        Ok(()) => success((), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/player/refresh - Poll the catalog now.
pub async fn refresh_player(State(state): State<AppState>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.player.refresh().await {
        Ok(()) => success((), revision_id),
        Err(e) => error(e, revision_id),
    }
}
