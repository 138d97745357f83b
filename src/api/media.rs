//! Media API endpoints, for admins and for clients managing their own uploads.

use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

use super::upload::{receive_upload, remove_media};
use super::{error, notify_player, success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    CatalogExport, Client, Folder, FolderMoveRequest, FolderStats, MediaRecord,
    UpdateMediaRequest, VisibilityRequest, MAX_IMAGE_DURATION_MS,
};
use crate::AppState;

/// Query string of the admin media list.
#[derive(Debug, Deserialize)]
pub struct MediaQuery {
    #[serde(default)]
    pub folder: Option<String>,
}

/// GET /api/admin/media - List media, newest first.
pub async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<MediaQuery>,
) -> ApiResult<Vec<MediaRecord>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let folder = match query.folder.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match Folder::parse(raw) {
            Some(folder) => Some(folder),
            None => {
                return error(
                    AppError::Validation(format!("Unknown folder: {}", raw)),
                    revision_id,
                )
            }
        },
    };

    match state.repo.list_media(folder).await {
        Ok(media) => success(media, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/admin/media - Multipart upload without an owner.
pub async fn upload_media(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Vec<MediaRecord>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match receive_upload(&state, multipart, None).await {
        Ok(records) => {
            notify_player(&state).await;
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(records, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/admin/media/:id - Edit folder, visibility or animation.
pub async fn update_media(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMediaRequest>,
) -> ApiResult<MediaRecord> {
    apply_media_update(&state, &id, &request, None).await
}

/// PUT /api/admin/media/:id/visibility - Show or hide a record.
pub async fn set_media_visibility(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<VisibilityRequest>,
) -> ApiResult<MediaRecord> {
    let update = UpdateMediaRequest {
        hidden: Some(request.hidden),
        ..UpdateMediaRequest::default()
    };
    apply_media_update(&state, &id, &update, None).await
}

/// PUT /api/admin/media/:id/folder - Move a record to another folder.
pub async fn move_media_folder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<FolderMoveRequest>,
) -> ApiResult<MediaRecord> {
    let update = UpdateMediaRequest {
        folder: Some(request.folder),
        ..UpdateMediaRequest::default()
    };
    apply_media_update(&state, &id, &update, None).await
}

/// DELETE /api/admin/media/:id - Delete a record and its object.
pub async fn delete_media(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    delete_media_record(&state, &id, None).await
}

/// GET /api/admin/folders - Per-folder counters.
pub async fn folder_stats(State(state): State<AppState>) -> ApiResult<Vec<FolderStats>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_media(None).await {
        Ok(media) => success(FolderStats::collect(&media), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/export - The whole catalog grouped by folder.
pub async fn export_catalog(State(state): State<AppState>) -> ApiResult<CatalogExport> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_media(None).await {
        Ok(media) => {
            let export = CatalogExport::new(media, Utc::now().to_rfc3339());
            tracing::info!("Exported {} media records", export.total);
            success(export, revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/upload/media - The authenticated client's own media.
pub async fn list_client_media(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
) -> ApiResult<Vec<MediaRecord>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_media_for_client(&client.id).await {
        Ok(media) => success(media, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/upload/media - Multipart upload owned by the client.
pub async fn upload_client_media(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    multipart: Multipart,
) -> ApiResult<Vec<MediaRecord>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match receive_upload(&state, multipart, Some(&client.id)).await {
        Ok(records) => {
            notify_player(&state).await;
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(records, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/upload/media/:id - Edit one of the client's own records.
pub async fn update_client_media(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMediaRequest>,
) -> ApiResult<MediaRecord> {
    apply_media_update(&state, &id, &request, Some(&client)).await
}

/// DELETE /api/upload/media/:id - Delete one of the client's own records.
pub async fn delete_client_media(
    State(state): State<AppState>,
    Extension(client): Extension<Client>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    delete_media_record(&state, &id, Some(&client)).await
}

async fn apply_media_update(
    state: &AppState,
    id: &str,
    request: &UpdateMediaRequest,
    owner: Option<&Client>,
) -> ApiResult<MediaRecord> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Some(ms) = request.animation_duration {
        if ms == 0 || ms > MAX_IMAGE_DURATION_MS {
            return error(
                AppError::Validation(format!(
                    "animationDuration must be between 1 and {} ms",
                    MAX_IMAGE_DURATION_MS
                )),
                revision_id,
            );
        }
    }

    if let Err(e) = find_media(state, id, owner).await {
        return error(e, revision_id);
    }

    match state.repo.update_media(id, request).await {
        Ok(record) => {
            notify_player(state).await;
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(record, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

async fn delete_media_record(state: &AppState, id: &str, owner: Option<&Client>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let record = match find_media(state, id, owner).await {
        Ok(record) => record,
        Err(e) => return error(e, revision_id),
    };

    match remove_media(state, &record).await {
        Ok(()) => {
            tracing::info!("Deleted media {} ({})", record.id, record.original_name);
            notify_player(state).await;
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success((), new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// Look up a record, restricted to `owner`'s media when given. Another
/// client's record reads as missing.
async fn find_media(
    state: &AppState,
    id: &str,
    owner: Option<&Client>,
) -> Result<MediaRecord, AppError> {
    let record = state.repo.get_media(id).await?;
    record
        .filter(|r| match owner {
            Some(client) => r.client_id.as_deref() == Some(client.id.as_str()),
            None => true,
        })
        .ok_or_else(|| AppError::NotFound(format!("Media {} not found", id)))
}
