//! Multipart upload handling shared by the admin and client screens.

use std::collections::HashSet;

use axum::body::Bytes;
use axum::extract::Multipart;

use crate::errors::AppError;
use crate::models::{
    AnimationKind, Folder, MediaKind, MediaRecord, NewMediaRecord, DEFAULT_IMAGE_DURATION_MS,
    MAX_IMAGE_DURATION_MS,
};
use crate::AppState;

/// One file part of an upload.
struct UploadedFile {
    original_name: String,
    content_type: String,
    kind: MediaKind,
    bytes: Bytes,
}

/// A parsed upload form. Every file has already been checked to be media.
struct UploadForm {
    files: Vec<UploadedFile>,
    folder: Folder,
    animation_type: AnimationKind,
    animation_duration: u64,
    replace: bool,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm {
            files: Vec::new(),
            folder: Folder::All,
            animation_type: AnimationKind::default(),
            animation_duration: DEFAULT_IMAGE_DURATION_MS,
            replace: false,
        };

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" | "files" | "files[]" => {
                    let original_name = field
                        .file_name()
                        .map(|n| n.trim().to_string())
                        .filter(|n| !n.is_empty())
                        .ok_or_else(|| {
                            AppError::Validation("Uploaded file has no name".to_string())
                        })?;
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    let Some(kind) = MediaKind::from_upload_mime(&content_type) else {
                        return Err(AppError::Validation(format!(
                            "{} is not an image or video",
                            original_name
                        )));
                    };

                    let bytes = field.bytes().await?;
                    if bytes.is_empty() {
                        return Err(AppError::Validation(format!("{} is empty", original_name)));
                    }

                    form.files.push(UploadedFile {
                        original_name,
                        content_type,
                        kind,
                        bytes,
                    });
                }
                "folder" => {
                    let value = field.text().await?;
                    if !value.trim().is_empty() {
                        form.folder = Folder::parse(&value).ok_or_else(|| {
                            AppError::Validation(format!("Unknown folder: {}", value))
                        })?;
                    }
                }
                "animationType" => {
                    form.animation_type = AnimationKind::parse_or_fade(&field.text().await?);
                }
                "animationDuration" => {
                    let value = field.text().await?;
                    if !value.trim().is_empty() {
                        form.animation_duration = parse_duration(&value)?;
                    }
                }
                "replace" => {
                    let value = field.text().await?;
                    form.replace = matches!(value.trim(), "true" | "1" | "on");
                }
                other => tracing::debug!("Ignoring upload field {:?}", other),
            }
        }

        if form.files.is_empty() {
            return Err(AppError::Validation("No files uploaded".to_string()));
        }
        form.check_unique_names()?;
        Ok(form)
    }

    /// Two parts with one name would both be stored under the same
    /// folder and owner, and a later replace would only find one of them.
    fn check_unique_names(&self) -> Result<(), AppError> {
        let mut seen = HashSet::new();
        for file in &self.files {
            if !seen.insert(file.original_name.as_str()) {
                return Err(AppError::Validation(format!(
                    "{} appears more than once in this upload",
                    file.original_name
                )));
            }
        }
        Ok(())
    }
}

/// Display duration in milliseconds, between 1 and [`MAX_IMAGE_DURATION_MS`].
pub(super) fn parse_duration(value: &str) -> Result<u64, AppError> {
    match value.trim().parse::<u64>() {
        Ok(ms) if ms > 0 && ms <= MAX_IMAGE_DURATION_MS => Ok(ms),
        _ => Err(AppError::Validation(format!(
            "Invalid animationDuration: {}",
            value.trim()
        ))),
    }
}

/// Read an upload form and store every file, owned by `owner` if given.
///
/// Name conflicts are checked for all files before anything is written.
pub(super) async fn receive_upload(
    state: &AppState,
    multipart: Multipart,
    owner: Option<&str>,
) -> Result<Vec<MediaRecord>, AppError> {
    let form = UploadForm::read(multipart).await?;

    let mut replaced = Vec::new();
    for file in &form.files {
        let existing = state
            .repo
            .find_media_by_name(form.folder, &file.original_name, owner)
            .await?;
        if let Some(existing) = existing {
            if !form.replace {
                return Err(AppError::Conflict {
                    message: format!(
                        "{} already exists in folder {}",
                        file.original_name, form.folder
                    ),
                    existing_id: existing.id,
                });
            }
            replaced.push(existing);
        }
    }

    for existing in &replaced {
        tracing::info!("Replacing media {} ({})", existing.id, existing.original_name);
        remove_media(state, existing).await?;
    }

    let mut stored = Vec::with_capacity(form.files.len());
    for file in form.files {
        let object = state
            .storage
            .put(form.folder, &file.original_name, &file.bytes)
            .await?;

        let (animation_type, animation_duration) = match file.kind {
            MediaKind::Image => (Some(form.animation_type), Some(form.animation_duration)),
            MediaKind::Video => (None, None),
        };

        let new = NewMediaRecord {
            original_name: file.original_name,
            file_name: object.file_name,
            file_type: file.content_type,
            file_size: object.size,
            folder: form.folder,
            url: object.url,
            storage_key: object.key.clone(),
            animation_type,
            animation_duration,
            client_id: owner.map(str::to_string),
        };

        match state.repo.insert_media(&new).await {
            Ok(record) => {
                tracing::info!(
                    "Uploaded {} to {} ({} bytes)",
                    record.original_name,
                    record.folder,
                    record.file_size
                );
                stored.push(record);
            }
            Err(e) => {
                if let Err(cleanup) = state.storage.remove(&object.key).await {
                    tracing::warn!("Failed to remove orphaned object {}: {}", object.key, cleanup);
                }
                return Err(e);
            }
        }
    }

    Ok(stored)
}

/// Delete a record and its stored object. A storage failure leaves an
/// orphaned object behind but still removes the record.
pub(super) async fn remove_media(state: &AppState, record: &MediaRecord) -> Result<(), AppError> {
    if let Err(e) = state.storage.remove(&record.storage_key).await {
        tracing::warn!("Failed to remove object {}: {}", record.storage_key, e);
    }
    state.repo.delete_media(&record.id).await
}
