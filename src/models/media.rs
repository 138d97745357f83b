//! Media record model shared by the catalog, the player and the upload screens.

use serde::{Deserialize, Serialize};

use super::Folder;

/// Display time for an image without its own duration.
pub const DEFAULT_IMAGE_DURATION_MS: u64 = 5000;
/// Longest display time an image may ask for (one day).
pub const MAX_IMAGE_DURATION_MS: u64 = 86_400_000;

/// Image or video, resolved from the stored mime type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a mime type; anything that is not `video/*` renders as an image.
    pub fn from_mime(mime: &str) -> Self {
        if mime.starts_with("video/") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    /// Strict classification used when accepting uploads.
    pub fn from_upload_mime(mime: &str) -> Option<Self> {
        if mime.starts_with("image/") {
            Some(MediaKind::Image)
        } else if mime.starts_with("video/") {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

/// Entry transition applied when a media item appears.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AnimationKind {
    None,
    #[default]
    Fade,
    SlideLeft,
    SlideRight,
    Zoom,
    Rotate,
}

impl AnimationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationKind::None => "none",
            AnimationKind::Fade => "fade",
            AnimationKind::SlideLeft => "slide-left",
            AnimationKind::SlideRight => "slide-right",
            AnimationKind::Zoom => "zoom",
            AnimationKind::Rotate => "rotate",
        }
    }

    /// Unknown names fall back to fade.
    pub fn parse_or_fade(s: &str) -> Self {
        match s.trim() {
            "none" => AnimationKind::None,
            "slide-left" => AnimationKind::SlideLeft,
            "slide-right" => AnimationKind::SlideRight,
            "zoom" => AnimationKind::Zoom,
            "rotate" => AnimationKind::Rotate,
            _ => AnimationKind::Fade,
        }
    }
}

/// A stored media file and its scheduling metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: String,
    pub original_name: String,
    pub file_name: String,
    pub file_type: String,
    pub kind: MediaKind,
    pub file_size: i64,
    pub folder: Folder,
    pub url: String,
    pub storage_key: String,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_type: Option<AnimationKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl MediaRecord {
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }
}

/// Everything the repository needs to insert a freshly stored upload.
#[derive(Debug, Clone)]
pub struct NewMediaRecord {
    pub original_name: String,
    pub file_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub folder: Folder,
    pub url: String,
    pub storage_key: String,
    pub animation_type: Option<AnimationKind>,
    pub animation_duration: Option<u64>,
    pub client_id: Option<String>,
}

/// Request body for editing a media record.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMediaRequest {
    #[serde(default)]
    pub folder: Option<Folder>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(default)]
    pub animation_type: Option<AnimationKind>,
    #[serde(default)]
    pub animation_duration: Option<u64>,
}

/// Request body for the visibility toggle.
#[derive(Debug, Clone, Deserialize)]
pub struct VisibilityRequest {
    pub hidden: bool,
}

/// Request body for moving a record to another folder.
#[derive(Debug, Clone, Deserialize)]
pub struct FolderMoveRequest {
    pub folder: Folder,
}

/// Per-folder counters for the admin overview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderStats {
    pub folder: Folder,
    pub total: usize,
    pub images: usize,
    pub videos: usize,
}

impl FolderStats {
    /// Count records per folder; every folder is listed, empty ones included.
    pub fn collect(records: &[MediaRecord]) -> Vec<FolderStats> {
        Folder::EVERY
            .iter()
            .map(|folder| {
                let in_folder: Vec<&MediaRecord> =
                    records.iter().filter(|r| r.folder == *folder).collect();
                let videos = in_folder.iter().filter(|r| r.is_video()).count();
                FolderStats {
                    folder: *folder,
                    total: in_folder.len(),
                    images: in_folder.len() - videos,
                    videos,
                }
            })
            .collect()
    }
}

/// Records of one folder in an export.
#[derive(Debug, Clone, Serialize)]
pub struct FolderGroup {
    pub folder: Folder,
    pub media: Vec<MediaRecord>,
}

/// Catalog backup, grouped by folder in display order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogExport {
    pub exported_at: String,
    pub total: usize,
    pub folders: Vec<FolderGroup>,
}

impl CatalogExport {
    pub fn new(records: Vec<MediaRecord>, exported_at: String) -> Self {
        let total = records.len();
        let mut folders: Vec<FolderGroup> = Folder::EVERY
            .iter()
            .map(|folder| FolderGroup {
                folder: *folder,
                media: Vec::new(),
            })
            .collect();

        for record in records {
            if let Some(group) = folders.iter_mut().find(|g| g.folder == record.folder) {
                group.media.push(record);
            }
        }

        Self {
            exported_at,
            total,
            folders,
        }
    }
}

/// The whole catalog as seen by the player at one revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub revision_id: i64,
    pub media: Vec<MediaRecord>,
}
