//! How a selected record is put on screen, and when it is done.
//!
//! Images are timed here: a [`DisplayTimer`] reports completion once its
//! duration elapses. Videos finish only when the display reports the native
//! "ended" event, so a video that never loads never finishes.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::models::{AnimationKind, MediaKind, MediaRecord, DEFAULT_IMAGE_DURATION_MS};

use super::NowShowing;

/// What the display should warm up before showing the record.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Preload {
    /// Fetch video metadata only.
    Metadata,
    /// Decode the image ahead of the transition.
    Decode,
}

/// Rendering instructions for one record.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub kind: MediaKind,
    /// Images only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_ms: Option<u64>,
    pub transition: AnimationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_class: Option<&'static str>,
    pub muted: bool,
    pub preload: Preload,
}

impl Presentation {
    pub fn for_media(media: &MediaRecord, mute_videos: bool) -> Self {
        let transition = media.animation_type.unwrap_or_default();

        match media.kind {
            MediaKind::Image => Self {
                kind: MediaKind::Image,
                display_ms: Some(
                    media
                        .animation_duration
                        .filter(|ms| *ms > 0)
                        .unwrap_or(DEFAULT_IMAGE_DURATION_MS),
                ),
                transition,
                transition_class: transition_class(transition),
                muted: false,
                preload: Preload::Decode,
            },
            MediaKind::Video => Self {
                kind: MediaKind::Video,
                display_ms: None,
                transition,
                transition_class: transition_class(transition),
                muted: mute_videos,
                preload: Preload::Metadata,
            },
        }
    }

    /// How long the record stays up on its own; `None` for videos.
    pub fn display_duration(&self) -> Option<Duration> {
        self.display_ms.map(Duration::from_millis)
    }
}

/// CSS animation class used by the player page.
pub fn transition_class(kind: AnimationKind) -> Option<&'static str> {
    match kind {
        AnimationKind::None => None,
        AnimationKind::Fade => Some("animate-fade-in"),
        AnimationKind::SlideLeft => Some("animate-slide-in-left"),
        AnimationKind::SlideRight => Some("animate-slide-in-right"),
        AnimationKind::Zoom => Some("animate-scale-in"),
        AnimationKind::Rotate => Some("animate-spin"),
    }
}

/// Image display timer. Sends the playback id once; dropping it cancels it.
pub struct DisplayTimer {
    handle: JoinHandle<()>,
}

impl DisplayTimer {
    /// Arm a timer for the record on screen, or `None` for videos.
    pub fn for_showing(now: &NowShowing, finished: &mpsc::Sender<u64>) -> Option<Self> {
        let after = now.presentation.display_duration()?;
        let playback_id = now.playback_id;
        let finished = finished.clone();

        tracing::debug!("Image {} will be shown for {:?}", now.media.id, after);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = finished.send(playback_id).await;
        });

        Some(Self { handle })
    }
}

impl Drop for DisplayTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
