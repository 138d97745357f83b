//! Media scheduler: applies catalog refreshes and advances the rotation.

use std::future::Future;
use std::time::Duration;

use chrono::Weekday;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{AppSettings, CatalogSnapshot, MediaRecord, DEFAULT_REFRESH_INTERVAL_MS};

use super::renderer::Presentation;
use super::rotation::RotationState;
use super::schedule;

/// Source of media records and player settings.
pub trait MediaCatalog: Send + Sync + 'static {
    fn snapshot(&self) -> impl Future<Output = Result<CatalogSnapshot, AppError>> + Send;

    fn settings(&self) -> impl Future<Output = Result<AppSettings, AppError>> + Send;
}

/// Result of one catalog poll.
#[derive(Debug, Clone)]
pub struct CatalogUpdate {
    pub snapshot: CatalogSnapshot,
    /// `None` when settings could not be read; the previous ones stay.
    pub settings: Option<AppSettings>,
}

/// Poll the catalog. Only the media fetch can fail the refresh.
pub async fn fetch_update<C: MediaCatalog>(catalog: &C) -> Result<CatalogUpdate, AppError> {
    let snapshot = catalog.snapshot().await?;
    let settings = match catalog.settings().await {
        Ok(settings) => Some(settings),
        Err(e) => {
            tracing::warn!("Failed to read player settings: {}", e);
            None
        }
    };
    Ok(CatalogUpdate { snapshot, settings })
}

/// The part of the settings the scheduler cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSettings {
    pub refresh_interval: Duration,
    pub mute_videos: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            mute_videos: false,
        }
    }
}

impl From<&AppSettings> for PlayerSettings {
    fn from(settings: &AppSettings) -> Self {
        Self {
            refresh_interval: settings.refresh_interval(),
            mute_videos: settings.mute_videos,
        }
    }
}

/// The record on screen and how to show it.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NowShowing {
    /// Increases with every published record; completion reports must echo it.
    pub playback_id: u64,
    pub position: usize,
    pub total: usize,
    pub media: MediaRecord,
    pub presentation: Presentation,
}

/// idle -> showing -> (finished) -> showing next.
pub struct MediaScheduler {
    rotation: RotationState,
    applied_revision: Option<i64>,
    settings: PlayerSettings,
    playback_seq: u64,
    now: Option<NowShowing>,
    day_source: fn() -> Weekday,
}

impl Default for MediaScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaScheduler {
    pub fn new() -> Self {
        Self {
            rotation: RotationState::new(),
            applied_revision: None,
            settings: PlayerSettings::default(),
            playback_seq: 0,
            now: None,
            day_source: schedule::today,
        }
    }

    /// Replace the clock used to decide which weekday folder is live.
    #[cfg(test)]
    pub fn with_day_source(mut self, day_source: fn() -> Weekday) -> Self {
        self.day_source = day_source;
        self
    }

    pub fn with_settings(mut self, settings: PlayerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Apply a polled catalog. Snapshots older than the last applied one are
    /// dropped; the record on screen is never interrupted.
    pub fn apply_update(&mut self, update: CatalogUpdate) -> bool {
        let revision = update.snapshot.revision_id;
        if let Some(applied) = self.applied_revision {
            if revision < applied {
                tracing::debug!(
                    "Ignoring stale catalog revision {} (applied {})",
                    revision,
                    applied
                );
                return false;
            }
        }

        self.applied_revision = Some(revision);
        self.load(update);
        true
    }

    /// Apply a cached catalog without recording its revision, so the first
    /// live refresh always wins.
    pub fn apply_fallback(&mut self, update: CatalogUpdate) {
        self.load(update);
    }

    fn load(&mut self, update: CatalogUpdate) {
        if let Some(settings) = &update.settings {
            self.settings = PlayerSettings::from(settings);
        }

        let total = update.snapshot.media.len();
        let day = (self.day_source)();
        self.rotation
            .replace_eligible(schedule::eligible_for(update.snapshot.media, day));

        tracing::info!(
            "Catalog revision {}: {} records, {} eligible for {}",
            update.snapshot.revision_id,
            total,
            self.rotation.eligible().len(),
            day
        );
    }

    /// Show the next eligible record, or nothing if the list is empty.
    pub fn advance(&mut self) -> Option<&NowShowing> {
        let total = self.rotation.eligible().len();
        let Some(media) = self.rotation.advance() else {
            if self.now.take().is_some() {
                tracing::info!("No media available, player is idle");
            }
            return None;
        };

        let media = media.clone();
        let position = self.rotation.position().unwrap_or_default();
        self.playback_seq += 1;

        tracing::info!(
            "Playing media {}/{}: {}",
            position + 1,
            total,
            media.original_name
        );

        self.now = Some(NowShowing {
            playback_id: self.playback_seq,
            position,
            total,
            presentation: Presentation::for_media(&media, self.settings.mute_videos),
            media,
        });
        self.now.as_ref()
    }

    /// Completion signal from the renderer. Only the record on screen can
    /// finish; anything else is a late or duplicate report.
    pub fn on_media_finished(&mut self, playback_id: u64) -> bool {
        match &self.now {
            Some(now) if now.playback_id == playback_id => {
                tracing::debug!("Media {} finished", now.media.id);
                self.advance();
                true
            }
            _ => {
                tracing::debug!("Ignoring finish for stale playback {}", playback_id);
                false
            }
        }
    }

    /// Start playback when idle and something became eligible.
    pub fn start_if_idle(&mut self) -> bool {
        if self.now.is_none() && !self.rotation.eligible().is_empty() {
            tracing::info!("Starting playback");
            self.advance();
            return true;
        }
        false
    }

    pub fn now_showing(&self) -> Option<&NowShowing> {
        self.now.as_ref()
    }

    pub fn has_applied(&self) -> bool {
        self.applied_revision.is_some()
    }

    pub fn refresh_interval(&self) -> Duration {
        self.settings.refresh_interval
    }
}
