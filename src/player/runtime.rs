//! The player task: a periodic catalog refresh and event-driven playback.
//!
//! Catalog fetches run in their own tasks and report back over the command
//! channel, so a slow database never delays a completion signal.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};

use crate::cache::{LocalCache, CATALOG_KEY, SETTINGS_KEY};
use crate::errors::AppError;
use crate::models::{AppSettings, CatalogSnapshot};

use super::renderer::DisplayTimer;
use super::scheduler::{fetch_update, CatalogUpdate, MediaCatalog, MediaScheduler, NowShowing};

const COMMAND_BUFFER: usize = 32;

enum PlayerCommand {
    Refresh,
    Fetched(Result<CatalogUpdate, AppError>),
}

/// Cloneable handle to a running player. The player stops when the last
/// handle is dropped.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
    finished: mpsc::Sender<u64>,
    now: watch::Receiver<Option<NowShowing>>,
}

impl PlayerHandle {
    pub fn now_showing(&self) -> Option<NowShowing> {
        self.now.borrow().clone()
    }

    /// Watch the record on screen change.
    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<Option<NowShowing>> {
        self.now.clone()
    }

    /// Report that a record finished (video "ended", or a display-side timer).
    pub async fn media_finished(&self, playback_id: u64) -> Result<(), AppError> {
        self.finished
            .send(playback_id)
            .await
            .map_err(|_| AppError::Internal("Player is not running".to_string()))
    }

    /// Poll the catalog now instead of waiting for the next tick.
    pub async fn refresh(&self) -> Result<(), AppError> {
        self.commands
            .send(PlayerCommand::Refresh)
            .await
            .map_err(|_| AppError::Internal("Player is not running".to_string()))
    }
}

/// Spawn the player loop on the current runtime.
pub fn spawn_player<C: MediaCatalog>(
    catalog: Arc<C>,
    scheduler: MediaScheduler,
    cache: Option<Arc<LocalCache>>,
) -> PlayerHandle {
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
    let (finished_tx, finished_rx) = mpsc::channel(COMMAND_BUFFER);
    let (now_tx, now_rx) = watch::channel(None);

    let player = PlayerLoop {
        catalog,
        scheduler,
        cache,
        commands_tx: commands_tx.clone(),
        finished_tx: finished_tx.clone(),
        now_tx,
        timer: None,
    };
    tokio::spawn(player.run(commands_rx, finished_rx));

    PlayerHandle {
        commands: commands_tx,
        finished: finished_tx,
        now: now_rx,
    }
}

struct PlayerLoop<C> {
    catalog: Arc<C>,
    scheduler: MediaScheduler,
    cache: Option<Arc<LocalCache>>,
    commands_tx: mpsc::Sender<PlayerCommand>,
    finished_tx: mpsc::Sender<u64>,
    now_tx: watch::Sender<Option<NowShowing>>,
    timer: Option<DisplayTimer>,
}

impl<C: MediaCatalog> PlayerLoop<C> {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<PlayerCommand>,
        mut finished: mpsc::Receiver<u64>,
    ) {
        let mut period = self.scheduler.refresh_interval();
        let mut ticker = refresh_ticker(interval(period));
        tracing::info!("Player started, refreshing every {:?}", period);

        loop {
            tokio::select! {
                _ = self.now_tx.closed() => {
                    tracing::info!("Player stopped");
                    break;
                }
                _ = ticker.tick() => self.spawn_fetch(),
                Some(command) = commands.recv() => match command {
                    PlayerCommand::Refresh => self.spawn_fetch(),
                    PlayerCommand::Fetched(result) => {
                        self.on_fetched(result).await;

                        let wanted = self.scheduler.refresh_interval();
                        if wanted != period {
                            period = wanted;
                            ticker = refresh_ticker(interval_at(Instant::now() + period, period));
                            tracing::info!("Refresh interval is now {:?}", period);
                        }
                    }
                },
                Some(playback_id) = finished.recv() => {
                    if self.scheduler.on_media_finished(playback_id) {
                        self.publish();
                    }
                }
            }
        }
    }

    fn spawn_fetch(&self) {
        let catalog = Arc::clone(&self.catalog);
        let done = self.commands_tx.clone();
        tokio::spawn(async move {
            let result = fetch_update(catalog.as_ref()).await;
            let _ = done.send(PlayerCommand::Fetched(result)).await;
        });
    }

    async fn on_fetched(&mut self, result: Result<CatalogUpdate, AppError>) {
        match result {
            Ok(update) => {
                if !self.scheduler.apply_update(update.clone()) {
                    return;
                }
                self.mirror(&update).await;
                if self.scheduler.start_if_idle() {
                    self.publish();
                }
            }
            Err(e) => {
                tracing::warn!("Catalog refresh failed, keeping current list: {}", e);
                if !self.scheduler.has_applied() {
                    self.load_fallback().await;
                }
            }
        }
    }

    /// Keep the local cache in step with the last good poll.
    async fn mirror(&self, update: &CatalogUpdate) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(e) = cache.put(CATALOG_KEY, &update.snapshot).await {
            tracing::warn!("Failed to cache catalog: {}", e);
        }
        if let Some(settings) = &update.settings {
            if let Err(e) = cache.put(SETTINGS_KEY, settings).await {
                tracing::warn!("Failed to cache settings: {}", e);
            }
        }
    }

    async fn load_fallback(&mut self) {
        let Some(cache) = &self.cache else {
            return;
        };
        let Some(snapshot) = cache.get::<CatalogSnapshot>(CATALOG_KEY).await else {
            return;
        };
        let settings = cache.get::<AppSettings>(SETTINGS_KEY).await;

        tracing::info!(
            "Starting from cached catalog revision {} ({} records)",
            snapshot.revision_id,
            snapshot.media.len()
        );
        self.scheduler
            .apply_fallback(CatalogUpdate { snapshot, settings });
        if self.scheduler.start_if_idle() {
            self.publish();
        }
    }

    /// Publish the record on screen and re-arm the image timer.
    fn publish(&mut self) {
        let now = self.scheduler.now_showing().cloned();
        self.timer = now
            .as_ref()
            .and_then(|n| DisplayTimer::for_showing(n, &self.finished_tx));
        self.now_tx.send_replace(now);
    }
}

fn refresh_ticker(mut ticker: Interval) -> Interval {
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::record;
    use crate::models::{Folder, MediaKind, MediaRecord};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// In-memory catalog with a switch to simulate an outage.
    struct FakeCatalog {
        snapshot: Mutex<CatalogSnapshot>,
        failing: AtomicBool,
        fetches: AtomicUsize,
    }

    impl FakeCatalog {
        fn new(media: Vec<MediaRecord>) -> Arc<Self> {
            Arc::new(Self {
                snapshot: Mutex::new(CatalogSnapshot {
                    revision_id: 1,
                    media,
                }),
                failing: AtomicBool::new(false),
                fetches: AtomicUsize::new(0),
            })
        }

        fn replace(&self, media: Vec<MediaRecord>) {
            let mut snapshot = self.snapshot.lock().unwrap();
            snapshot.revision_id += 1;
            snapshot.media = media;
        }
    }

    impl MediaCatalog for FakeCatalog {
        async fn snapshot(&self) -> Result<CatalogSnapshot, AppError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(AppError::Database("offline".to_string()));
            }
            Ok(self.snapshot.lock().unwrap().clone())
        }

        async fn settings(&self) -> Result<AppSettings, AppError> {
            Ok(AppSettings::default())
        }
    }

    fn scheduler() -> MediaScheduler {
        MediaScheduler::new().with_day_source(|| chrono::Weekday::Mon)
    }

    async fn next_showing(rx: &mut watch::Receiver<Option<NowShowing>>) -> Option<NowShowing> {
        rx.changed().await.unwrap();
        rx.borrow_and_update().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_timer_then_video_ended() {
        let mut a = record("A", MediaKind::Image, Folder::All);
        a.animation_duration = Some(5000);
        let b = record("B", MediaKind::Video, Folder::All);

        let start = Instant::now();
        let catalog = FakeCatalog::new(vec![a, b]);
        let player = spawn_player(catalog, scheduler(), None);
        let mut rx = player.subscribe();

        let first = next_showing(&mut rx).await.unwrap();
        assert_eq!(first.media.id, "A");

        let second = next_showing(&mut rx).await.unwrap();
        assert_eq!(second.media.id, "B");
        assert!(start.elapsed() >= Duration::from_millis(5000));

        // The video only moves on when the display reports "ended"
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(player.now_showing().unwrap().media.id, "B");

        player.media_finished(second.playback_id).await.unwrap();
        let third = next_showing(&mut rx).await.unwrap();
        assert_eq!(third.media.id, "A");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_changes_only_next_selection() {
        let catalog = FakeCatalog::new(vec![
            record("A", MediaKind::Video, Folder::All),
            record("B", MediaKind::Video, Folder::All),
        ]);
        let player = spawn_player(catalog.clone(), scheduler(), None);
        let mut rx = player.subscribe();

        let first = next_showing(&mut rx).await.unwrap();
        assert_eq!(first.media.id, "A");

        catalog.replace(vec![record("C", MediaKind::Video, Folder::All)]);
        player.refresh().await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(player.now_showing().unwrap().media.id, "A");

        player.media_finished(first.playback_id).await.unwrap();
        assert_eq!(next_showing(&mut rx).await.unwrap().media.id, "C");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_finish_is_ignored() {
        let catalog = FakeCatalog::new(vec![
            record("A", MediaKind::Video, Folder::All),
            record("B", MediaKind::Video, Folder::All),
        ]);
        let player = spawn_player(catalog, scheduler(), None);
        let mut rx = player.subscribe();

        let first = next_showing(&mut rx).await.unwrap();
        player.media_finished(first.playback_id + 10).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(player.now_showing().unwrap().playback_id, first.playback_id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_retries_on_next_tick() {
        let catalog = FakeCatalog::new(vec![record("A", MediaKind::Video, Folder::All)]);
        catalog.failing.store(true, Ordering::SeqCst);

        let player = spawn_player(catalog.clone(), scheduler(), None);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(player.now_showing().is_none());
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 1);

        catalog.failing.store(false, Ordering::SeqCst);
        let mut rx = player.subscribe();
        let first = next_showing(&mut rx).await.unwrap();
        assert_eq!(first.media.id, "A");
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cached_catalog_used_when_first_fetch_fails() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(LocalCache::open(&dir.path().join("cache.json")).await);
        cache
            .put(
                CATALOG_KEY,
                &CatalogSnapshot {
                    revision_id: 9,
                    media: vec![record("cached", MediaKind::Video, Folder::All)],
                },
            )
            .await
            .unwrap();

        let catalog = FakeCatalog::new(Vec::new());
        catalog.failing.store(true, Ordering::SeqCst);

        let player = spawn_player(catalog, scheduler(), Some(cache));
        let mut rx = player.subscribe();
        assert_eq!(next_showing(&mut rx).await.unwrap().media.id, "cached");
    }

    #[tokio::test(start_paused = true)]
    async fn test_successful_refresh_is_mirrored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        let cache = Arc::new(LocalCache::open(&path).await);

        let catalog = FakeCatalog::new(vec![record("A", MediaKind::Video, Folder::All)]);
        let player = spawn_player(catalog, scheduler(), Some(cache));
        let mut rx = player.subscribe();
        next_showing(&mut rx).await;

        let reopened = LocalCache::open(&path).await;
        let snapshot: CatalogSnapshot = reopened.get(CATALOG_KEY).await.unwrap();
        assert_eq!(snapshot.media[0].id, "A");
        assert!(reopened.get::<AppSettings>(SETTINGS_KEY).await.is_some());
    }
}
