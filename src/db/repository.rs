//! Database repository for CRUD operations.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    clamp_refresh_interval, generate_prefix, AnimationKind, AppSettings, CatalogSnapshot, Client, CreateClientRequest,
    Folder, MediaKind, MediaRecord, NewMediaRecord, Orientation, Theme, UpdateClientRequest,
    UpdateMediaRequest, UpdateSettingsRequest,
};
use crate::player::MediaCatalog;

const MEDIA_COLUMNS: &str = "id, original_name, file_name, file_type, file_size, folder, url, storage_key, hidden, animation_type, animation_duration, client_id, created_at, updated_at";

const CLIENT_COLUMNS: &str = "id, name, prefix, password, created_at, updated_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    /// Read the revision and the full media list in one transaction.
    pub async fn catalog_snapshot(&self) -> Result<CatalogSnapshot, AppError> {
        let mut tx = self.pool.begin().await?;

        let revision_id: i64 = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&mut *tx)
            .await?
            .get("revision_id");

        let rows = sqlx::query(&format!(
            "SELECT {} FROM media_files ORDER BY created_at DESC, rowid DESC",
            MEDIA_COLUMNS
        ))
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CatalogSnapshot {
            revision_id,
            media: rows.iter().filter_map(media_from_row).collect(),
        })
    }

    // ==================== CLIENT OPERATIONS ====================

    /// List all clients.
    pub async fn list_clients(&self) -> Result<Vec<Client>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM clients ORDER BY name",
            CLIENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(client_from_row).collect())
    }

    /// Get a client by ID.
    pub async fn get_client(&self, id: &str) -> Result<Option<Client>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM clients WHERE id = ?", CLIENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(client_from_row))
    }

    /// Clients whose name matches, ignoring case. Names are not unique.
    ///
    /// SQLite's `lower()` only folds ASCII, so names like `Açaí` are
    /// compared here instead.
    pub async fn find_clients_by_name(&self, name: &str) -> Result<Vec<Client>, AppError> {
        let wanted = name.trim().to_lowercase();
        let rows = sqlx::query(&format!(
            "SELECT {} FROM clients ORDER BY created_at",
            CLIENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(client_from_row)
            .filter(|c| c.name.trim().to_lowercase() == wanted)
            .collect())
    }

    /// Create a new client.
    pub async fn create_client(&self, request: &CreateClientRequest) -> Result<Client, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let name = request.name.trim().to_string();
        let prefix = request
            .prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| generate_prefix(&name));

        sqlx::query(
            "INSERT INTO clients (id, name, prefix, password, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&name)
        .bind(&prefix)
        .bind(&request.password)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(Client {
            id,
            name,
            prefix,
            password: request.password.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update a client. Absent fields keep their value.
    pub async fn update_client(
        &self,
        id: &str,
        request: &UpdateClientRequest,
    ) -> Result<Client, AppError> {
        let existing = self
            .get_client(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Client {} not found", id)))?;

        let now = Utc::now().to_rfc3339();
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(existing.name.as_str())
            .to_string();
        let prefix = request.prefix.clone().unwrap_or(existing.prefix);
        let password = request.password.clone().unwrap_or(existing.password);

        sqlx::query("UPDATE clients SET name = ?, prefix = ?, password = ?, updated_at = ? WHERE id = ?")
            .bind(&name)
            .bind(&prefix)
            .bind(&password)
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.increment_revision().await?;

        Ok(Client {
            id: id.to_string(),
            name,
            prefix,
            password,
            created_at: existing.created_at,
            updated_at: now,
        })
    }

    /// Delete a client, detaching the media it owned.
    pub async fn delete_client(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Client {} not found", id)));
        }

        sqlx::query("UPDATE media_files SET client_id = NULL WHERE client_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // ==================== MEDIA OPERATIONS ====================

    /// List media, newest first, optionally restricted to one folder.
    pub async fn list_media(&self, folder: Option<Folder>) -> Result<Vec<MediaRecord>, AppError> {
        let rows = match folder {
            Some(folder) => {
                sqlx::query(&format!(
                    "SELECT {} FROM media_files WHERE folder = ? ORDER BY created_at DESC, rowid DESC",
                    MEDIA_COLUMNS
                ))
                .bind(folder.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM media_files ORDER BY created_at DESC, rowid DESC",
                    MEDIA_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().filter_map(media_from_row).collect())
    }

    /// List the media owned by one client, newest first.
    pub async fn list_media_for_client(
        &self,
        client_id: &str,
    ) -> Result<Vec<MediaRecord>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM media_files WHERE client_id = ? ORDER BY created_at DESC, rowid DESC",
            MEDIA_COLUMNS
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().filter_map(media_from_row).collect())
    }

    /// Get a media record by ID.
    pub async fn get_media(&self, id: &str) -> Result<Option<MediaRecord>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM media_files WHERE id = ?",
            MEDIA_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(media_from_row))
    }

    /// Find a record with the same original name, folder and owner.
    pub async fn find_media_by_name(
        &self,
        folder: Folder,
        original_name: &str,
        client_id: Option<&str>,
    ) -> Result<Option<MediaRecord>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM media_files WHERE folder = ? AND original_name = ? AND client_id IS ? LIMIT 1",
            MEDIA_COLUMNS
        ))
        .bind(folder.as_str())
        .bind(original_name)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(media_from_row))
    }

    /// Insert a record for an object that is already in storage.
    pub async fn insert_media(&self, new: &NewMediaRecord) -> Result<MediaRecord, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(&format!(
            "INSERT INTO media_files ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)",
            MEDIA_COLUMNS
        ))
        .bind(&id)
        .bind(&new.original_name)
        .bind(&new.file_name)
        .bind(&new.file_type)
        .bind(new.file_size)
        .bind(new.folder.as_str())
        .bind(&new.url)
        .bind(&new.storage_key)
        .bind(new.animation_type.map(|a| a.as_str()))
        .bind(new.animation_duration.map(to_db_millis).transpose()?)
        .bind(&new.client_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(MediaRecord {
            id,
            original_name: new.original_name.clone(),
            file_name: new.file_name.clone(),
            file_type: new.file_type.clone(),
            kind: MediaKind::from_mime(&new.file_type),
            file_size: new.file_size,
            folder: new.folder,
            url: new.url.clone(),
            storage_key: new.storage_key.clone(),
            hidden: false,
            animation_type: new.animation_type,
            animation_duration: new.animation_duration,
            client_id: new.client_id.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Update folder, visibility or animation. Last write wins.
    pub async fn update_media(
        &self,
        id: &str,
        request: &UpdateMediaRequest,
    ) -> Result<MediaRecord, AppError> {
        let existing = self
            .get_media(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media {} not found", id)))?;

        if existing.is_video()
            && (request.animation_type.is_some() || request.animation_duration.is_some())
        {
            return Err(AppError::Validation(
                "Animation settings apply to images only".to_string(),
            ));
        }

        let now = Utc::now().to_rfc3339();
        let folder = request.folder.unwrap_or(existing.folder);
        let hidden = request.hidden.unwrap_or(existing.hidden);
        let animation_type = request.animation_type.or(existing.animation_type);
        let animation_duration = request.animation_duration.or(existing.animation_duration);

        sqlx::query(
            "UPDATE media_files SET folder = ?, hidden = ?, animation_type = ?, animation_duration = ?, updated_at = ? WHERE id = ?",
        )
        .bind(folder.as_str())
        .bind(hidden as i32)
        .bind(animation_type.map(|a| a.as_str()))
        .bind(animation_duration.map(to_db_millis).transpose()?)
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;

        Ok(MediaRecord {
            folder,
            hidden,
            animation_type,
            animation_duration,
            updated_at: now,
            ..existing
        })
    }

    /// Delete a media row. The stored object is the caller's concern.
    pub async fn delete_media(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM media_files WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Media {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== SETTINGS OPERATIONS ====================

    /// Read the settings row, creating it with defaults on first use.
    pub async fn get_settings(&self) -> Result<AppSettings, AppError> {
        let row = sqlx::query("SELECT * FROM system_settings WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(settings_from_row(&row)),
            None => {
                let defaults = AppSettings::default();
                self.write_settings(&defaults).await?;
                tracing::info!("Created default system settings");
                Ok(defaults)
            }
        }
    }

    /// Merge a partial update into the stored settings.
    pub async fn save_settings(
        &self,
        update: &UpdateSettingsRequest,
    ) -> Result<AppSettings, AppError> {
        let mut settings = self.get_settings().await?;
        settings.apply(update);
        self.write_settings(&settings).await?;
        self.increment_revision().await?;
        Ok(settings)
    }

    async fn write_settings(&self, s: &AppSettings) -> Result<(), AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"INSERT INTO system_settings (
                id, theme, show_marquee, marquee_text, show_footer, show_widgets,
                show_lottery, show_weather, show_news, lottery_api, weather_api, news_api,
                mute_videos, player_refresh_interval_ms, player_orientation, updated_at
            ) VALUES (1, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                theme = excluded.theme,
                show_marquee = excluded.show_marquee,
                marquee_text = excluded.marquee_text,
                show_footer = excluded.show_footer,
                show_widgets = excluded.show_widgets,
                show_lottery = excluded.show_lottery,
                show_weather = excluded.show_weather,
                show_news = excluded.show_news,
                lottery_api = excluded.lottery_api,
                weather_api = excluded.weather_api,
                news_api = excluded.news_api,
                mute_videos = excluded.mute_videos,
                player_refresh_interval_ms = excluded.player_refresh_interval_ms,
                player_orientation = excluded.player_orientation,
                updated_at = excluded.updated_at"#,
        )
        .bind(s.theme.as_str())
        .bind(s.show_marquee as i32)
        .bind(&s.marquee_text)
        .bind(s.show_footer as i32)
        .bind(s.show_widgets as i32)
        .bind(s.show_lottery as i32)
        .bind(s.show_weather as i32)
        .bind(s.show_news as i32)
        .bind(none_if_empty(&s.lottery_api_key))
        .bind(none_if_empty(&s.weather_api_key))
        .bind(&s.news_rss_feed)
        .bind(s.mute_videos as i32)
        .bind(to_db_millis(s.player_refresh_interval_ms)?)
        .bind(s.player_orientation.as_str())
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl MediaCatalog for Repository {
    async fn snapshot(&self) -> Result<CatalogSnapshot, AppError> {
        self.catalog_snapshot().await
    }

    async fn settings(&self) -> Result<AppSettings, AppError> {
        self.get_settings().await
    }
}

// Helper functions for row conversion

fn client_from_row(row: &sqlx::sqlite::SqliteRow) -> Client {
    Client {
        id: row.get("id"),
        name: row.get("name"),
        prefix: row.get("prefix"),
        password: row.get("password"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn media_from_row(row: &sqlx::sqlite::SqliteRow) -> Option<MediaRecord> {
    let id: String = row.get("id");
    let folder_str: String = row.get("folder");
    let Some(folder) = Folder::parse(&folder_str) else {
        tracing::warn!("Skipping media {} with unknown folder {:?}", id, folder_str);
        return None;
    };

    let file_type: String = row.get("file_type");
    let hidden: i32 = row.get("hidden");
    let animation_type: Option<String> = row.get("animation_type");
    let animation_duration: Option<i64> = row.get("animation_duration");

    Some(MediaRecord {
        id,
        original_name: row.get("original_name"),
        file_name: row.get("file_name"),
        kind: MediaKind::from_mime(&file_type),
        file_type,
        file_size: row.get("file_size"),
        folder,
        url: row.get("url"),
        storage_key: row.get("storage_key"),
        hidden: hidden != 0,
        animation_type: animation_type.map(|a| AnimationKind::parse_or_fade(&a)),
        animation_duration: animation_duration.map(from_db_millis),
        client_id: row.get("client_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn settings_from_row(row: &sqlx::sqlite::SqliteRow) -> AppSettings {
    let defaults = AppSettings::default();
    let theme: String = row.get("theme");
    let orientation: String = row.get("player_orientation");
    let lottery_api: Option<String> = row.get("lottery_api");
    let weather_api: Option<String> = row.get("weather_api");
    let news_api: Option<String> = row.get("news_api");
    let refresh: i64 = row.get("player_refresh_interval_ms");

    AppSettings {
        theme: Theme::parse_or_dark(&theme),
        show_marquee: row.get::<i32, _>("show_marquee") != 0,
        marquee_text: row.get("marquee_text"),
        show_footer: row.get::<i32, _>("show_footer") != 0,
        show_widgets: row.get::<i32, _>("show_widgets") != 0,
        show_lottery: row.get::<i32, _>("show_lottery") != 0,
        show_weather: row.get::<i32, _>("show_weather") != 0,
        show_news: row.get::<i32, _>("show_news") != 0,
        lottery_api_key: lottery_api.unwrap_or_default(),
        weather_api_key: weather_api.unwrap_or_default(),
        news_rss_feed: news_api.unwrap_or(defaults.news_rss_feed),
        mute_videos: row.get::<i32, _>("mute_videos") != 0,
        player_refresh_interval_ms: clamp_refresh_interval(from_db_millis(refresh)),
        player_orientation: Orientation::parse_or_landscape(&orientation),
    }
}

/// Millisecond counts are stored as SQLite INTEGER, which is signed.
fn to_db_millis(ms: u64) -> Result<i64, AppError> {
    i64::try_from(ms).map_err(|_| AppError::Validation(format!("{} ms is out of range", ms)))
}

fn from_db_millis(ms: i64) -> u64 {
    u64::try_from(ms).unwrap_or(0)
}

fn none_if_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
