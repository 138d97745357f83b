//! File-backed key/value cache.
//!
//! Mirrors the last known settings and catalog so a player can start with
//! something to show when the database is unreachable. Never authoritative.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

use crate::errors::AppError;

/// Key for the mirrored settings.
pub const SETTINGS_KEY: &str = "appSettings";
/// Key for the mirrored catalog snapshot.
pub const CATALOG_KEY: &str = "mediaCatalog";

/// JSON file holding a flat map of cached values.
pub struct LocalCache {
    path: PathBuf,
    entries: RwLock<HashMap<String, serde_json::Value>>,
}

impl LocalCache {
    /// Load the cache file. A missing or unreadable file starts empty.
    pub async fn open(path: &Path) -> Self {
        let entries = match tokio::fs::read(path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Ignoring corrupt cache file {:?}: {}", path, e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read cache file {:?}: {}", path, e);
                HashMap::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
        }
    }

    /// Read a value. Entries that no longer match the expected shape read as absent.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.entries.read().await;
        let value = entries.get(key)?.clone();
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Cached entry {} has an unexpected shape: {}", key, e);
                None
            }
        }
    }

    /// Store a value and persist the whole cache.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let value = serde_json::to_value(value)?;
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value);
        let bytes = serde_json::to_vec(&*entries)?;
        self.persist(&bytes).await
    }

    async fn persist(&self, bytes: &[u8]) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppSettings;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        let cache = LocalCache::open(&path).await;
        let settings = AppSettings {
            mute_videos: true,
            ..AppSettings::default()
        };
        cache.put(SETTINGS_KEY, &settings).await.unwrap();

        let reopened = LocalCache::open(&path).await;
        let loaded: AppSettings = reopened.get(SETTINGS_KEY).await.unwrap();
        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let cache = LocalCache::open(&path).await;
        assert!(cache.get::<AppSettings>(SETTINGS_KEY).await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_shape_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        let cache = LocalCache::open(&dir.path().join("cache.json")).await;
        cache.put(SETTINGS_KEY, &"just a string").await.unwrap();

        assert!(cache.get::<AppSettings>(SETTINGS_KEY).await.is_none());
    }
}
