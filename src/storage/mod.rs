//! Object storage for uploaded media.
//!
//! Objects live below a root directory, addressed by `<folder-slug>/<file-name>`,
//! and are served back under `/media/` by the HTTP router.

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::errors::AppError;
use crate::models::Folder;

/// URL path under which stored objects are served.
pub const MEDIA_ROUTE: &str = "/media";

/// A freshly written object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub file_name: String,
    pub key: String,
    pub url: String,
    pub size: i64,
}

/// Directory-backed media storage.
pub struct MediaStorage {
    root: PathBuf,
    public_url: String,
}

impl MediaStorage {
    /// Open (and create if needed) the storage root.
    pub async fn open(root: &Path, public_url: &str) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(root).await?;
        Ok(Self {
            root: root.to_path_buf(),
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an upload under a generated name in the folder's directory.
    pub async fn put(
        &self,
        folder: Folder,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredObject, AppError> {
        let file_name = generate_file_name(original_name);
        let key = format!("{}/{}", folder.slug(), file_name);
        let path = self.path_for(&key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!("Stored {} ({} bytes) as {}", original_name, bytes.len(), key);

        Ok(StoredObject {
            url: self.public_url(&key),
            file_name,
            key,
            size: bytes.len() as i64,
        })
    }

    /// Remove an object. A missing object is not an error.
    pub async fn remove(&self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}{}/{}", self.public_url, MEDIA_ROUTE, key)
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        if key.is_empty()
            || key.starts_with('/')
            || key.contains('\\')
            || key.split('/').any(|part| part == ".." || part.is_empty())
        {
            return Err(AppError::Validation(format!("Invalid storage key: {}", key)));
        }
        Ok(self.root.join(key))
    }
}

/// `<unix-millis>-<random>.<ext>`, keeping the original extension.
fn generate_file_name(original_name: &str) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    let stem = format!("{}-{}", Utc::now().timestamp_millis(), &random[..12]);

    match extension_of(original_name) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generated_name_keeps_extension() {
        let name = generate_file_name("Promo Natal.MP4");
        assert!(name.ends_with(".mp4"));
        assert!(!name.contains(' '));
    }

    #[test]
    fn test_generated_name_without_extension() {
        assert!(!generate_file_name("README").contains('.'));
        assert!(!generate_file_name("weird.ex t").contains('.'));
    }

    #[tokio::test]
    async fn test_put_and_remove() {
        let dir = TempDir::new().unwrap();
        let storage = MediaStorage::open(dir.path(), "http://signage.local/")
            .await
            .unwrap();

        let object = storage
            .put(Folder::Tuesday, "banner.png", b"png-bytes")
            .await
            .unwrap();

        assert!(object.key.starts_with("terca/"));
        assert_eq!(object.size, 9);
        assert_eq!(
            object.url,
            format!("http://signage.local/media/{}", object.key)
        );

        let on_disk = dir.path().join(&object.key);
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"png-bytes");

        storage.remove(&object.key).await.unwrap();
        assert!(!on_disk.exists());

        // Removing twice is fine
        storage.remove(&object.key).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = TempDir::new().unwrap();
        let storage = MediaStorage::open(dir.path(), "http://x").await.unwrap();

        assert!(storage.remove("../etc/passwd").await.is_err());
        assert!(storage.remove("/abs/path").await.is_err());
        assert!(storage.remove("todos//x").await.is_err());
    }
}
