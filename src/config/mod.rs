//! Configuration module for the signage backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Default upload ceiling: 200 MiB, enough for short signage videos.
const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Admin password (admin routes are open when unset)
    pub admin_password: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Root directory of the media object storage
    pub storage_path: PathBuf,
    /// Path to the local JSON cache file
    pub cache_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Base URL used when building public media URLs
    pub public_url: String,
    /// Maximum accepted request body for uploads
    pub max_upload_bytes: usize,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let admin_password = env::var("SIGNAGE_ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty());

        let db_path = env::var("SIGNAGE_DB_PATH")
            .unwrap_or_else(|_| "./data/signage.sqlite".to_string())
            .into();

        let storage_path = env::var("SIGNAGE_STORAGE_PATH")
            .unwrap_or_else(|_| "./data/media".to_string())
            .into();

        let cache_path = env::var("SIGNAGE_CACHE_PATH")
            .unwrap_or_else(|_| "./data/cache.json".to_string())
            .into();

        let bind_addr: SocketAddr = env::var("SIGNAGE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Validation(format!("Invalid SIGNAGE_BIND_ADDR: {}", e)))?;

        let public_url = env::var("SIGNAGE_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}", bind_addr))
            .trim_end_matches('/')
            .to_string();

        let max_upload_bytes = match env::var("SIGNAGE_MAX_UPLOAD_BYTES") {
            Ok(raw) => raw.parse().map_err(|e| {
                AppError::Validation(format!("Invalid SIGNAGE_MAX_UPLOAD_BYTES: {}", e))
            })?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let log_level = env::var("SIGNAGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            admin_password,
            db_path,
            storage_path,
            cache_path,
            bind_addr,
            public_url,
            max_upload_bytes,
            log_level,
        })
    }
}
