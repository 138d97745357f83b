//! Digital Signage Backend
//!
//! REST backend for the signage admin and upload screens, with SQLite
//! persistence, disk object storage and a server-side media rotation player.

mod api;
mod auth;
mod cache;
mod config;
mod db;
mod errors;
mod models;
mod player;
mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cache::{LocalCache, SETTINGS_KEY};
use config::Config;
use db::Repository;
use models::AppSettings;
use player::{spawn_player, MediaScheduler, PlayerHandle, PlayerSettings};
use storage::{MediaStorage, MEDIA_ROUTE};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub storage: Arc<MediaStorage>,
    pub player: PlayerHandle,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Digital Signage Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Storage path: {:?}", config.storage_path);
    tracing::info!("Cache path: {:?}", config.cache_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Warn if the admin password is not configured
    if config.admin_password.is_none() {
        tracing::warn!(
            "No admin password configured (SIGNAGE_ADMIN_PASSWORD). Admin routes are open!"
        );
    }

    let state = build_state(config.clone()).await?;

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Open the database, storage and cache, and start the player.
pub async fn build_state(config: Config) -> Result<AppState, Box<dyn std::error::Error>> {
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    let storage = Arc::new(MediaStorage::open(&config.storage_path, &config.public_url).await?);
    let cache = Arc::new(LocalCache::open(&config.cache_path).await);

    // Start with the stored cadence, or the cached one if the database is not answering
    let settings = match repo.get_settings().await {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Failed to read settings, using cached values: {}", e);
            cache
                .get::<AppSettings>(SETTINGS_KEY)
                .await
                .unwrap_or_default()
        }
    };
    let scheduler = MediaScheduler::new().with_settings(PlayerSettings::from(&settings));
    let player = spawn_player(Arc::clone(&repo), scheduler, Some(cache));

    Ok(AppState {
        repo,
        storage,
        player,
        config: Arc::new(config),
    })
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone the admin password for the auth layer
    let admin_password = state.config.admin_password.clone();

    // Player page and logins (no auth required)
    let public_routes = Router::new()
        .route("/settings", get(api::get_settings))
        .route("/player/now", get(api::now_playing))
        .route("/player/finished", post(api::media_finished))
        .route("/player/refresh", post(api::refresh_player))
        .route("/admin/login", post(api::admin_login))
        .route("/upload/login", post(api::client_login));

    let admin_routes = Router::new()
        // Clients
        .route("/admin/clients", get(api::list_clients))
        .route("/admin/clients", post(api::create_client))
        .route("/admin/clients/{id}", put(api::update_client))
        .route("/admin/clients/{id}", delete(api::delete_client))
        // Media
        .route("/admin/media", get(api::list_media))
        .route("/admin/media", post(api::upload_media))
        .route("/admin/media/{id}", put(api::update_media))
        .route("/admin/media/{id}", delete(api::delete_media))
        .route("/admin/media/{id}/visibility", put(api::set_media_visibility))
        .route("/admin/media/{id}/folder", put(api::move_media_folder))
        // Catalog overview
        .route("/admin/folders", get(api::folder_stats))
        .route("/admin/export", get(api::export_catalog))
        // Settings
        .route("/admin/settings", put(api::update_settings))
        .layer(middleware::from_fn(move |req, next| {
            auth::admin_auth_layer(admin_password.clone(), req, next)
        }));

    let upload_routes = Router::new()
        .route("/upload/media", get(api::list_client_media))
        .route("/upload/media", post(api::upload_client_media))
        .route("/upload/media/{id}", put(api::update_client_media))
        .route("/upload/media/{id}", delete(api::delete_client_media))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::client_auth_layer,
        ));

    let api_routes = public_routes.merge(admin_routes).merge(upload_routes);

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .nest_service(MEDIA_ROUTE, ServeDir::new(state.storage.root()))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
