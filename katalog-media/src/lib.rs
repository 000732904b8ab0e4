//! katalog-media library interface
//!
//! Migrates externally hosted legacy main photos of catalog items and
//! bundles into object storage, and exposes the batch over HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::db::CatalogRepository;
use crate::services::{
    ImageFetcher, MigrationOrchestrator, ObjectStore, PhotoRemoval, StatusReporter,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub orchestrator: Arc<MigrationOrchestrator>,
    pub reporter: Arc<StatusReporter>,
    pub photo_removal: Arc<PhotoRemoval>,
    /// Held for the duration of a non-dry-run batch
    pub migration_lock: Arc<Mutex<()>>,
    /// Directory served under `/media` (filesystem backend only)
    pub media_root: Option<PathBuf>,
    pub startup_time: DateTime<Utc>,
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        fetcher: Arc<dyn ImageFetcher>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            orchestrator: Arc::new(MigrationOrchestrator::new(
                catalog.clone(),
                fetcher,
                store.clone(),
            )),
            reporter: Arc::new(StatusReporter::new(catalog.clone())),
            photo_removal: Arc::new(PhotoRemoval::new(catalog, store.clone())),
            store,
            migration_lock: Arc::new(Mutex::new(())),
            media_root: None,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_media_root(mut self, root: PathBuf) -> Self {
        self.media_root = Some(root);
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(api::migration_routes())
        .merge(api::photo_routes())
        .merge(api::health_routes());

    if let Some(root) = &state.media_root {
        router = router.nest_service("/media", ServeDir::new(root));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
