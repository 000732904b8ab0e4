//! katalog-media - Legacy Media Migration service
//!
//! Default port: 5740

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use katalog_common::config::resolve_config_path;
use katalog_media::config::{MediaConfig, StorageBackend, CONFIG_ENV_VAR, CONFIG_FILE_NAME};
use katalog_media::db::{self, SqliteCatalog};
use katalog_media::services::{FilesystemObjectStore, GcsObjectStore, HttpImageFetcher, ObjectStore};
use katalog_media::AppState;

#[derive(Parser, Debug)]
#[command(name = "katalog-media")]
#[command(about = "Legacy main-photo migration service for the katalog catalog")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// SQLite catalog database
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR, CONFIG_FILE_NAME);
    let mut config = MediaConfig::load(config_path.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = Some(database);
    }
    config.validate()?;

    katalog_common::logging::init_tracing(&config.logging)?;

    info!("Starting katalog-media (Legacy Media Migration)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let db_path = config.database_path();
    info!("Database: {}", db_path.display());
    let pool = db::init_database_pool(&db_path)
        .await
        .context("Failed to open catalog database")?;

    let fetcher = HttpImageFetcher::new(config.fetch_timeout(), config.fetch.min_interval_ms)?;

    let (store, media_root): (Arc<dyn ObjectStore>, Option<PathBuf>) = match config.storage.backend {
        StorageBackend::Gcs => {
            let bucket = config.storage.bucket.clone().unwrap_or_default();
            info!("Object storage: GCS bucket {}", bucket);
            let store = GcsObjectStore::new(
                bucket,
                config.storage.access_token.clone(),
                config.storage.endpoint.clone(),
                config.storage.public_base_url.clone(),
                config.upload_timeout(),
            )?;
            (Arc::new(store), None)
        }
        StorageBackend::Filesystem => {
            let root = config.storage_root();
            std::fs::create_dir_all(&root)
                .with_context(|| format!("Failed to create storage root {}", root.display()))?;
            info!("Object storage: filesystem at {}", root.display());
            let store = FilesystemObjectStore::new(root.clone(), config.filesystem_base_url());
            (Arc::new(store), Some(root))
        }
    };

    let health = store.check_connection().await;
    if !(health.reachable && health.container_exists) {
        tracing::warn!(error = ?health.error, "Object storage is not ready; uploads will fail");
    }

    let mut state = AppState::new(Arc::new(SqliteCatalog::new(pool)), Arc::new(fetcher), store);
    if let Some(root) = media_root {
        state = state.with_media_root(root);
    }

    let app = katalog_media::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .context("Invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
