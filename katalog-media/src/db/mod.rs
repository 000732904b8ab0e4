//! Catalog database access
//!
//! The catalog tables belong to the admin application; this service only
//! reads entities and writes photo rows. `init_tables` creates them when
//! missing so a fresh database (and the test suite) can run standalone.

pub mod catalog;

pub use catalog::{CatalogRepository, OwnerSummary, PhotoSample, RepositoryError, SqliteCatalog};

use katalog_common::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create catalog tables if they don't exist
///
/// `foto_produk` enforces exactly one owner per row, and at most one main
/// photo (position 0) per owner.
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS produk (
            id_produk INTEGER PRIMARY KEY AUTOINCREMENT,
            nama_produk TEXT NOT NULL,
            foto_utama TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS paket_produk (
            id_paket INTEGER PRIMARY KEY AUTOINCREMENT,
            nama_paket TEXT NOT NULL,
            foto_utama TEXT,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS foto_produk (
            id_foto INTEGER PRIMARY KEY AUTOINCREMENT,
            produk_id INTEGER REFERENCES produk(id_produk) ON DELETE CASCADE,
            paket_id INTEGER REFERENCES paket_produk(id_paket) ON DELETE CASCADE,
            url_foto TEXT NOT NULL,
            alt_text TEXT NOT NULL DEFAULT '',
            urutan INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%f', 'now')),
            CHECK ((produk_id IS NULL) <> (paket_id IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_foto_produk_main_produk
         ON foto_produk(produk_id) WHERE urutan = 0 AND produk_id IS NOT NULL",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_foto_produk_main_paket
         ON foto_produk(paket_id) WHERE urutan = 0 AND paket_id IS NOT NULL",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (produk, paket_produk, foto_produk)");

    Ok(())
}
