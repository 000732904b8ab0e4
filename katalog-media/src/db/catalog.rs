//! Catalog repository: migration candidates and photo records
//!
//! Both owner kinds live in their own table but share the `foto_produk`
//! photo table through one nullable foreign key column each. Every query
//! picks its table and columns from `owner_table(kind)`.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use crate::models::{
    id_string, CanonicalPhoto, MigratableEntity, OwnerKind, PhotoOwner, MAIN_PHOTO_POSITION,
};

/// Catalog repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{kind} {id} not found")]
    OwnerNotFound { kind: OwnerKind, id: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid catalog record: {0}")]
    InvalidRecord(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Migrated photo together with its resolved owner, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSample {
    #[serde(flatten)]
    pub photo: CanonicalPhoto,
    /// None when the owner back-reference does not resolve
    pub owner: Option<OwnerSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    #[serde(with = "id_string")]
    pub id: i64,
    pub display_name: String,
}

/// Catalog operations needed by the migration pipeline
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Entities with a non-blank legacy URL and no main photo, newest first
    async fn find_migration_candidates(
        &self,
        kind: OwnerKind,
        limit: u32,
    ) -> Result<Vec<MigratableEntity>, RepositoryError>;

    /// Insert a photo row owned by `entity_id`
    ///
    /// Does not deduplicate; callers rely on the candidate query.
    async fn create_photo(
        &self,
        kind: OwnerKind,
        entity_id: i64,
        url: &str,
        alt_text: &str,
        position: i32,
    ) -> Result<CanonicalPhoto, RepositoryError>;

    async fn count_candidates(&self, kind: OwnerKind) -> Result<u64, RepositoryError>;

    /// Photos at the main-photo position owned by `kind`
    async fn count_migrated(&self, kind: OwnerKind) -> Result<u64, RepositoryError>;

    async fn sample_migrated_photos(
        &self,
        kind: OwnerKind,
        limit: u32,
    ) -> Result<Vec<PhotoSample>, RepositoryError>;

    async fn find_photo(&self, photo_id: i64) -> Result<Option<CanonicalPhoto>, RepositoryError>;

    /// Returns false when no such photo existed
    async fn delete_photo(&self, photo_id: i64) -> Result<bool, RepositoryError>;
}

/// Table layout for one owner kind
struct OwnerTable {
    table: &'static str,
    id_column: &'static str,
    name_column: &'static str,
    /// Foreign key column in `foto_produk`
    photo_column: &'static str,
}

const SINGLE_TABLE: OwnerTable = OwnerTable {
    table: "produk",
    id_column: "id_produk",
    name_column: "nama_produk",
    photo_column: "produk_id",
};

const BUNDLE_TABLE: OwnerTable = OwnerTable {
    table: "paket_produk",
    id_column: "id_paket",
    name_column: "nama_paket",
    photo_column: "paket_id",
};

fn owner_table(kind: OwnerKind) -> &'static OwnerTable {
    match kind {
        OwnerKind::Single => &SINGLE_TABLE,
        OwnerKind::Bundle => &BUNDLE_TABLE,
    }
}

/// Shared candidate filter; `o` aliases the owner table.
/// Whitespace-only URLs are not candidates.
fn candidate_filter(t: &OwnerTable) -> String {
    format!(
        "o.foto_utama IS NOT NULL \
         AND TRIM(o.foto_utama, ' ' || char(9) || char(10) || char(13)) <> '' \
         AND NOT EXISTS (SELECT 1 FROM foto_produk f WHERE f.{photo} = o.{id} AND f.urutan = {main})",
        photo = t.photo_column,
        id = t.id_column,
        main = MAIN_PHOTO_POSITION,
    )
}

fn photo_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<CanonicalPhoto, RepositoryError> {
    let id: i64 = row.try_get("id_foto")?;
    CanonicalPhoto::new(
        id,
        row.try_get("produk_id")?,
        row.try_get("paket_id")?,
        row.try_get("url_foto")?,
        row.try_get("alt_text")?,
        row.try_get("urutan")?,
    )
    .map_err(|e| RepositoryError::InvalidRecord(format!("photo {}: {}", id, e)))
}

/// SQLite-backed catalog
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalog {
    async fn find_migration_candidates(
        &self,
        kind: OwnerKind,
        limit: u32,
    ) -> Result<Vec<MigratableEntity>, RepositoryError> {
        let t = owner_table(kind);
        let sql = format!(
            "SELECT o.{id} AS id, o.{name} AS name, o.foto_utama AS legacy_url \
             FROM {table} o WHERE {filter} \
             ORDER BY o.created_at DESC, o.{id} DESC LIMIT ?",
            id = t.id_column,
            name = t.name_column,
            table = t.table,
            filter = candidate_filter(t),
        );

        let rows = sqlx::query(&sql).bind(limit as i64).fetch_all(&self.pool).await?;

        let entities = rows
            .iter()
            .map(|row| -> Result<MigratableEntity, sqlx::Error> {
                Ok(MigratableEntity {
                    owner_kind: kind,
                    id: row.try_get("id")?,
                    display_name: row.try_get("name")?,
                    legacy_image_url: row.try_get("legacy_url")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(owner_kind = %kind, count = entities.len(), "Loaded migration candidates");
        Ok(entities)
    }

    async fn create_photo(
        &self,
        kind: OwnerKind,
        entity_id: i64,
        url: &str,
        alt_text: &str,
        position: i32,
    ) -> Result<CanonicalPhoto, RepositoryError> {
        let t = owner_table(kind);

        let owner_exists = sqlx::query(&format!(
            "SELECT 1 FROM {} WHERE {} = ?",
            t.table, t.id_column
        ))
        .bind(entity_id)
        .fetch_optional(&self.pool)
        .await?
        .is_some();

        if !owner_exists {
            return Err(RepositoryError::OwnerNotFound { kind, id: entity_id });
        }

        let result = sqlx::query(&format!(
            "INSERT INTO foto_produk ({}, url_foto, alt_text, urutan) VALUES (?, ?, ?, ?)",
            t.photo_column
        ))
        .bind(entity_id)
        .bind(url)
        .bind(alt_text)
        .bind(position)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => RepositoryError::Conflict(
                format!("{} {} already has a photo at position {}", kind, entity_id, position),
            ),
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                RepositoryError::OwnerNotFound { kind, id: entity_id }
            }
            other => RepositoryError::Database(other),
        })?;

        let photo = CanonicalPhoto::with_owner(
            result.last_insert_rowid(),
            PhotoOwner::new(kind, entity_id),
            url.to_string(),
            alt_text.to_string(),
            position,
        );

        tracing::debug!(
            photo_id = photo.id,
            owner_kind = %kind,
            entity_id = entity_id,
            position = position,
            "Created photo record"
        );
        Ok(photo)
    }

    async fn count_candidates(&self, kind: OwnerKind) -> Result<u64, RepositoryError> {
        let t = owner_table(kind);
        let sql = format!(
            "SELECT COUNT(*) FROM {table} o WHERE {filter}",
            table = t.table,
            filter = candidate_filter(t),
        );

        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn count_migrated(&self, kind: OwnerKind) -> Result<u64, RepositoryError> {
        let t = owner_table(kind);
        let sql = format!(
            "SELECT COUNT(*) FROM foto_produk WHERE {} IS NOT NULL AND urutan = ?",
            t.photo_column
        );

        let count: i64 = sqlx::query_scalar(&sql)
            .bind(MAIN_PHOTO_POSITION)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn sample_migrated_photos(
        &self,
        kind: OwnerKind,
        limit: u32,
    ) -> Result<Vec<PhotoSample>, RepositoryError> {
        let t = owner_table(kind);
        let sql = format!(
            "SELECT f.id_foto, f.produk_id, f.paket_id, f.url_foto, f.alt_text, f.urutan, \
                    o.{id} AS owner_id, o.{name} AS owner_name \
             FROM foto_produk f LEFT JOIN {table} o ON o.{id} = f.{photo} \
             WHERE f.{photo} IS NOT NULL AND f.urutan = ? \
             ORDER BY f.id_foto DESC LIMIT ?",
            id = t.id_column,
            name = t.name_column,
            table = t.table,
            photo = t.photo_column,
        );

        let rows = sqlx::query(&sql)
            .bind(MAIN_PHOTO_POSITION)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<PhotoSample, RepositoryError> {
                let owner_id: Option<i64> = row.try_get("owner_id")?;
                let owner_name: Option<String> = row.try_get("owner_name")?;
                let owner = owner_id.zip(owner_name).map(|(id, display_name)| OwnerSummary {
                    id,
                    display_name,
                });

                Ok(PhotoSample {
                    photo: photo_from_row(row)?,
                    owner,
                })
            })
            .collect()
    }

    async fn find_photo(&self, photo_id: i64) -> Result<Option<CanonicalPhoto>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id_foto, produk_id, paket_id, url_foto, alt_text, urutan \
             FROM foto_produk WHERE id_foto = ?",
        )
        .bind(photo_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(photo_from_row).transpose()
    }

    async fn delete_photo(&self, photo_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM foto_produk WHERE id_foto = ?")
            .bind(photo_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn catalog() -> SqliteCatalog {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        crate::db::init_tables(&pool).await.unwrap();
        SqliteCatalog::new(pool)
    }

    async fn insert_single(catalog: &SqliteCatalog, name: &str, url: Option<&str>, created_at: &str) -> i64 {
        sqlx::query("INSERT INTO produk (nama_produk, foto_utama, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(url)
            .bind(created_at)
            .execute(catalog.pool())
            .await
            .unwrap()
            .last_insert_rowid()
    }

    async fn insert_bundle(catalog: &SqliteCatalog, name: &str, url: Option<&str>) -> i64 {
        sqlx::query("INSERT INTO paket_produk (nama_paket, foto_utama) VALUES (?, ?)")
            .bind(name)
            .bind(url)
            .execute(catalog.pool())
            .await
            .unwrap()
            .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_candidates_exclude_empty_and_migrated() {
        let catalog = catalog().await;
        let old = insert_single(&catalog, "Old", Some("https://a/old.jpg"), "2024-01-01T00:00:00").await;
        let new = insert_single(&catalog, "New", Some("https://a/new.jpg"), "2024-06-01T00:00:00").await;
        insert_single(&catalog, "Null", None, "2024-03-01T00:00:00").await;
        insert_single(&catalog, "Empty", Some(""), "2024-03-01T00:00:00").await;
        let done = insert_single(&catalog, "Done", Some("https://a/done.jpg"), "2024-05-01T00:00:00").await;

        catalog
            .create_photo(OwnerKind::Single, done, "https://store/done.jpg", "Done - Main Photo", 0)
            .await
            .unwrap();

        let candidates = catalog.find_migration_candidates(OwnerKind::Single, 10).await.unwrap();
        let ids: Vec<i64> = candidates.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![new, old]);
        assert_eq!(catalog.count_candidates(OwnerKind::Single).await.unwrap(), 2);
        assert_eq!(catalog.count_migrated(OwnerKind::Single).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_url_is_not_a_candidate() {
        let catalog = catalog().await;
        insert_single(&catalog, "Spaces", Some("   "), "2024-06-01T00:00:00").await;
        insert_single(&catalog, "Tab", Some("\t\n"), "2024-05-01T00:00:00").await;
        let real = insert_single(&catalog, "Real", Some(" https://a/real.jpg "), "2024-01-01T00:00:00").await;

        let candidates = catalog.find_migration_candidates(OwnerKind::Single, 1).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, real);
        assert_eq!(catalog.count_candidates(OwnerKind::Single).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_gallery_photo_does_not_block_candidacy() {
        let catalog = catalog().await;
        let id = insert_bundle(&catalog, "Paket Hemat", Some("https://a/p.jpg")).await;

        catalog
            .create_photo(OwnerKind::Bundle, id, "https://store/gallery.jpg", "", 1)
            .await
            .unwrap();

        assert_eq!(catalog.count_candidates(OwnerKind::Bundle).await.unwrap(), 1);
        assert_eq!(catalog.count_migrated(OwnerKind::Bundle).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_limit_applies() {
        let catalog = catalog().await;
        for i in 0..5 {
            insert_bundle(&catalog, &format!("P{}", i), Some("https://a/p.jpg")).await;
        }

        let candidates = catalog.find_migration_candidates(OwnerKind::Bundle, 3).await.unwrap();
        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|c| c.owner_kind == OwnerKind::Bundle));
    }

    #[tokio::test]
    async fn test_create_photo_for_missing_owner() {
        let catalog = catalog().await;

        let result = catalog
            .create_photo(OwnerKind::Single, 999, "https://store/x.jpg", "x", 0)
            .await;
        assert!(matches!(
            result,
            Err(RepositoryError::OwnerNotFound { kind: OwnerKind::Single, id: 999 })
        ));
    }

    #[tokio::test]
    async fn test_second_main_photo_conflicts() {
        let catalog = catalog().await;
        let id = insert_single(&catalog, "Teh", Some("https://a/t.jpg"), "2024-01-01T00:00:00").await;

        catalog
            .create_photo(OwnerKind::Single, id, "https://store/1.jpg", "Teh - Main Photo", 0)
            .await
            .unwrap();
        let second = catalog
            .create_photo(OwnerKind::Single, id, "https://store/2.jpg", "Teh - Main Photo", 0)
            .await;

        assert!(matches!(second, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_samples_resolve_owner() {
        let catalog = catalog().await;
        let id = insert_bundle(&catalog, "Paket Keluarga", Some("https://a/k.jpg")).await;
        catalog
            .create_photo(OwnerKind::Bundle, id, "https://store/k.jpg", "Paket Keluarga - Main Photo", 0)
            .await
            .unwrap();

        let samples = catalog.sample_migrated_photos(OwnerKind::Bundle, 5).await.unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].photo.bundle_owner_id(), Some(id));
        assert_eq!(
            samples[0].owner,
            Some(OwnerSummary {
                id,
                display_name: "Paket Keluarga".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_find_and_delete_photo() {
        let catalog = catalog().await;
        let id = insert_single(&catalog, "Roti", Some("https://a/r.jpg"), "2024-01-01T00:00:00").await;
        let photo = catalog
            .create_photo(OwnerKind::Single, id, "https://store/r.jpg", "Roti - Main Photo", 0)
            .await
            .unwrap();

        assert_eq!(catalog.find_photo(photo.id).await.unwrap(), Some(photo.clone()));
        assert!(catalog.delete_photo(photo.id).await.unwrap());
        assert!(!catalog.delete_photo(photo.id).await.unwrap());
        assert_eq!(catalog.find_photo(photo.id).await.unwrap(), None);
    }
}
