//! Legacy main-photo migration
//!
//! Drives each candidate through probe → fetch → normalize → upload →
//! record. Candidates are processed one at a time in query order. A
//! failing stage ends that candidate as `Failed`; the batch carries on.
//!
//! Upload and catalog write are not atomic. When the catalog write fails
//! the uploaded object is deleted best-effort; a crash between the two
//! still leaves an orphaned object.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::{CatalogRepository, RepositoryError};
use crate::models::{
    MigratableEntity, MigrationOptions, MigrationOutcome, MigrationStats, DRY_RUN_URL,
    MAIN_PHOTO_POSITION,
};
use crate::services::image_fetcher::{FetchError, ImageFetcher};
use crate::services::image_normalizer::{normalize, NormalizationError, NormalizeProfile};
use crate::services::object_store::{migration_key, ObjectStore, StoreError};

/// Why a single candidate failed; becomes the outcome's error message
#[derive(Debug, Error)]
enum StageError {
    #[error("Invalid or inaccessible URL")]
    Inaccessible,

    #[error("Invalid URL format")]
    InvalidUrlFormat,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] RepositoryError),
}

/// Batch migration of legacy main-photo URLs into object storage
pub struct MigrationOrchestrator {
    catalog: Arc<dyn CatalogRepository>,
    fetcher: Arc<dyn ImageFetcher>,
    store: Arc<dyn ObjectStore>,
}

impl MigrationOrchestrator {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        fetcher: Arc<dyn ImageFetcher>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            store,
        }
    }

    /// Run one batch
    ///
    /// Only a failing candidate query aborts the batch; every per-item
    /// failure is recorded in the returned stats.
    pub async fn run(&self, options: &MigrationOptions) -> Result<MigrationStats, RepositoryError> {
        let mut stats = MigrationStats::new();

        info!(
            owner_kind = ?options.owner_kind,
            limit = options.limit,
            validate_urls = options.validate_urls,
            dry_run = options.dry_run,
            "Starting legacy photo migration"
        );

        for &kind in options.owner_kind.kinds() {
            let candidates = self.catalog.find_migration_candidates(kind, options.limit).await?;
            info!(owner_kind = %kind, count = candidates.len(), "Found migration candidates");

            for entity in &candidates {
                let outcome = self.migrate_one(entity, options).await;
                stats.record(outcome);
            }
        }

        info!(
            total = stats.total_processed(),
            successful = stats.successful(),
            failed = stats.failed(),
            skipped = stats.skipped(),
            dry_run = options.dry_run,
            "Legacy photo migration finished"
        );

        Ok(stats)
    }

    async fn migrate_one(&self, entity: &MigratableEntity, options: &MigrationOptions) -> MigrationOutcome {
        let Some(url) = entity.legacy_image_url() else {
            debug!(entity_id = entity.id, owner_kind = %entity.owner_kind, "No legacy URL, skipping");
            return MigrationOutcome::skipped(entity);
        };

        match self.run_stages(entity, url, options).await {
            Ok(new_url) => {
                info!(
                    entity_id = entity.id,
                    owner_kind = %entity.owner_kind,
                    new_url = %new_url,
                    "Migrated main photo"
                );
                MigrationOutcome::success(entity, new_url)
            }
            Err(e) => {
                warn!(
                    entity_id = entity.id,
                    owner_kind = %entity.owner_kind,
                    url = %url,
                    error = %e,
                    "Main photo migration failed"
                );
                MigrationOutcome::failed(entity, e.to_string())
            }
        }
    }

    async fn run_stages(
        &self,
        entity: &MigratableEntity,
        url: &str,
        options: &MigrationOptions,
    ) -> Result<String, StageError> {
        if options.validate_urls && !self.fetcher.probe_accessible(url).await {
            return Err(StageError::Inaccessible);
        }

        if options.dry_run {
            return Ok(DRY_RUN_URL.to_string());
        }

        if !url.starts_with("http") {
            return Err(StageError::InvalidUrlFormat);
        }

        let raw = self.fetcher.fetch_bytes(url).await?;

        let normalized = tokio::task::spawn_blocking(move || normalize(&raw, NormalizeProfile::Batch))
            .await
            .map_err(|e| NormalizationError::ProcessingFailed(e.to_string()))??;

        let key = migration_key(
            entity.owner_kind,
            entity.id,
            MAIN_PHOTO_POSITION,
            &normalized.content_type,
        );
        let new_url = self
            .store
            .upload(normalized.bytes, &key, &normalized.content_type)
            .await?;

        let recorded = self
            .catalog
            .create_photo(
                entity.owner_kind,
                entity.id,
                &new_url,
                &entity.main_photo_alt_text(),
                MAIN_PHOTO_POSITION,
            )
            .await;

        if let Err(e) = recorded {
            if let Err(cleanup) = self.store.delete(&key).await {
                warn!(key = %key, error = %cleanup, "Failed to remove object after catalog write failed");
            }
            return Err(e.into());
        }

        Ok(new_url)
    }
}
