//! Migration progress and post-migration validation reports

use serde::Serialize;
use std::sync::Arc;

use crate::db::{CatalogRepository, PhotoSample, RepositoryError};
use crate::models::{OwnerKind, MAIN_PHOTO_POSITION};

/// Records sampled per owner kind by `validate`
pub const SAMPLE_SIZE: u32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub single: u64,
    pub bundle: u64,
    pub total: u64,
}

impl KindCounts {
    fn new(single: u64, bundle: u64) -> Self {
        Self {
            single,
            bundle,
            total: single + bundle,
        }
    }
}

/// Remaining vs. completed work
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatusReport {
    pub need_migration: KindCounts,
    pub already_migrated: KindCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigratedPhotoCounts {
    pub total_migrated_photos: u64,
    pub single_photos_count: u64,
    pub bundle_photos_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationChecks {
    pub single_relations_work: bool,
    pub bundle_relations_work: bool,
    pub all_photos_have_correct_position: bool,
}

/// Spot check of migrated records
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub migration_stats: MigratedPhotoCounts,
    pub sample_single_photos: Vec<PhotoSample>,
    pub sample_bundle_photos: Vec<PhotoSample>,
    pub validation: ValidationChecks,
}

pub struct StatusReporter {
    catalog: Arc<dyn CatalogRepository>,
}

impl StatusReporter {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    pub async fn status(&self) -> Result<MigrationStatusReport, RepositoryError> {
        let need_single = self.catalog.count_candidates(OwnerKind::Single).await?;
        let need_bundle = self.catalog.count_candidates(OwnerKind::Bundle).await?;
        let done_single = self.catalog.count_migrated(OwnerKind::Single).await?;
        let done_bundle = self.catalog.count_migrated(OwnerKind::Bundle).await?;

        Ok(MigrationStatusReport {
            need_migration: KindCounts::new(need_single, need_bundle),
            already_migrated: KindCounts::new(done_single, done_bundle),
        })
    }

    /// Sample migrated records and check owner back-references and positions
    ///
    /// Checks over an empty sample pass.
    pub async fn validate(&self) -> Result<ValidationReport, RepositoryError> {
        let single_count = self.catalog.count_migrated(OwnerKind::Single).await?;
        let bundle_count = self.catalog.count_migrated(OwnerKind::Bundle).await?;

        let singles = self
            .catalog
            .sample_migrated_photos(OwnerKind::Single, SAMPLE_SIZE)
            .await?;
        let bundles = self
            .catalog
            .sample_migrated_photos(OwnerKind::Bundle, SAMPLE_SIZE)
            .await?;

        let validation = ValidationChecks {
            single_relations_work: relations_resolve(&singles, OwnerKind::Single),
            bundle_relations_work: relations_resolve(&bundles, OwnerKind::Bundle),
            all_photos_have_correct_position: singles
                .iter()
                .chain(&bundles)
                .all(|s| s.photo.position == MAIN_PHOTO_POSITION),
        };

        if !(validation.single_relations_work
            && validation.bundle_relations_work
            && validation.all_photos_have_correct_position)
        {
            tracing::warn!(?validation, "Migrated photo validation found problems");
        }

        Ok(ValidationReport {
            migration_stats: MigratedPhotoCounts {
                total_migrated_photos: single_count + bundle_count,
                single_photos_count: single_count,
                bundle_photos_count: bundle_count,
            },
            sample_single_photos: singles,
            sample_bundle_photos: bundles,
            validation,
        })
    }
}

fn relations_resolve(samples: &[PhotoSample], kind: OwnerKind) -> bool {
    samples.iter().all(|s| {
        s.photo.owner().kind() == kind
            && s.owner
                .as_ref()
                .is_some_and(|owner| owner.id == s.photo.owner().id())
    })
}
