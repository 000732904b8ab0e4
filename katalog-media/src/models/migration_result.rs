//! Per-item migration outcomes and batch statistics

use serde::{Deserialize, Serialize};

use super::{id_string, MigratableEntity, OwnerKind};

/// Terminal state of one entity in a batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    /// Photo uploaded and recorded (or would be, in a dry run)
    Success,
    /// A stage failed; the batch continued
    Failed,
    /// Nothing to migrate for this entity
    Skipped,
}

/// Result for one candidate
///
/// `new_url` is present iff the status is `Success`; `error_message` iff
/// it is `Failed`. The constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationOutcome {
    #[serde(with = "id_string")]
    pub entity_id: i64,
    pub owner_kind: OwnerKind,
    pub display_name: String,
    pub original_url: String,
    pub status: MigrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl MigrationOutcome {
    fn base(entity: &MigratableEntity, status: MigrationStatus) -> Self {
        Self {
            entity_id: entity.id,
            owner_kind: entity.owner_kind,
            display_name: entity.display_name.clone(),
            original_url: entity.legacy_image_url.clone().unwrap_or_default(),
            status,
            new_url: None,
            error_message: None,
        }
    }

    pub fn success(entity: &MigratableEntity, new_url: impl Into<String>) -> Self {
        Self {
            new_url: Some(new_url.into()),
            ..Self::base(entity, MigrationStatus::Success)
        }
    }

    pub fn failed(entity: &MigratableEntity, error_message: impl Into<String>) -> Self {
        Self {
            error_message: Some(error_message.into()),
            ..Self::base(entity, MigrationStatus::Failed)
        }
    }

    pub fn skipped(entity: &MigratableEntity) -> Self {
        Self::base(entity, MigrationStatus::Skipped)
    }
}

/// Aggregate counters for one batch run
///
/// `total_processed == successful + failed + skipped == results.len()`
/// holds after every `record` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStats {
    total_processed: usize,
    successful: usize,
    failed: usize,
    skipped: usize,
    results: Vec<MigrationOutcome>,
}

impl MigrationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one outcome into the counters, preserving arrival order
    pub fn record(&mut self, outcome: MigrationOutcome) {
        self.total_processed += 1;
        match outcome.status {
            MigrationStatus::Success => self.successful += 1,
            MigrationStatus::Failed => self.failed += 1,
            MigrationStatus::Skipped => self.skipped += 1,
        }
        self.results.push(outcome);
    }

    pub fn total_processed(&self) -> usize {
        self.total_processed
    }

    pub fn successful(&self) -> usize {
        self.successful
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn results(&self) -> &[MigrationOutcome] {
        &self.results
    }
}
