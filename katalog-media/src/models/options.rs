//! Batch run options

use serde::{Deserialize, Serialize};

use super::OwnerScope;

/// Placeholder URL reported for every would-be success in a dry run
pub const DRY_RUN_URL: &str = "DRY_RUN_URL";

/// Largest accepted per-owner-kind limit
pub const MAX_LIMIT: u32 = 1000;

/// Options for one migration batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationOptions {
    /// Population(s) to scan
    pub owner_kind: OwnerScope,

    /// Max candidates per owner kind per run
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// HEAD-probe each URL before migrating it
    #[serde(default = "default_validate_urls")]
    pub validate_urls: bool,

    /// Report would-be outcomes without network, storage or catalog writes
    #[serde(default)]
    pub dry_run: bool,
}

fn default_limit() -> u32 {
    10
}

fn default_validate_urls() -> bool {
    true
}

impl MigrationOptions {
    pub fn new(owner_kind: OwnerScope) -> Self {
        Self {
            owner_kind,
            limit: default_limit(),
            validate_urls: default_validate_urls(),
            dry_run: false,
        }
    }

    /// Check option ranges before a run starts
    pub fn validate(&self) -> Result<(), String> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(format!("limit must be between 1 and {}", MAX_LIMIT));
        }
        Ok(())
    }
}
