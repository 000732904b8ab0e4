//! Migration API handlers
//!
//! POST /migration/run, GET /migration/status, GET /migration/validate

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::time::Instant;

use crate::{
    error::{ApiError, ApiResult},
    models::{MigrationOptions, MigrationStats},
    services::{MigrationStatusReport, ValidationReport},
    AppState,
};

/// POST /migration/run response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMigrationResponse {
    pub success: bool,
    pub message: String,
    pub stats: MigrationStats,
    pub duration_ms: u64,
}

/// POST /migration/run
///
/// Runs one batch to completion. A second non-dry-run batch while one is
/// in progress is rejected with 409; dry runs never take the lock.
pub async fn run_migration(
    State(state): State<AppState>,
    Json(options): Json<MigrationOptions>,
) -> ApiResult<Json<RunMigrationResponse>> {
    options.validate().map_err(ApiError::BadRequest)?;

    let _guard = if options.dry_run {
        None
    } else {
        let guard = state
            .migration_lock
            .try_lock()
            .map_err(|_| ApiError::Conflict("Migration batch already running".to_string()))?;
        Some(guard)
    };

    let started = Instant::now();
    let stats = match state.orchestrator.run(&options).await {
        Ok(stats) => {
            *state.last_error.write().await = None;
            stats
        }
        Err(e) => {
            tracing::error!(error = %e, "Migration batch failed");
            *state.last_error.write().await = Some(format!("Migration failed: {}", e));
            return Err(e.into());
        }
    };

    let message = if options.dry_run {
        "Dry run completed"
    } else {
        "Migration completed"
    };

    Ok(Json(RunMigrationResponse {
        success: true,
        message: message.to_string(),
        stats,
        duration_ms: started.elapsed().as_millis() as u64,
    }))
}

/// GET /migration/status
pub async fn migration_status(
    State(state): State<AppState>,
) -> ApiResult<Json<MigrationStatusReport>> {
    Ok(Json(state.reporter.status().await?))
}

/// GET /migration/validate
pub async fn validate_migration(
    State(state): State<AppState>,
) -> ApiResult<Json<ValidationReport>> {
    Ok(Json(state.reporter.validate().await?))
}

pub fn migration_routes() -> Router<AppState> {
    Router::new()
        .route("/migration/run", post(run_migration))
        .route("/migration/status", get(migration_status))
        .route("/migration/validate", get(validate_migration))
}
