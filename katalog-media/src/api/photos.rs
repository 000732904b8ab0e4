//! DELETE /photos/:id

use axum::{
    extract::{Path, State},
    routing::delete,
    Json, Router,
};
use serde::Serialize;

use crate::{error::ApiResult, models::CanonicalPhoto, AppState};

#[derive(Debug, Serialize)]
pub struct DeletePhotoResponse {
    pub success: bool,
    pub message: String,
    pub photo: CanonicalPhoto,
}

pub async fn delete_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
) -> ApiResult<Json<DeletePhotoResponse>> {
    let photo = state.photo_removal.remove(photo_id).await?;

    Ok(Json(DeletePhotoResponse {
        success: true,
        message: "Photo deleted successfully".to_string(),
        photo,
    }))
}

pub fn photo_routes() -> Router<AppState> {
    Router::new().route("/photos/:id", delete(delete_photo))
}
