//! Media API endpoints
//!
//! - GET /api/v1/media - every asset in the bucket as `{name, url}`
//! - POST /api/v1/media - multipart upload, field `file`
//! - DELETE /api/v1/media/{name}

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};

use super::middleware::{ApiError, AppState};
use crate::models::StorageAsset;

/// Multipart framing allowance on top of the configured file size
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(max_file_size: u64) -> Router<AppState> {
    let body_limit = usize::try_from(max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route(
            "/",
            get(list_assets)
                .post(upload)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/{name}", delete(delete_asset))
}

/// GET /api/v1/media
async fn list_assets(State(state): State<AppState>) -> Result<Json<Vec<StorageAsset>>, ApiError> {
    Ok(Json(state.media.list_assets().await?))
}

/// POST /api/v1/media
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_error(format!("Failed to read multipart: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation_error(format!("Failed to read file: {}", e)))?;

        let asset = state.media.upload(&content_type, &data).await?;
        return Ok((StatusCode::CREATED, Json(asset)));
    }

    Err(ApiError::validation_error("No file provided"))
}

/// DELETE /api/v1/media/{name}
async fn delete_asset(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.media.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
