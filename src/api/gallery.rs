//! Gallery API endpoints
//!
//! - GET/POST /api/v1/gallery
//! - GET /api/v1/gallery/stats
//! - GET/PUT/DELETE /api/v1/gallery/{id}

use axum::{extract::State, routing::get, Json, Router};

use super::middleware::{ApiError, AppState};
use super::records;
use crate::models::GalleryItemRecord;
use crate::services::GalleryStats;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(records::list::<GalleryItemRecord>).post(records::create::<GalleryItemRecord>),
        )
        .route("/stats", get(stats))
        .route(
            "/{id}",
            get(records::get::<GalleryItemRecord>)
                .put(records::update::<GalleryItemRecord>)
                .delete(records::delete::<GalleryItemRecord>),
        )
}

/// GET /api/v1/gallery/stats - Totals per category
async fn stats(State(state): State<AppState>) -> Result<Json<GalleryStats>, ApiError> {
    let items = state.gallery.list().await?;
    Ok(Json(GalleryStats::compute(&items)))
}
