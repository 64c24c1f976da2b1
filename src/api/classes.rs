//! Class API endpoints
//!
//! - GET/POST /api/v1/classes
//! - GET/PUT/DELETE /api/v1/classes/{id}
//! - GET/PUT /api/v1/classes/{id}/editor - editor addressed by slug
//! - POST /api/v1/classes/{id}/gallery-images - toggle one gallery image
//! - POST /api/v1/classes/{id}/items/{list} - append a daily-life or activity item
//! - PUT/DELETE /api/v1/classes/{id}/items/{list}/{index}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::middleware::{ApiError, AppState};
use super::records::{self, Resource};
use crate::models::class::ItemList;
use crate::models::nav::section_for;
use crate::models::{ClassRecord, Fields, ListItem};
use crate::services::{Record, Section};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(records::list::<ClassRecord>).post(records::create::<ClassRecord>),
        )
        .route(
            "/{id}",
            get(records::get::<ClassRecord>)
                .put(records::update::<ClassRecord>)
                .delete(records::delete::<ClassRecord>),
        )
        .route("/{id}/editor", get(open_editor).put(save_editor))
        .route("/{id}/gallery-images", post(toggle_gallery_image))
        .route("/{id}/items/{list}", post(add_item))
        .route("/{id}/items/{list}/{index}", put(set_item).delete(remove_item))
}

#[derive(Debug, Serialize)]
pub struct EditorResponse {
    /// False when the class is a draft seeded from the slug
    pub exists: bool,
    /// Page of the class under the sidebar's Classes section
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub class: ClassRecord,
}

impl EditorResponse {
    fn new(exists: bool, class: ClassRecord) -> Self {
        Self {
            exists,
            path: section_for(ClassRecord::COLLECTION).map(|s| s.record_path(&class.id)),
            class,
        }
    }
}

/// Stored class or a draft named after the slug
async fn load_or_draft(state: &AppState, id: &str) -> Result<(bool, ClassRecord), ApiError> {
    Ok(match state.classes.find(id).await? {
        Some(class) => (true, class),
        None => (false, ClassRecord::from_slug(id)),
    })
}

/// GET /api/v1/classes/{id}/editor
async fn open_editor(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EditorResponse>, ApiError> {
    let (exists, class) = load_or_draft(&state, &id).await?;
    Ok(Json(EditorResponse::new(exists, class)))
}

/// PUT /api/v1/classes/{id}/editor - Merge the body into the class,
/// creating it under `id` when missing
async fn save_editor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Fields>,
) -> Result<Json<EditorResponse>, ApiError> {
    let (_, class) = load_or_draft(&state, &id).await?;
    let mut section = ClassRecord::section(&state);
    section.activate().await?;
    section.open_upsert(class)?;
    let saved = records::save_patch(&mut section, body).await?;
    Ok(Json(EditorResponse::new(true, saved)))
}

/// Open the class edit dialog and apply `change`.
///
/// `change` returns false when its target does not exist; the edit is then
/// dropped and `missing` is reported.
async fn edit_class(
    state: &AppState,
    id: &str,
    change: impl FnOnce(&mut ClassRecord) -> bool,
    missing: impl FnOnce() -> ApiError,
) -> Result<ClassRecord, ApiError> {
    let mut section: Section<ClassRecord> = ClassRecord::section(state);
    section.activate().await?;
    section.open_edit(id).await?;

    let mut applied = false;
    section.edit(|class| applied = change(class))?;
    if !applied {
        section.cancel_edit();
        return Err(missing());
    }
    Ok(section.save().await?)
}

#[derive(Debug, Deserialize)]
pub struct GalleryImageRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct GalleryImageResponse {
    /// Whether the image is selected after the toggle
    pub selected: bool,
    pub class: ClassRecord,
}

/// POST /api/v1/classes/{id}/gallery-images - Select the image, or
/// deselect it when already selected
async fn toggle_gallery_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<GalleryImageRequest>,
) -> Result<Json<GalleryImageResponse>, ApiError> {
    let mut selected = false;
    let class = edit_class(
        &state,
        &id,
        |class| {
            selected = class.toggle_gallery_image(&body.url);
            true
        },
        || ApiError::internal_error("Gallery toggle was not applied"),
    )
    .await?;
    Ok(Json(GalleryImageResponse { selected, class }))
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub items: Vec<ListItem>,
}

fn item_not_found(list: ItemList, index: usize) -> ApiError {
    ApiError::not_found(format!("No {} item at index {}", list.as_str(), index))
}

/// POST /api/v1/classes/{id}/items/{list}
async fn add_item(
    State(state): State<AppState>,
    Path((id, list)): Path<(String, ItemList)>,
    Json(item): Json<ListItem>,
) -> Result<impl IntoResponse, ApiError> {
    let class = edit_class(
        &state,
        &id,
        |class| {
            let index = class.add_item(list);
            class.set_item(list, index, item)
        },
        || ApiError::internal_error("Item was not added"),
    )
    .await?;
    let items = class.items(list).to_vec();
    Ok((StatusCode::CREATED, Json(ItemsResponse { items })))
}

/// PUT /api/v1/classes/{id}/items/{list}/{index}
async fn set_item(
    State(state): State<AppState>,
    Path((id, list, index)): Path<(String, ItemList, usize)>,
    Json(item): Json<ListItem>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let class = edit_class(
        &state,
        &id,
        |class| class.set_item(list, index, item),
        || item_not_found(list, index),
    )
    .await?;
    Ok(Json(ItemsResponse {
        items: class.items(list).to_vec(),
    }))
}

/// DELETE /api/v1/classes/{id}/items/{list}/{index}
async fn remove_item(
    State(state): State<AppState>,
    Path((id, list, index)): Path<(String, ItemList, usize)>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let class = edit_class(
        &state,
        &id,
        |class| class.remove_item(list, index).is_some(),
        || item_not_found(list, index),
    )
    .await?;
    Ok(Json(ItemsResponse {
        items: class.items(list).to_vec(),
    }))
}
