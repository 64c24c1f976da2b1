//! Shared record endpoints
//!
//! One set of list/get/create/update/delete handlers, instantiated per
//! record kind through [`Resource`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

use super::common::ListQuery;
use super::middleware::{ApiError, AppState};
use crate::models::{ArticleRecord, ClassRecord, Fields, GalleryItemRecord, PagedResult};
use crate::services::{CollectionGateway, Record, Searchable, Section};

/// A record kind exposed over HTTP
pub trait Resource: Record + Searchable {
    fn gateway(state: &AppState) -> CollectionGateway<Self>;

    fn section(state: &AppState) -> Section<Self> {
        Section::new(Self::gateway(state))
    }

    /// Rewrite request bodies into the stored field shapes
    fn coerce(_fields: &mut Fields) {}
}

impl Resource for ClassRecord {
    fn gateway(state: &AppState) -> CollectionGateway<Self> {
        state.classes.clone()
    }

    fn section(state: &AppState) -> Section<Self> {
        Section::new(Self::gateway(state))
            .with_display_order(state.config.classes.display_order.clone())
    }
}

impl Resource for ArticleRecord {
    fn gateway(state: &AppState) -> CollectionGateway<Self> {
        state.articles.clone()
    }
}

impl Resource for GalleryItemRecord {
    fn gateway(state: &AppState) -> CollectionGateway<Self> {
        state.gallery.clone()
    }

    /// The edit form sends tags as one comma-separated string
    fn coerce(fields: &mut Fields) {
        if let Some(Value::String(raw)) = fields.get("tags") {
            let tags = crate::models::gallery::parse_tags(raw);
            fields.insert("tags".to_string(), Value::from(tags));
        }
    }
}

/// Decode a request body into a fresh record, ignoring any `id`
pub fn draft_from_body<R: Resource>(mut body: Fields) -> Result<R, ApiError> {
    body.remove("id");
    R::coerce(&mut body);
    serde_json::from_value(Value::Object(body))
        .map_err(|e| ApiError::validation_error(format!("Invalid record: {}", e)))
}

/// GET / - Filtered, ordered and paginated view of the collection
pub async fn list<R: Resource>(
    State(state): State<AppState>,
    query: ListQuery,
) -> Result<Json<PagedResult<R>>, ApiError> {
    let mut section = R::section(&state);
    section.activate().await?;

    let view_query = query.view_query();
    section.set_search(view_query.search);
    section.set_category(view_query.category);
    Ok(Json(section.view(&query.params())))
}

/// GET /{id}
pub async fn get<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<R>, ApiError> {
    Ok(Json(R::gateway(&state).get(&id).await?))
}

/// Apply `patch` to the section's open edit and save it.
///
/// A rejected patch closes the edit without writing anything.
pub async fn save_patch<R: Resource>(
    section: &mut Section<R>,
    patch: Fields,
) -> Result<R, ApiError> {
    if let Err(e) = section.apply_fields(patch) {
        section.cancel_edit();
        return Err(e.into());
    }
    Ok(section.save().await?)
}

/// POST / - Create a record; the store assigns its id
pub async fn create<R: Resource>(
    State(state): State<AppState>,
    Json(body): Json<Fields>,
) -> Result<impl IntoResponse, ApiError> {
    let draft: R = draft_from_body(body)?;
    let mut section = R::section(&state);
    section.activate().await?;
    section.open_create(draft)?;
    let created = section.save().await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /{id} - Write the edit dialog's fields back
pub async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut body): Json<Fields>,
) -> Result<Json<R>, ApiError> {
    R::coerce(&mut body);
    let mut section = R::section(&state);
    section.activate().await?;
    section.open_edit(&id).await?;
    Ok(Json(save_patch(&mut section, body).await?))
}

/// DELETE /{id}
pub async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let mut section = R::section(&state);
    section.activate().await?;
    section.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GalleryCategory;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_draft_ignores_id() {
        let draft: ArticleRecord =
            draft_from_body(fields(json!({"id": "forged", "title": "Picnic"}))).unwrap();
        assert!(draft.id.is_empty());
        assert_eq!(draft.title, "Picnic");
    }

    #[test]
    fn test_gallery_tags_from_string() {
        let draft: GalleryItemRecord = draft_from_body(fields(json!({
            "url": "/uploads/a.png",
            "category": "Daily Life",
            "tags": "art, outdoors"
        })))
        .unwrap();
        assert_eq!(draft.tags, vec!["art", "outdoors"]);
        assert_eq!(draft.category, GalleryCategory::DailyLife);
    }

    #[test]
    fn test_bad_category_is_validation_error() {
        let result: Result<ArticleRecord, _> =
            draft_from_body(fields(json!({"title": "x", "category": "Gossip"})));
        assert_eq!(result.unwrap_err().error.code, "VALIDATION_ERROR");
    }
}
