//! News and events API endpoints
//!
//! - GET/POST/DELETE /api/v1/news-events
//! - POST /api/v1/news-events/populate
//! - GET/PUT/DELETE /api/v1/news-events/{id}
//! - PUT /api/v1/news-events/{id}/content - content editor

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
use crate::models::{ArticleRecord, Fields};
use crate::services::{populate_articles, ARTICLE_CONTENT_FIELDS};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(records::list::<ArticleRecord>)
                .post(records::create::<ArticleRecord>)
                .delete(delete_all),
        )
        .route("/populate", post(populate))
        .route(
            "/{id}",
            get(records::get::<ArticleRecord>)
                .put(records::update::<ArticleRecord>)
                .delete(records::delete::<ArticleRecord>),
        )
        .route("/{id}/content", put(save_content))
}

#[derive(Debug, Serialize)]
pub struct DeleteAllResponse {
    pub deleted: u64,
}

/// DELETE /api/v1/news-events - Remove every article
async fn delete_all(State(state): State<AppState>) -> Result<Json<DeleteAllResponse>, ApiError> {
    let mut section = ArticleRecord::section(&state);
    section.activate().await?;
    let deleted = section.delete_all().await?;
    Ok(Json(DeleteAllResponse { deleted }))
}

/// POST /api/v1/news-events/populate - Add the sample articles
async fn populate(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let created = populate_articles(&state.articles).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    /// Serialized rich-text blob
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub article: ArticleRecord,
    pub plain_text: String,
}

/// PUT /api/v1/news-events/{id}/content - Save only the article body
async fn save_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ContentRequest>,
) -> Result<Json<ContentResponse>, ApiError> {
    let mut section = ArticleRecord::section(&state);
    section.activate().await?;
    section.open_edit_with(&id, ARTICLE_CONTENT_FIELDS).await?;

    let mut patch = Fields::new();
    patch.insert("content".to_string(), body.content.into());
    let article = records::save_patch(&mut section, patch).await?;
    Ok(Json(ContentResponse {
        plain_text: article.plain_text(),
        article,
    }))
}
