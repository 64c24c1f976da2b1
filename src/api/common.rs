//! Common API utilities and shared types

use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use super::middleware::ApiError;
use crate::models::ListParams;
use crate::services::{CategoryFilter, ViewQuery};

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size for section lists
pub fn default_per_page() -> u32 {
    20
}

/// Query string accepted by every list endpoint
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Free-text search over title, description and tags
    #[serde(default)]
    pub q: String,
    /// Category name or `All`
    pub category: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            q: String::new(),
            category: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

/// Malformed query strings get the JSON error envelope
impl<S: Send + Sync> FromRequestParts<S> for ListQuery {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<ListQuery>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::validation_error(e.body_text()))?;
        Ok(query)
    }
}

impl ListQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }

    pub fn view_query(&self) -> ViewQuery {
        ViewQuery::new(
            self.q.clone(),
            CategoryFilter::parse(self.category.as_deref()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let query: ListQuery = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(query.params(), ListParams::new(1, 20));
        assert_eq!(query.view_query().category, CategoryFilter::All);

        let query: ListQuery = serde_json::from_value(serde_json::json!({
            "q": "art",
            "category": "Events",
            "page": 0,
            "per_page": 1000
        }))
        .unwrap();
        assert_eq!(query.params(), ListParams::new(1, 100));
        assert_eq!(
            query.view_query().category,
            CategoryFilter::Only("Events".to_string())
        );
    }

    async fn extract(uri: &str) -> Result<ListQuery, ApiError> {
        let (mut parts, _) = axum::http::Request::builder()
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        ListQuery::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extractor_reads_query() {
        let query = extract("/?q=art&category=Daily%20Life&page=2").await.unwrap();
        assert_eq!(query.q, "art");
        assert_eq!(query.category.as_deref(), Some("Daily Life"));
        assert_eq!(query.params(), ListParams::new(2, 20));
    }

    #[tokio::test]
    async fn test_malformed_page_is_validation_error() {
        let err = extract("/?page=abc").await.unwrap_err();
        assert_eq!(err.error.code, "VALIDATION_ERROR");
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
