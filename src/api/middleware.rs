//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error envelope and its status mapping
//! - Session token validation

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    SqlxDocumentRepository, SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::models::{ArticleRecord, ClassRecord, GalleryItemRecord};
use crate::services::{
    CollectionGateway, GatewayError, MediaError, MediaResolver, SessionContext, UserService,
    UserServiceError,
};
use crate::storage::LocalObjectStore;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub config: Arc<Config>,
    pub user_service: Arc<UserService>,
    pub media: Arc<MediaResolver>,
    pub classes: CollectionGateway<ClassRecord>,
    pub articles: CollectionGateway<ArticleRecord>,
    pub gallery: CollectionGateway<GalleryItemRecord>,
}

impl AppState {
    /// Wire repositories and services over an already migrated pool
    pub fn new(pool: DynDatabasePool, config: Config) -> Self {
        let documents = SqlxDocumentRepository::boxed(pool.clone());
        let user_service = UserService::with_session_expiration(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            config.auth.session_expiration_days,
        );

        let storage = Arc::new(config.storage.clone());
        let store = Arc::new(LocalObjectStore::from_config(&storage));

        Self {
            pool,
            user_service: Arc::new(user_service),
            media: Arc::new(MediaResolver::new(store, storage)),
            classes: CollectionGateway::new(documents.clone()),
            articles: CollectionGateway::new(documents.clone()),
            gallery: CollectionGateway::new(documents),
            config: Arc::new(config),
        }
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new("TOO_MANY_REQUESTS", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "TOO_MANY_REQUESTS" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::NotFound { .. } => ApiError::not_found(e.to_string()),
            GatewayError::Validation(msg) => ApiError::validation_error(msg),
            GatewayError::Schema { .. } => {
                tracing::warn!("{}", e);
                ApiError::new("SCHEMA_ERROR", e.to_string())
            }
            GatewayError::Fetch { .. } => {
                tracing::error!("{}", e);
                ApiError::new("FETCH_ERROR", e.to_string())
            }
            GatewayError::Write { .. } => {
                tracing::error!("{}", e);
                ApiError::new("WRITE_ERROR", e.to_string())
            }
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Validation(msg) => ApiError::validation_error(msg),
            MediaError::NotFound(_) => ApiError::not_found(e.to_string()),
            MediaError::Storage(_) => {
                tracing::error!("{}", e);
                ApiError::internal_error(e.to_string())
            }
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::SessionExpired => ApiError::unauthorized(e.to_string()),
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::RateLimited => ApiError::too_many_requests(e.to_string()),
            UserServiceError::InternalError(_) => {
                tracing::error!("{}", e);
                ApiError::internal_error("Authentication backend failure")
            }
        }
    }
}

/// Session token from `Authorization: Bearer` or the `session` cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = headers.get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Authentication middleware.
///
/// Resolves the token into a [`SessionContext`] and stores it in the
/// request extensions for handlers to pick up.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(request.headers())
        .ok_or_else(|| ApiError::unauthorized("Missing authentication token"))?;

    let session = SessionContext::resume(state.user_service.clone(), &token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let headers = headers(header::AUTHORIZATION, "Bearer test-token-123");
        assert_eq!(extract_session_token(&headers), Some("test-token-123".to_string()));
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let headers = headers(header::COOKIE, "theme=dark; session=test-token-456");
        assert_eq!(extract_session_token(&headers), Some("test-token-456".to_string()));
    }

    #[test]
    fn test_extract_session_token_bearer_priority() {
        let mut headers = headers(header::AUTHORIZATION, "Bearer bearer-token");
        headers.insert(header::COOKIE, HeaderValue::from_static("session=cookie-token"));
        assert_eq!(extract_session_token(&headers), Some("bearer-token".to_string()));
    }

    #[test]
    fn test_extract_session_token_none() {
        assert!(extract_session_token(&HeaderMap::new()).is_none());
        let basic = headers(header::AUTHORIZATION, "Basic invalid");
        assert!(extract_session_token(&basic).is_none());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::unauthorized("x").status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::validation_error("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::too_many_requests("x").status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::new("WRITE_ERROR", "x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_gateway_error_conversion() {
        let not_found: ApiError = GatewayError::NotFound {
            collection: "classes",
            id: "abc".to_string(),
        }
        .into();
        assert_eq!(not_found.error.code, "NOT_FOUND");

        let invalid: ApiError =
            GatewayError::Validation("Please select at least one gallery image.".to_string()).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.error.message, "Please select at least one gallery image.");

        let write: ApiError = GatewayError::Write {
            collection: "gallery",
            source: anyhow::anyhow!("disk full"),
        }
        .into();
        assert_eq!(write.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_user_error_conversion() {
        let limited: ApiError = UserServiceError::RateLimited.into();
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

        let expired: ApiError = UserServiceError::SessionExpired.into();
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);
    }
}
