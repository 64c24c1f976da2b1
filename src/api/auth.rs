//! Authentication API endpoints
//!
//! - POST /api/v1/auth/login - User login
//! - POST /api/v1/auth/logout - User logout
//! - GET /api/v1/auth/me - Get current user

use axum::{
    extract::{Extension, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::Identity;
use crate::services::SessionContext;

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for successful authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: Identity,
    pub token: String,
}

/// Build public auth routes (no auth required)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Build protected auth routes (requires auth middleware)
pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
}

fn session_cookie(token: &str, max_age_secs: i64) -> Result<HeaderValue, ApiError> {
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token, max_age_secs
    );
    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::internal_error(format!("Invalid session cookie: {}", e)))
}

/// POST /api/v1/auth/login
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session =
        SessionContext::sign_in(state.user_service.clone(), &body.email, &body.password).await?;

    let (user, token) = match (session.current_user(), session.token()) {
        (Some(user), Some(token)) => (user.clone(), token.to_string()),
        _ => return Err(ApiError::internal_error("Session was not established")),
    };

    let max_age = state.config.auth.session_expiration_days * 24 * 60 * 60;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie(&token, max_age)?);

    Ok((headers, Json(AuthResponse { user, token })))
}

/// POST /api/v1/auth/logout
async fn logout(Extension(mut session): Extension<SessionContext>) -> Result<impl IntoResponse, ApiError> {
    session.sign_out().await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, session_cookie("", 0)?);
    Ok((StatusCode::NO_CONTENT, headers))
}

/// GET /api/v1/auth/me
async fn get_current_user(
    Extension(session): Extension<SessionContext>,
) -> Result<Json<Identity>, ApiError> {
    session
        .current_user()
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::unauthorized("Not signed in"))
}
