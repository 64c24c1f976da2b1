//! Navigation API endpoint
//!
//! - GET /api/v1/nav - the fixed sidebar

use axum::{routing::get, Json, Router};
use serde::Serialize;

use super::middleware::AppState;
use crate::models::{NavSection, NAV_SECTIONS};
use crate::models::nav::SITE_TITLE;

#[derive(Debug, Serialize)]
pub struct NavResponse {
    pub title: &'static str,
    pub sections: &'static [NavSection],
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_nav))
}

/// GET /api/v1/nav
async fn get_nav() -> Json<NavResponse> {
    Json(NavResponse {
        title: SITE_TITLE,
        sections: NAV_SECTIONS,
    })
}
