//! API layer - HTTP handlers and routing
//!
//! Everything lives under `/api/v1`:
//! - Auth endpoints (login is the only public write)
//! - Classes, news + events and gallery sections
//! - Media bucket
//! - Sidebar navigation
//!
//! Uploaded files are served from the storage directory at the configured
//! public URL.

pub mod articles;
pub mod auth;
pub mod classes;
pub mod common;
pub mod gallery;
pub mod media;
pub mod middleware;
pub mod nav;
pub mod records;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// Build the `/api/v1` router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .nest("/classes", classes::router())
        .nest("/news-events", articles::router())
        .nest("/gallery", gallery::router())
        .nest("/media", media::router(state.config.storage.max_file_size))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .nest("/auth", auth::public_router())
        .nest("/nav", nav::router())
        .merge(protected_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let server = &state.config.server;
    let origin = server
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", server.cors_origin))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    let mut router = Router::new().nest("/api/v1", build_api_router(state.clone()));

    // Remote buckets serve their own files
    let storage = &state.config.storage;
    let mount = storage.public_url.trim_end_matches('/');
    if mount.starts_with('/') && mount.len() > 1 {
        router = router.nest_service(mount, ServeDir::new(&storage.path));
    }

    Ok(router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}
