//! API Router
//! Mission: Wire handlers, auth layers and CORS into one service
//!
//! Layer order, outermost first: CORS, access log, authentication,
//! authorization, handler.

use crate::{
    auth::{api as auth_api, authenticate, authorize, AccessPolicy, AuthState, ServiceError},
    middleware::request_logging,
};
use anyhow::{Context, Result};
use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Create the API router
pub fn create_router(state: AuthState, cors_allowed_origin: &str) -> Result<Router> {
    let policy = Arc::new(AccessPolicy::standard());
    let cors = cors_layer(cors_allowed_origin)?;

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth_api::register))
        .route("/auth/login", post(auth_api::login))
        .route("/auth/refresh", post(auth_api::refresh))
        .route("/admin/get-all-users", get(auth_api::list_users))
        .route("/admin/get-user/:id", get(auth_api::get_user))
        .route("/admin/update/:id", put(auth_api::update_user))
        .route("/admin/delete/:id", delete(auth_api::delete_user))
        .route("/adminuser/get-profile", get(auth_api::get_profile))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(policy, authorize))
        .layer(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(middleware::from_fn(request_logging))
        .layer(cors)
        .with_state(state);

    Ok(router)
}

/// Single allowed origin, the four CRUD methods, bearer and JSON headers
fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(origin)
        .with_context(|| format!("Invalid CORS origin: {}", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]))
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn not_found() -> ServiceError {
    ServiceError::NotFound("No such endpoint".to_string())
}
