//! Main entry point for the bookstore backend.
//!
//! This file initializes the Axum web server, sets up the database
//! connection, and registers all API routes and middleware. The JWT codec
//! and the sort-field synonym table are built once here and shared through
//! the application state.

mod api;
mod auth;
mod config;
mod database;
mod errors;
mod repositories;
mod services;
mod utils;

use std::sync::Arc;

use crate::api::common::ApiResponse;
use crate::services::book_filter::SortFieldMap;
use crate::utils::jwt::JwtCodec;
use axum::{Extension, Router, response::Json, routing::get};
use config::Config;
use database::Database;
use sqlx::SqlitePool;
use tracing::info;
use tracing_subscriber::fmt::init;

/// Shared, read-only application state. Set once at startup.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtCodec>,
    pub sort_fields: Arc<SortFieldMap>,
}

#[tokio::main]
async fn main() {
    init();

    let config = Config::from_env().unwrap();
    let db = Database::new(&config).await.unwrap();

    let state = AppState {
        pool: db.pool().clone(),
        jwt: Arc::new(JwtCodec::from_config(&config)),
        sort_fields: Arc::new(SortFieldMap::new()),
    };

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .nest("/api/auth", auth::routes::auth_router())
        .nest("/api/books", api::book::routes::book_router())
        .nest("/api/categories", api::category::routes::category_router())
        .nest("/api/users", api::user::routes::user_router())
        .fallback(fallback_handler)
        .layer(Extension(state));

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await.unwrap();

    info!("Starting bookstore server on port {}", config.server_port);
    axum::serve(listener, app).await.unwrap();
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "Bookstore Backend",
            "version": "0.1.0"
        }),
        "Welcome to the Bookstore API",
    ))
}

async fn health_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({ "status": "up" }),
        "Service healthy",
    ))
}

async fn fallback_handler(
    method: axum::http::Method,
    uri: axum::http::Uri,
) -> (axum::http::StatusCode, Json<ApiResponse<serde_json::Value>>) {
    (
        axum::http::StatusCode::NOT_FOUND,
        Json(ApiResponse::error(format!(
            "Resource not found: {method} {uri}"
        ))),
    )
}
