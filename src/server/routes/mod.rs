pub mod ai;
pub mod auth;
pub mod projects;

use super::AppState;
use axum::Json;
use axum::Router;
use axum::routing::get;
use serde_json::{Value, json};

pub fn api() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(projects::router())
        .merge(ai::router())
}

pub fn meta() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Pixel Builder AI Backend",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Pixel Builder AI Backend is running",
    }))
}
