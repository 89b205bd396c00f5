use crate::generate::{self, GenerationRequest, GenerationResult, StylesCatalogue};
use crate::server::AppState;
use crate::server::error::ApiError;
use crate::server::extract::{ApiJson, CurrentUser};
use axum::routing::{get, post};
use axum::{Json, Router};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ai/generate", post(generate_pixel_art))
        .route("/ai/styles", get(styles))
}

async fn generate_pixel_art(
    current: CurrentUser,
    ApiJson(req): ApiJson<GenerationRequest>,
) -> Result<Json<GenerationResult>, ApiError> {
    let result = generate::generate(&req, &mut rand::rng()).inspect_err(|e| {
        tracing::debug!(user_id = current.user.id, size = %req.size, "rejected generation: {e}");
    })?;
    tracing::info!(
        user_id = current.user.id,
        width = result.width,
        height = result.height,
        style = %req.style,
        "generated pixel art"
    );
    Ok(Json(result))
}

async fn styles() -> Json<StylesCatalogue> {
    Json(generate::catalogue())
}
