//! HTTP API.
//!
//! Everything lives under `/api/v1` except the `/` and `/health` probes.

pub mod error;
pub mod extract;
pub mod routes;

use crate::config::Config;
use crate::storage::StorageHandle;
use anyhow::Context;
use axum::Router;
use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Clone)]
pub struct AppState {
    pub storage: StorageHandle,
    pub token_ttl_minutes: i64,
}

impl AppState {
    pub fn new(storage: StorageHandle, token_ttl_minutes: i64) -> Self {
        Self {
            storage,
            token_ttl_minutes,
        }
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {o:?}");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .merge(routes::meta())
        .nest("/api/v1", routes::api())
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(cfg: &Config) -> anyhow::Result<()> {
    let db_path = cfg.database_path();
    let storage = StorageHandle::new(db_path.clone())?;
    tracing::info!("using database {}", db_path.display());

    let app = router(
        AppState::new(storage, cfg.auth.token_ttl_minutes),
        &cfg.server.cors_origins,
    );

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve http")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
