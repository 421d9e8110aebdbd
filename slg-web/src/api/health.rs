//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Sizes of the loaded catalogue
#[derive(Debug, Serialize)]
pub struct CatalogueSize {
    pub songs: usize,
    pub artists: usize,
    pub lives: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub catalogue: CatalogueSize,
    /// Whether `/api/game/predict` is backed by a reranker
    pub predictions: bool,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let catalogue = &state.catalogue;
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        catalogue: CatalogueSize {
            songs: catalogue.songs().len(),
            artists: catalogue.artists().len(),
            lives: catalogue.lives().len(),
        },
        predictions: state.reranker.is_some(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
