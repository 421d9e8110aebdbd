//! slg-web library - stateless HTTP front-end for the setlist guessing game
//!
//! No session lives on the server: every request carries the session
//! snapshot and every response returns the updated one.

use std::sync::Arc;

use axum::Router;
use slg_common::rerank::{InferenceContext, Reranker};
use slg_common::{Catalogue, NameResolver};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Read-only catalogue shared by all requests
    pub catalogue: Arc<Catalogue>,
    /// Free-text → name strategy for guesses
    pub resolver: Arc<dyn NameResolver>,
    /// Reranker and its index mappings; `None` disables predictions
    pub reranker: Option<(Arc<dyn Reranker>, Arc<InferenceContext>)>,
    /// Suggestions returned by the hints endpoint when the request names none
    pub default_top_k: usize,
}

impl AppState {
    /// Create new application state with predictions disabled
    pub fn new(catalogue: Arc<Catalogue>, resolver: Arc<dyn NameResolver>, default_top_k: usize) -> Self {
        Self {
            catalogue,
            resolver,
            reranker: None,
            default_top_k,
        }
    }

    /// Enable the predictions endpoint
    pub fn with_reranker(mut self, reranker: Arc<dyn Reranker>, context: Arc<InferenceContext>) -> Self {
        self.reranker = Some((reranker, context));
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let game = Router::new()
        .route("/api/game/new", post(api::new_game))
        .route("/api/game/guess-song", post(api::guess_song))
        .route("/api/game/guess-song-only", post(api::guess_song_only))
        .route("/api/game/guess-live", post(api::guess_live))
        .route("/api/game/hints", post(api::entropy_hints))
        .route("/api/game/predict", post(api::predict_lives));

    let catalogue = Router::new()
        .route("/api/catalogue/songs", get(api::list_songs))
        .route("/api/catalogue/artists", get(api::list_artists))
        .route("/api/catalogue/lives", get(api::list_lives));

    Router::new()
        .merge(game)
        .merge(catalogue)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
