//! Catalogue name lists for guess dropdowns

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

/// Sorted display names
#[derive(Debug, Serialize)]
pub struct NameListResponse {
    pub count: usize,
    pub names: Vec<String>,
}

fn sorted(names: impl Iterator<Item = String>) -> Json<NameListResponse> {
    let mut names: Vec<String> = names.collect();
    names.sort();
    names.dedup();
    Json(NameListResponse {
        count: names.len(),
        names,
    })
}

/// GET /api/catalogue/songs
pub async fn list_songs(State(state): State<AppState>) -> Json<NameListResponse> {
    sorted(state.catalogue.songs().values().map(|s| s.name.clone()))
}

/// GET /api/catalogue/artists
pub async fn list_artists(State(state): State<AppState>) -> Json<NameListResponse> {
    sorted(state.catalogue.artists().values().map(|a| a.name.clone()))
}

/// GET /api/catalogue/lives
pub async fn list_lives(State(state): State<AppState>) -> Json<NameListResponse> {
    sorted(state.catalogue.lives().values().map(|l| l.name.clone()))
}
