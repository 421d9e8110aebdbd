//! HTTP API handlers for slg-web

pub mod catalogue;
pub mod error;
pub mod game;
pub mod health;

pub use catalogue::{list_artists, list_lives, list_songs};
pub use error::ApiError;
pub use game::{entropy_hints, guess_live, guess_song, guess_song_only, new_game, predict_lives};
pub use health::health_routes;
