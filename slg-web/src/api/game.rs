//! Game turn endpoints
//!
//! Each handler restores a session from the request's snapshot (or starts a
//! fresh game when none is sent), applies one action and returns the new
//! snapshot. Song guesses are pruned immediately (assisted play); a wrong
//! live guess also removes that live from the candidates.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use slg_common::rerank;
use slg_common::session::PLACEHOLDER_ARTIST_ID;
use slg_common::{Feedback, GameSession, SessionSnapshot};
use tracing::{debug, info};

use super::error::ApiError;
use crate::AppState;

/// Predictions reported by the predict endpoint
const PREDICTION_COUNT: usize = 5;

#[derive(Debug, Default, Deserialize)]
pub struct NewGameRequest {
    #[serde(default)]
    pub target_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GuessSongRequest {
    #[serde(default)]
    pub state: Option<SessionSnapshot>,
    pub song_name: String,
    pub artist_name: String,
}

#[derive(Debug, Deserialize)]
pub struct GuessSongOnlyRequest {
    #[serde(default)]
    pub state: Option<SessionSnapshot>,
    pub song_name: String,
}

#[derive(Debug, Deserialize)]
pub struct GuessLiveRequest {
    #[serde(default)]
    pub state: Option<SessionSnapshot>,
    pub live_name: String,
}

#[derive(Debug, Deserialize)]
pub struct StateRequest {
    #[serde(default)]
    pub state: Option<SessionSnapshot>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// One rendered history line
#[derive(Debug, Serialize)]
pub struct HistoryLine {
    pub song: String,
    pub artist: String,
    pub feedback: i8,
    pub result: String,
}

/// Outcome of a turn plus the state to send back next time
#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub state: SessionSnapshot,
    pub message: String,
    /// Feedback code of a song guess; absent when nothing was scored
    pub feedback: Option<i8>,
    pub solved: bool,
    pub candidates_remaining: usize,
    pub history: Vec<HistoryLine>,
}

#[derive(Debug, Serialize)]
pub struct Suggestion {
    pub song_id: String,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Serialize)]
pub struct HintsResponse {
    pub message: String,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Serialize)]
pub struct Prediction {
    pub live_id: String,
    pub name: String,
    pub probability: f64,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub predictions: Vec<Prediction>,
}

fn load_session(state: &AppState, snapshot: Option<SessionSnapshot>) -> Result<GameSession, ApiError> {
    match snapshot {
        Some(snapshot) => Ok(GameSession::restore(state.catalogue.clone(), snapshot)?),
        None => {
            let mut session = GameSession::new(state.catalogue.clone());
            session.start(None)?;
            Ok(session)
        }
    }
}

fn history_lines(session: &GameSession) -> Vec<HistoryLine> {
    let catalogue = session.catalogue();
    session
        .history()
        .iter()
        .map(|h| {
            let song = catalogue
                .song(&h.song_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| h.song_id.clone());
            let artist = if h.artist_id == PLACEHOLDER_ARTIST_ID {
                "?".to_string()
            } else {
                catalogue
                    .artist(&h.artist_id)
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| h.artist_id.clone())
            };
            HistoryLine {
                song,
                artist,
                feedback: h.feedback.code(),
                result: h.feedback.label().to_string(),
            }
        })
        .collect()
}

fn respond(session: &GameSession, message: String, feedback: Option<Feedback>) -> Result<Json<TurnResponse>, ApiError> {
    Ok(Json(TurnResponse {
        state: session.snapshot()?,
        message,
        feedback: feedback.map(Feedback::code),
        solved: session.is_solved(),
        candidates_remaining: session.candidates().len(),
        history: history_lines(session),
    }))
}

/// POST /api/game/new
pub async fn new_game(
    State(state): State<AppState>,
    body: Option<Json<NewGameRequest>>,
) -> Result<Json<TurnResponse>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let mut session = GameSession::new(state.catalogue.clone());
    session.start(request.target_id.as_deref())?;
    info!("New game started via API");
    respond(&session, "Game Started! Guess the live concert.".to_string(), None)
}

/// POST /api/game/guess-song
///
/// Resolves both names, rejects a repeated song without changing state,
/// then scores and prunes.
pub async fn guess_song(
    State(state): State<AppState>,
    Json(request): Json<GuessSongRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let mut session = load_session(&state, request.state)?;
    let song_id = state.catalogue.find_song_id(&request.song_name, state.resolver.as_ref())?;
    let artist_id = state.catalogue.find_artist_id(&request.artist_name, state.resolver.as_ref())?;

    if session.guessed_song_ids().contains(&song_id) {
        return respond(&session, "Already guessed this song.".to_string(), None);
    }

    let feedback = session.guess_song(&song_id, &artist_id)?;
    let remaining = session.prune_candidates(&song_id, &artist_id, feedback)?;
    debug!(song_id = %song_id, artist_id = %artist_id, %feedback, remaining, "API song guess");

    let verdict = match feedback {
        Feedback::SongAndArtist => "PERFECT MATCH! (Song & Artist correct)",
        Feedback::SongOnly => "SONG CORRECT! (Artist incorrect)",
        Feedback::NotPresent => "WRONG. (Song not in live)",
    };
    let message = format!("{}\nCandidates remaining: {}", verdict, remaining);
    respond(&session, message, Some(feedback))
}

/// POST /api/game/guess-song-only
pub async fn guess_song_only(
    State(state): State<AppState>,
    Json(request): Json<GuessSongOnlyRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let mut session = load_session(&state, request.state)?;
    let song_id = state.catalogue.find_song_id(&request.song_name, state.resolver.as_ref())?;

    if session.guessed_song_ids().contains(&song_id) {
        return respond(&session, "Already guessed this song.".to_string(), None);
    }

    let outcome = session.guess_song_only(&song_id)?;
    let remaining = session.prune_last_guess()?;
    let feedback = session.history().last().map(|entry| entry.feedback);

    let verdict = if outcome.matched {
        let names: Vec<String> = outcome
            .revealed_artist_ids
            .iter()
            .map(|id| {
                state
                    .catalogue
                    .artist(id)
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| id.clone())
            })
            .collect();
        format!("SONG FOUND! Performed by: {}", names.join(", "))
    } else {
        "WRONG. (Song not in live)".to_string()
    };
    let message = format!("{}\nCandidates remaining: {}", verdict, remaining);
    respond(&session, message, feedback)
}

/// POST /api/game/guess-live
pub async fn guess_live(
    State(state): State<AppState>,
    Json(request): Json<GuessLiveRequest>,
) -> Result<Json<TurnResponse>, ApiError> {
    let mut session = load_session(&state, request.state)?;
    let live_id = state.catalogue.find_live_id(&request.live_name, state.resolver.as_ref())?;

    let message = if session.guess_live(&live_id)? {
        let name = state
            .catalogue
            .live(&live_id)
            .map(|l| l.name.as_str())
            .unwrap_or(live_id.as_str());
        format!("CONGRATULATIONS! You found the live: {}", name)
    } else {
        let remaining = session.eliminate_live(&live_id)?;
        format!("Incorrect Live.\nCandidates remaining: {}", remaining)
    };
    respond(&session, message, None)
}

/// POST /api/game/hints
pub async fn entropy_hints(
    State(state): State<AppState>,
    Json(request): Json<StateRequest>,
) -> Result<Json<HintsResponse>, ApiError> {
    let session = load_session(&state, request.state)?;
    let top_k = request.top_k.unwrap_or(state.default_top_k);

    let suggestions: Vec<Suggestion> = session
        .best_moves(top_k)
        .into_iter()
        .map(|m| Suggestion {
            name: state
                .catalogue
                .song(&m.song_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| m.song_id.clone()),
            song_id: m.song_id,
            score: m.score,
        })
        .collect();

    let message = if suggestions.is_empty() {
        "No moves available.".to_string()
    } else {
        "Top Entropy Suggestions".to_string()
    };
    Ok(Json(HintsResponse { message, suggestions }))
}

/// POST /api/game/predict
///
/// Reranker output restricted to the current candidates.
pub async fn predict_lives(
    State(state): State<AppState>,
    Json(request): Json<StateRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let Some((reranker, context)) = state.reranker.clone() else {
        return Err(ApiError::Unavailable("AI Model not available.".to_string()));
    };
    let session = load_session(&state, request.state)?;
    if session.history().is_empty() {
        return Err(ApiError::BadRequest(
            "Make at least one guess for AI prediction.".to_string(),
        ));
    }

    let predictions = rerank::predict_lives(
        reranker.as_ref(),
        &context,
        session.history(),
        session.candidates(),
        PREDICTION_COUNT,
    )
    .ok_or_else(|| ApiError::Unavailable("Prediction unavailable for this game.".to_string()))?;

    let predictions = predictions
        .into_iter()
        .map(|p| Prediction {
            name: state
                .catalogue
                .live(&p.live_id)
                .map(|l| l.name.clone())
                .unwrap_or_else(|| p.live_id.clone()),
            live_id: p.live_id,
            probability: p.probability,
        })
        .collect();
    Ok(Json(PredictResponse { predictions }))
}
