//! Optional live reranking
//!
//! A reranker (typically a learned sequence model) sees the guess history as
//! three 1-indexed integer sequences plus a mask of still-possible lives and
//! may return a distribution over lives. Its output is only a suggestion:
//! [`predict_lives`] always re-applies the candidate mask, so no live the
//! pruner ruled out can be suggested.
//!
//! Index mappings live in an explicitly constructed [`InferenceContext`]
//! owned by the caller.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalogue::Catalogue;
use crate::error::{Error, Result};
use crate::session::{HistoryEntry, PLACEHOLDER_ARTIST_ID};
use crate::{ArtistId, LiveId, SongId};

/// Predictions below this probability are not reported
pub const MIN_REPORTED_PROBABILITY: f64 = 0.001;

/// Lives below this probability do not count towards a song's split mass
pub const MIN_SPLIT_WEIGHT: f64 = 1e-5;

/// 0-based id → index tables (`mappings.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMappings {
    pub song_to_idx: HashMap<SongId, usize>,
    pub artist_to_idx: HashMap<ArtistId, usize>,
    pub live_to_idx: HashMap<LiveId, usize>,
}

/// Mappings plus the reverse live table, built once and injected
#[derive(Debug, Clone)]
pub struct InferenceContext {
    mappings: IndexMappings,
    idx_to_live: Vec<LiveId>,
}

/// Guess history encoded for a model; 0 is padding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedHistory {
    pub songs: Vec<u32>,
    pub artists: Vec<u32>,
    pub feedbacks: Vec<u32>,
}

impl EncodedHistory {
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}

/// Probability per live index
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    probs: Vec<f64>,
}

/// A live and the probability assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivePrediction {
    pub live_id: LiveId,
    pub probability: f64,
}

/// A song and the candidate probability mass of the lives containing it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitMove {
    pub song_id: SongId,
    pub mass: f64,
}

/// Anything that can score lives from an encoded history
pub trait Reranker: Send + Sync {
    /// `None` means the reranker is unavailable for this input
    fn predict(&self, context: &InferenceContext, history: &EncodedHistory, mask: &[bool]) -> Option<Distribution>;
}

/// Spreads probability evenly across the masked lives
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformReranker;

impl Reranker for UniformReranker {
    fn predict(&self, _context: &InferenceContext, _history: &EncodedHistory, mask: &[bool]) -> Option<Distribution> {
        Some(Distribution::new(mask.iter().map(|&m| if m { 1.0 } else { 0.0 }).collect()))
    }
}

impl Distribution {
    /// Negative and non-finite weights are clamped to 0
    pub fn new(probs: Vec<f64>) -> Self {
        let probs = probs
            .into_iter()
            .map(|p| if p.is_finite() && p > 0.0 { p } else { 0.0 })
            .collect();
        Self { probs }
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probs
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// Zero every index outside `mask` and renormalise
    ///
    /// When nothing inside the mask carries weight the zeroed vector is
    /// returned as is.
    pub fn masked(mut self, mask: &[bool]) -> Self {
        for (p, &keep) in self.probs.iter_mut().zip(mask.iter().chain(std::iter::repeat(&false))) {
            if !keep {
                *p = 0.0;
            }
        }
        let total: f64 = self.probs.iter().sum();
        if total > 0.0 {
            for p in &mut self.probs {
                *p /= total;
            }
        }
        self
    }

    /// Highest-probability lives, descending, ties by index
    pub fn top_k(&self, context: &InferenceContext, k: usize) -> Vec<LivePrediction> {
        let mut ranked: Vec<(usize, f64)> = self.probs.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
            .into_iter()
            .take(k)
            .filter_map(|(idx, probability)| {
                context.live_id(idx).map(|live_id| LivePrediction {
                    live_id: live_id.to_string(),
                    probability,
                })
            })
            .collect()
    }
}

impl InferenceContext {
    /// Validate mappings; live indices must cover `0..n` exactly
    pub fn from_mappings(mappings: IndexMappings) -> Result<Self> {
        let n = mappings.live_to_idx.len();
        let mut idx_to_live: Vec<Option<LiveId>> = vec![None; n];
        for (live_id, &idx) in &mappings.live_to_idx {
            match idx_to_live.get_mut(idx) {
                Some(slot) if slot.is_none() => *slot = Some(live_id.clone()),
                _ => {
                    return Err(Error::Data(format!(
                        "Live index {} for {} is duplicated or out of range",
                        idx, live_id
                    )))
                }
            }
        }
        let idx_to_live = idx_to_live.into_iter().flatten().collect();
        Ok(Self { mappings, idx_to_live })
    }

    /// Load `mappings.json`
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mappings: IndexMappings =
            serde_json::from_str(&text).map_err(|e| Error::Data(format!("Malformed mappings: {}", e)))?;
        Self::from_mappings(mappings)
    }

    /// Derive mappings from the catalogue in ascending id order
    pub fn from_catalogue(catalogue: &Catalogue) -> Self {
        fn index<'a>(ids: impl Iterator<Item = &'a String>) -> HashMap<String, usize> {
            let mut ids: Vec<&String> = ids.collect();
            ids.sort();
            ids.into_iter().enumerate().map(|(i, id)| (id.clone(), i)).collect()
        }

        let mappings = IndexMappings {
            song_to_idx: index(catalogue.songs().keys()),
            artist_to_idx: index(catalogue.artists().keys()),
            live_to_idx: index(catalogue.lives().keys()),
        };
        Self {
            idx_to_live: catalogue.live_ids().to_vec(),
            mappings,
        }
    }

    pub fn mappings(&self) -> &IndexMappings {
        &self.mappings
    }

    pub fn num_lives(&self) -> usize {
        self.idx_to_live.len()
    }

    pub fn live_id(&self, idx: usize) -> Option<&str> {
        self.idx_to_live.get(idx).map(String::as_str)
    }

    /// Encode history as 1-indexed ids; feedback as code + 1
    ///
    /// The song-only placeholder artist encodes as padding. Any other id
    /// the mappings do not know makes the history unencodable.
    pub fn encode_history(&self, history: &[HistoryEntry]) -> Option<EncodedHistory> {
        let mut encoded = EncodedHistory {
            songs: Vec::with_capacity(history.len()),
            artists: Vec::with_capacity(history.len()),
            feedbacks: Vec::with_capacity(history.len()),
        };
        for entry in history {
            let song = *self.mappings.song_to_idx.get(&entry.song_id)? as u32 + 1;
            let artist = if entry.artist_id == PLACEHOLDER_ARTIST_ID {
                0
            } else {
                *self.mappings.artist_to_idx.get(&entry.artist_id)? as u32 + 1
            };
            encoded.songs.push(song);
            encoded.artists.push(artist);
            encoded.feedbacks.push(entry.feedback.code() as u32 + 1);
        }
        Some(encoded)
    }

    /// Boolean mask over live indices; unmapped candidates are ignored
    pub fn live_mask(&self, candidates: &BTreeSet<LiveId>) -> Vec<bool> {
        let mut mask = vec![false; self.num_lives()];
        for id in candidates {
            if let Some(&idx) = self.mappings.live_to_idx.get(id) {
                mask[idx] = true;
            }
        }
        mask
    }
}

/// Encode, predict and restrict to `candidates`
fn candidate_distribution(
    reranker: &dyn Reranker,
    context: &InferenceContext,
    history: &[HistoryEntry],
    candidates: &BTreeSet<LiveId>,
) -> Option<Distribution> {
    let Some(encoded) = context.encode_history(history) else {
        warn!("Guess history references ids missing from the inference mappings");
        return None;
    };
    let mask = context.live_mask(candidates);

    let distribution = reranker.predict(context, &encoded, &mask)?;
    if distribution.len() != context.num_lives() {
        warn!(
            expected = context.num_lives(),
            actual = distribution.len(),
            "Reranker returned a distribution of the wrong size"
        );
        return None;
    }
    Some(distribution.masked(&mask))
}

/// Ask `reranker` for the most likely candidate lives
///
/// Returns `None` when the history cannot be encoded, the reranker declines,
/// or it answers with the wrong shape. Reported predictions are restricted
/// to `candidates` and drop entries below [`MIN_REPORTED_PROBABILITY`].
pub fn predict_lives(
    reranker: &dyn Reranker,
    context: &InferenceContext,
    history: &[HistoryEntry],
    candidates: &BTreeSet<LiveId>,
    top_k: usize,
) -> Option<Vec<LivePrediction>> {
    let predictions: Vec<LivePrediction> = candidate_distribution(reranker, context, history, candidates)?
        .top_k(context, top_k)
        .into_iter()
        .filter(|p| p.probability >= MIN_REPORTED_PROBABILITY)
        .collect();
    debug!(
        turns = history.len(),
        top = ?predictions.first().map(|p| (&p.live_id, p.probability)),
        "Reranked candidate lives"
    );
    Some(predictions)
}

/// Rank unguessed songs by how evenly they split the reranker's mass
///
/// A song's mass is the summed probability of the candidate lives that
/// contain it. Masses closest to 0.5 come first, ties in ascending id order.
/// Songs contained in every weighted live are left out. `None` under the
/// same conditions as [`predict_lives`].
pub fn weighted_split_moves(
    reranker: &dyn Reranker,
    context: &InferenceContext,
    catalogue: &Catalogue,
    history: &[HistoryEntry],
    candidates: &BTreeSet<LiveId>,
    guessed_songs: &BTreeSet<SongId>,
    top_k: usize,
) -> Option<Vec<SplitMove>> {
    let distribution = candidate_distribution(reranker, context, history, candidates)?;

    let mut weighted = 0.0;
    let mut mass: BTreeMap<&str, f64> = BTreeMap::new();
    for (idx, &p) in distribution.probabilities().iter().enumerate() {
        if p < MIN_SPLIT_WEIGHT {
            continue;
        }
        let Some(live) = context.live_id(idx).and_then(|id| catalogue.live(id)) else {
            continue;
        };
        weighted += p;
        for song_id in live.song_ids.iter().filter(|s| !guessed_songs.contains(*s)) {
            *mass.entry(song_id.as_str()).or_insert(0.0) += p;
        }
    }

    let mut ranked: Vec<SplitMove> = mass
        .into_iter()
        .filter(|(_, m)| weighted - m > MIN_SPLIT_WEIGHT)
        .map(|(song_id, mass)| SplitMove {
            song_id: song_id.to_string(),
            mass,
        })
        .collect();
    ranked.sort_by(|a, b| (a.mass - 0.5).abs().total_cmp(&(b.mass - 0.5).abs()));
    ranked.truncate(top_k);
    Some(ranked)
}
