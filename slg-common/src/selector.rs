//! Entropy-based move selection
//!
//! Scores songs by the Shannon entropy of the binary "song is in the target"
//! split over the current candidate lives. The artist half of the feedback
//! depends on which artist the caller names, so it is not modelled here.
//!
//! Ordering: relevant songs are visited in ascending id order and sorted
//! stably by score, so equal scores keep ascending id order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalogue::Catalogue;
use crate::{LiveId, SongId};

/// A suggested song and its information gain in bits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveScore {
    pub song_id: SongId,
    pub score: f64,
}

/// Binary entropy of a `yes`/`n` split, in bits
///
/// Defined as exactly 0 when `n <= 1`, and `0·log2(0)` is taken as 0.
pub fn binary_entropy(yes: usize, n: usize) -> f64 {
    if n <= 1 || yes == 0 || yes >= n {
        return 0.0;
    }
    let p = yes as f64 / n as f64;
    let q = (n - yes) as f64 / n as f64;
    -(p * p.log2() + q * q.log2())
}

/// Rank unguessed songs by information gain over `candidates`
///
/// Only songs appearing in at least one candidate are considered; any other
/// song would score 0.
pub fn best_moves(
    catalogue: &Catalogue,
    candidates: &BTreeSet<LiveId>,
    guessed_songs: &BTreeSet<SongId>,
    top_k: usize,
) -> Vec<MoveScore> {
    let n = candidates.len();

    // song -> number of candidate lives containing it
    let mut presence: BTreeMap<&str, usize> = BTreeMap::new();
    for live in candidates.iter().filter_map(|id| catalogue.live(id)) {
        for song_id in &live.song_ids {
            *presence.entry(song_id.as_str()).or_insert(0) += 1;
        }
    }

    let mut moves: Vec<MoveScore> = presence
        .into_iter()
        .filter(|(song_id, _)| !guessed_songs.contains(*song_id))
        .map(|(song_id, yes)| MoveScore {
            song_id: song_id.to_string(),
            score: binary_entropy(yes, n),
        })
        .collect();

    moves.sort_by(|a, b| b.score.total_cmp(&a.score));
    moves.truncate(top_k);

    debug!(
        candidates = n,
        top = ?moves.first().map(|m| (&m.song_id, m.score)),
        "Ranked moves"
    );
    moves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::fixtures::scenario;

    fn all(cat: &Catalogue) -> BTreeSet<LiveId> {
        cat.live_ids().iter().cloned().collect()
    }

    #[test]
    fn test_binary_entropy_values() {
        assert_eq!(binary_entropy(0, 0), 0.0);
        assert_eq!(binary_entropy(1, 1), 0.0);
        assert_eq!(binary_entropy(0, 5), 0.0);
        assert_eq!(binary_entropy(5, 5), 0.0);
        assert!((binary_entropy(1, 2) - 1.0).abs() < 1e-12);
        assert!((binary_entropy(2, 3) - 0.918_295_834).abs() < 1e-6);
        assert_eq!(binary_entropy(1, 3), binary_entropy(2, 3));
    }

    #[test]
    fn test_binary_entropy_bounds() {
        for n in 0..40 {
            for yes in 0..=n {
                let h = binary_entropy(yes, n);
                assert!((0.0..=1.0).contains(&h), "H({}/{}) = {}", yes, n, h);
            }
        }
    }

    #[test]
    fn test_scenario_ranking() {
        let cat = scenario();
        let moves = best_moves(&cat, &all(&cat), &BTreeSet::new(), 10);

        // B and C are each in 2 of 3 lives; A in 1 of 3. All score 0.918,
        // so ascending id order decides.
        let ids: Vec<&str> = moves.iter().map(|m| m.song_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        let b = moves.iter().find(|m| m.song_id == "B").unwrap();
        assert!((b.score - 0.918).abs() < 1e-3);
    }

    #[test]
    fn test_majority_song_ranks_above_rare_song() {
        let cat = crate::Catalogue::from_json_str(
            r#"{
                "songs": {
                    "A": {"name": "A", "artist_ids": []},
                    "B": {"name": "B", "artist_ids": []},
                    "C": {"name": "C", "artist_ids": []}
                },
                "artists": {},
                "lives": {
                    "L1": {"name": "1", "song_ids": ["A", "B"], "artist_ids": []},
                    "L2": {"name": "2", "song_ids": ["B", "C"], "artist_ids": []},
                    "L3": {"name": "3", "song_ids": ["B"], "artist_ids": []},
                    "L4": {"name": "4", "song_ids": ["C"], "artist_ids": []}
                }
            }"#,
            crate::LoadPolicy::Strict,
        )
        .unwrap();
        let moves = best_moves(&cat, &all(&cat), &BTreeSet::new(), 3);
        // C: 2/4 -> 1.0, B: 3/4 -> 0.811, A: 1/4 -> 0.811
        assert_eq!(moves[0].song_id, "C");
        assert!((moves[0].score - 1.0).abs() < 1e-12);
        assert_eq!(moves[1].song_id, "A");
        assert_eq!(moves[2].song_id, "B");
    }

    #[test]
    fn test_guessed_songs_excluded_and_top_k() {
        let cat = scenario();
        let guessed: BTreeSet<SongId> = ["B".to_string()].into_iter().collect();
        let moves = best_moves(&cat, &all(&cat), &guessed, 1);
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].song_id, "A");
    }

    #[test]
    fn test_single_candidate_scores_zero() {
        let cat = scenario();
        let candidates: BTreeSet<LiveId> = ["L1".to_string()].into_iter().collect();
        let moves = best_moves(&cat, &candidates, &BTreeSet::new(), 10);
        assert_eq!(moves.len(), 2);
        assert!(moves.iter().all(|m| m.score == 0.0));
    }

    #[test]
    fn test_irrelevant_songs_skipped() {
        let cat = scenario();
        let candidates: BTreeSet<LiveId> = ["L3".to_string()].into_iter().collect();
        let moves = best_moves(&cat, &candidates, &BTreeSet::new(), 10);
        let ids: Vec<&str> = moves.iter().map(|m| m.song_id.as_str()).collect();
        assert_eq!(ids, vec!["C"]);
    }
}
