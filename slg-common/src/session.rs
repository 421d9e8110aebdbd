//! Game session state machine
//!
//! `Unstarted → InProgress → Solved`. [`GameSession::start`] is always legal
//! and resets every mutable field. Guesses never prune on their own; callers
//! invoke [`GameSession::prune_candidates`] with the same triple to play
//! assisted, or skip it to play unassisted.

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalogue::{Catalogue, Live};
use crate::error::{Error, IdentifierKind, Result};
use crate::feedback::{score, Feedback};
use crate::pruner;
use crate::selector::{self, MoveScore};
use crate::{ArtistId, LiveId, SongId};

/// Artist id recorded for a song-only guess that missed
///
/// Not a catalogue id; front-ends must not look it up for display.
pub const PLACEHOLDER_ARTIST_ID: &str = "unknown";

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Unstarted,
    InProgress,
    Solved,
}

/// One song/artist guess and the feedback it earned
///
/// Serialized as a `[songId, artistId, feedbackCode]` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(SongId, ArtistId, Feedback)", into = "(SongId, ArtistId, Feedback)")]
pub struct HistoryEntry {
    pub song_id: SongId,
    pub artist_id: ArtistId,
    pub feedback: Feedback,
}

impl From<(SongId, ArtistId, Feedback)> for HistoryEntry {
    fn from((song_id, artist_id, feedback): (SongId, ArtistId, Feedback)) -> Self {
        Self {
            song_id,
            artist_id,
            feedback,
        }
    }
}

impl From<HistoryEntry> for (SongId, ArtistId, Feedback) {
    fn from(entry: HistoryEntry) -> Self {
        (entry.song_id, entry.artist_id, entry.feedback)
    }
}

/// Result of a song-only (reveal mode) guess
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealOutcome {
    pub matched: bool,
    /// Artists of the song who performed at the target, roster order
    pub revealed_artist_ids: Vec<ArtistId>,
}

/// One game against a hidden target live
///
/// Owned by a single caller; only the catalogue is shared.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub(crate) catalogue: Arc<Catalogue>,
    pub(crate) status: GameStatus,
    pub(crate) target_live_id: Option<LiveId>,
    pub(crate) candidates: BTreeSet<LiveId>,
    pub(crate) guessed_song_ids: BTreeSet<SongId>,
    pub(crate) guessed_live_ids: BTreeSet<LiveId>,
    pub(crate) history: Vec<HistoryEntry>,
}

impl GameSession {
    /// Create an unstarted session
    pub fn new(catalogue: Arc<Catalogue>) -> Self {
        Self {
            catalogue,
            status: GameStatus::Unstarted,
            target_live_id: None,
            candidates: BTreeSet::new(),
            guessed_song_ids: BTreeSet::new(),
            guessed_live_ids: BTreeSet::new(),
            history: Vec::new(),
        }
    }

    /// Start (or restart) a game; returns the target live id
    pub fn start(&mut self, target: Option<&str>) -> Result<LiveId> {
        self.start_with_rng(target, &mut rand::thread_rng())
    }

    /// Start with an explicit random source
    ///
    /// A target id unknown to the catalogue falls back to a random pick.
    pub fn start_with_rng<R: Rng + ?Sized>(&mut self, target: Option<&str>, rng: &mut R) -> Result<LiveId> {
        let chosen = match target {
            Some(id) if self.catalogue.live(id).is_some() => id.to_string(),
            other => {
                if let Some(id) = other {
                    warn!(live_id = id, "Requested target not in catalogue, choosing at random");
                }
                self.catalogue
                    .live_ids()
                    .choose(rng)
                    .cloned()
                    .ok_or_else(|| Error::Data("Catalogue has no lives".to_string()))?
            }
        };

        self.candidates = self.catalogue.live_ids().iter().cloned().collect();
        self.guessed_song_ids.clear();
        self.guessed_live_ids.clear();
        self.history.clear();
        self.target_live_id = Some(chosen.clone());
        self.status = GameStatus::InProgress;

        info!(candidates = self.candidates.len(), "Game started");
        Ok(chosen)
    }

    /// Score a song/artist guess against the target and record it
    ///
    /// An unknown song id fails with [`Error::UnknownSong`] and leaves the
    /// session untouched.
    pub fn guess_song(&mut self, song_id: &str, artist_id: &str) -> Result<Feedback> {
        let target = self.target_in_progress()?;
        if self.catalogue.song(song_id).is_none() {
            return Err(Error::UnknownSong(song_id.to_string()));
        }

        let feedback = score(song_id, artist_id, target);
        self.record(song_id, artist_id, feedback);
        Ok(feedback)
    }

    /// Reveal-mode guess: name only a song, learn which of its artists
    /// performed at the target
    ///
    /// On a match the history gets a synthetic `SongAndArtist` entry using
    /// the first revealed artist; on a miss a `NotPresent` entry with
    /// [`PLACEHOLDER_ARTIST_ID`].
    pub fn guess_song_only(&mut self, song_id: &str) -> Result<RevealOutcome> {
        let target = self.target_in_progress()?;
        let song = self
            .catalogue
            .song(song_id)
            .ok_or_else(|| Error::UnknownSong(song_id.to_string()))?;

        if !target.contains_song(song_id) {
            self.record(song_id, PLACEHOLDER_ARTIST_ID, Feedback::NotPresent);
            return Ok(RevealOutcome {
                matched: false,
                revealed_artist_ids: Vec::new(),
            });
        }

        let mut revealed: Vec<ArtistId> = target
            .artist_ids
            .iter()
            .filter(|a| song.artist_ids.contains(a))
            .cloned()
            .collect();
        if revealed.is_empty() {
            revealed = song.artist_ids.clone();
        }

        // A song with no credited artists still hit; the placeholder keeps
        // the history triple well formed.
        let artist_id = revealed
            .first()
            .map(String::as_str)
            .unwrap_or(PLACEHOLDER_ARTIST_ID)
            .to_string();
        self.record(song_id, &artist_id, Feedback::SongAndArtist);

        Ok(RevealOutcome {
            matched: true,
            revealed_artist_ids: revealed,
        })
    }

    /// Apply one feedback observation to the candidate set
    ///
    /// Returns the number of candidates remaining.
    pub fn prune_candidates(&mut self, song_id: &str, artist_id: &str, feedback: Feedback) -> Result<usize> {
        self.ensure_started()?;
        pruner::prune(&self.catalogue, &mut self.candidates, song_id, artist_id, feedback);
        Ok(self.candidates.len())
    }

    /// Prune with the most recent history entry
    ///
    /// The recorded pair is rescored against the target, so reveal-mode
    /// entries (placeholder or credit-fallback artist) prune on what the
    /// pair actually shows rather than on the synthetic feedback.
    pub fn prune_last_guess(&mut self) -> Result<usize> {
        self.ensure_started()?;
        let Some(entry) = self.history.last() else {
            return Ok(self.candidates.len());
        };
        let observed = match self.target_live_id.as_deref().and_then(|id| self.catalogue.live(id)) {
            Some(target) => score(&entry.song_id, &entry.artist_id, target),
            None => entry.feedback,
        };
        let (song_id, artist_id) = (entry.song_id.clone(), entry.artist_id.clone());
        pruner::prune(&self.catalogue, &mut self.candidates, &song_id, &artist_id, observed);
        Ok(self.candidates.len())
    }

    /// Guess the target live directly
    ///
    /// A wrong guess is recorded but does not touch the candidate set; see
    /// [`GameSession::eliminate_live`].
    pub fn guess_live(&mut self, live_id: &str) -> Result<bool> {
        let target_id = self.target_id_in_progress()?.to_string();
        if self.catalogue.live(live_id).is_none() {
            return Err(Error::unknown(IdentifierKind::Live, live_id));
        }

        self.guessed_live_ids.insert(live_id.to_string());
        let correct = live_id == target_id;
        if correct {
            self.status = GameStatus::Solved;
            info!(
                guesses = self.history.len(),
                live_guesses = self.guessed_live_ids.len(),
                "Game solved"
            );
        } else {
            debug!(live_id, "Wrong live guess");
        }
        Ok(correct)
    }

    /// Drop a wrongly guessed live from the candidates
    ///
    /// Returns the number of candidates remaining.
    pub fn eliminate_live(&mut self, live_id: &str) -> Result<usize> {
        self.ensure_started()?;
        if self.target_live_id.as_deref() == Some(live_id) {
            return Err(Error::InvalidState(
                "Cannot eliminate the target live".to_string(),
            ));
        }
        pruner::eliminate(&mut self.candidates, live_id);
        Ok(self.candidates.len())
    }

    /// Rank unguessed songs by information gain over the current candidates
    pub fn best_moves(&self, top_k: usize) -> Vec<MoveScore> {
        selector::best_moves(&self.catalogue, &self.candidates, &self.guessed_song_ids, top_k)
    }

    pub fn catalogue(&self) -> &Arc<Catalogue> {
        &self.catalogue
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_solved(&self) -> bool {
        self.status == GameStatus::Solved
    }

    pub fn target_live_id(&self) -> Option<&str> {
        self.target_live_id.as_deref()
    }

    pub fn candidates(&self) -> &BTreeSet<LiveId> {
        &self.candidates
    }

    pub fn guessed_song_ids(&self) -> &BTreeSet<SongId> {
        &self.guessed_song_ids
    }

    pub fn guessed_live_ids(&self) -> &BTreeSet<LiveId> {
        &self.guessed_live_ids
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    fn record(&mut self, song_id: &str, artist_id: &str, feedback: Feedback) {
        self.guessed_song_ids.insert(song_id.to_string());
        self.history.push(HistoryEntry {
            song_id: song_id.to_string(),
            artist_id: artist_id.to_string(),
            feedback,
        });
        debug!(song_id, artist_id, %feedback, turn = self.history.len(), "Song guess recorded");
    }

    fn ensure_started(&self) -> Result<()> {
        match self.status {
            GameStatus::Unstarted => Err(Error::InvalidState("Game not started".to_string())),
            _ => Ok(()),
        }
    }

    fn target_id_in_progress(&self) -> Result<&str> {
        match (self.status, self.target_live_id.as_deref()) {
            (GameStatus::InProgress, Some(id)) => Ok(id),
            (GameStatus::Solved, _) => Err(Error::InvalidState("Game already solved".to_string())),
            _ => Err(Error::InvalidState("Game not started".to_string())),
        }
    }

    fn target_in_progress(&self) -> Result<&Live> {
        let id = self.target_id_in_progress()?;
        self.catalogue
            .live(id)
            .ok_or_else(|| Error::InvalidState(format!("Target live {} missing from catalogue", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::fixtures::scenario;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn started(target: &str) -> GameSession {
        let mut session = GameSession::new(Arc::new(scenario()));
        session.start(Some(target)).unwrap();
        session
    }

    #[test]
    fn test_new_session_is_unstarted() {
        let mut session = GameSession::new(Arc::new(scenario()));
        assert_eq!(session.status(), GameStatus::Unstarted);
        assert!(session.target_live_id().is_none());
        assert!(matches!(session.guess_song("A", "X"), Err(Error::InvalidState(_))));
        assert!(matches!(session.guess_live("L1"), Err(Error::InvalidState(_))));
        assert!(matches!(
            session.prune_candidates("A", "X", Feedback::NotPresent),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_start_with_explicit_target() {
        let session = started("L2");
        assert_eq!(session.target_live_id(), Some("L2"));
        assert_eq!(session.status(), GameStatus::InProgress);
        assert_eq!(session.candidates().len(), 3);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_start_random_target_is_a_catalogue_live() {
        let mut session = GameSession::new(Arc::new(scenario()));
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let id = session.start_with_rng(None, &mut rng).unwrap();
            assert!(session.catalogue().live(&id).is_some());
        }
    }

    #[test]
    fn test_start_unknown_target_falls_back_to_random() {
        let mut session = GameSession::new(Arc::new(scenario()));
        let id = session.start(Some("L99")).unwrap();
        assert!(["L1", "L2", "L3"].contains(&id.as_str()));
    }

    #[test]
    fn test_scenario_guess_and_prune() {
        let mut session = started("L1");
        let feedback = session.guess_song("A", "X").unwrap();
        assert_eq!(feedback, Feedback::SongAndArtist);
        // Guessing never prunes on its own
        assert_eq!(session.candidates().len(), 3);

        let remaining = session.prune_candidates("A", "X", feedback).unwrap();
        assert_eq!(remaining, 1);
        assert!(session.candidates().contains("L1"));
        assert_eq!(session.history().len(), 1);
        assert!(session.guessed_song_ids().contains("A"));
    }

    #[test]
    fn test_invalid_guess_is_idempotent_no_op() {
        let mut session = started("L1");
        session.guess_song("B", "Y").unwrap();
        for _ in 0..2 {
            let err = session.guess_song("Z", "X").unwrap_err();
            assert!(matches!(err, Error::UnknownSong(ref id) if id == "Z"));
            assert_eq!(session.history().len(), 1);
            assert_eq!(session.guessed_song_ids().len(), 1);
        }
        assert!(matches!(session.guess_song_only("Z"), Err(Error::UnknownSong(_))));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_wrong_live_guess_leaves_candidates() {
        let mut session = started("L1");
        assert!(!session.guess_live("L2").unwrap());
        assert!(session.guessed_live_ids().contains("L2"));
        assert_eq!(session.candidates().len(), 3);
        assert_eq!(session.status(), GameStatus::InProgress);

        assert_eq!(session.eliminate_live("L2").unwrap(), 2);
        assert!(matches!(session.eliminate_live("L1"), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_correct_live_guess_solves() {
        let mut session = started("L3");
        assert!(session.guess_live("L3").unwrap());
        assert!(session.is_solved());
        assert!(matches!(session.guess_song("A", "X"), Err(Error::InvalidState(_))));
        assert!(matches!(session.guess_live("L3"), Err(Error::InvalidState(_))));

        session.start(Some("L1")).unwrap();
        assert_eq!(session.status(), GameStatus::InProgress);
        assert!(session.guessed_live_ids().is_empty());
    }

    #[test]
    fn test_unknown_live_guess_rejected() {
        let mut session = started("L1");
        assert!(matches!(
            session.guess_live("nope"),
            Err(Error::UnknownIdentifier { kind: IdentifierKind::Live, .. })
        ));
        assert!(session.guessed_live_ids().is_empty());
    }

    #[test]
    fn test_guess_song_only_reveals_artists() {
        // L1 roster is [X, Y] and B is credited [Y, X]; reveal follows roster order
        let cat = Catalogue::from_json_str(
            r#"{
                "songs": {"B": {"name": "B", "artist_ids": ["Y", "X"]}},
                "artists": {"X": {"name": "X"}, "Y": {"name": "Y"}},
                "lives": {
                    "L1": {"name": "1", "song_ids": ["B"], "artist_ids": ["X", "Y"]},
                    "L2": {"name": "2", "song_ids": [], "artist_ids": []}
                }
            }"#,
            crate::LoadPolicy::Strict,
        )
        .unwrap();
        let mut session = GameSession::new(Arc::new(cat));
        session.start(Some("L1")).unwrap();

        let outcome = session.guess_song_only("B").unwrap();
        assert!(outcome.matched);
        assert_eq!(outcome.revealed_artist_ids, vec!["X", "Y"]);

        let entry = &session.history()[0];
        assert_eq!(entry.feedback, Feedback::SongAndArtist);
        assert_eq!(entry.artist_id, "X");
    }

    #[test]
    fn test_guess_song_only_falls_back_to_song_credits() {
        // S is credited [H, G] but neither played L, so the reveal is S's own credits
        let json = r#"{
            "songs": {"S": {"name": "S", "artist_ids": ["H", "G"]}},
            "artists": {"G": {"name": "G"}, "H": {"name": "H"}, "K": {"name": "K"}},
            "lives": {
                "L": {"name": "L", "song_ids": ["S"], "artist_ids": ["K"]},
                "M": {"name": "M", "song_ids": [], "artist_ids": ["G"]}
            }
        }"#;
        let mut session = GameSession::new(Arc::new(Catalogue::from_json_str(json, crate::LoadPolicy::Strict).unwrap()));
        session.start(Some("L")).unwrap();

        let outcome = session.guess_song_only("S").unwrap();
        assert!(outcome.matched);
        assert_eq!(outcome.revealed_artist_ids, vec!["H", "G"]);
        assert_eq!(session.history()[0].artist_id, "H");
        assert_eq!(session.history()[0].feedback, Feedback::SongAndArtist);
    }

    #[test]
    fn test_guess_song_only_miss_records_placeholder() {
        let mut session = started("L1");
        let outcome = session.guess_song_only("C").unwrap();
        assert!(!outcome.matched);
        assert!(outcome.revealed_artist_ids.is_empty());

        let entry = &session.history()[0];
        assert_eq!(entry.feedback, Feedback::NotPresent);
        assert_eq!(entry.artist_id, PLACEHOLDER_ARTIST_ID);

        // The synthetic triple is still safe to prune with
        session.prune_candidates("C", PLACEHOLDER_ARTIST_ID, Feedback::NotPresent).unwrap();
        assert_eq!(session.candidates().iter().collect::<Vec<_>>(), vec!["L1"]);
    }

    #[test]
    fn test_prune_last_guess_keeps_target_after_credit_fallback() {
        let json = r#"{
            "songs": {"S": {"name": "S", "artist_ids": ["G"]}},
            "artists": {"G": {"name": "G"}, "H": {"name": "H"}},
            "lives": {
                "L": {"name": "L", "song_ids": ["S"], "artist_ids": ["H"]},
                "M": {"name": "M", "song_ids": ["S"], "artist_ids": ["G"]},
                "N": {"name": "N", "song_ids": [], "artist_ids": ["G"]}
            }
        }"#;
        let cat = Catalogue::from_json_str(json, crate::LoadPolicy::Strict).unwrap();
        let mut session = GameSession::new(Arc::new(cat));
        session.start(Some("L")).unwrap();

        session.guess_song_only("S").unwrap();
        // (S, G) rescored against L is SongOnly, which rules out M and N
        assert_eq!(session.prune_last_guess().unwrap(), 1);
        assert!(session.candidates().contains("L"));
    }

    #[test]
    fn test_prune_last_guess_without_history_is_noop() {
        let mut session = started("L1");
        assert_eq!(session.prune_last_guess().unwrap(), 3);

        let mut unstarted = GameSession::new(Arc::new(scenario()));
        assert!(matches!(unstarted.prune_last_guess(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_best_moves_follow_candidates() {
        let mut session = started("L2");
        assert_eq!(session.best_moves(5).len(), 3);

        let feedback = session.guess_song("C", "Y").unwrap();
        session.prune_candidates("C", "Y", feedback).unwrap();
        // C (SONG_AND_ARTIST with Y) keeps L2 and L3
        assert_eq!(session.candidates().len(), 2);

        let moves = session.best_moves(5);
        assert!(moves.iter().all(|m| m.song_id != "C"));
        assert_eq!(moves[0].song_id, "B");
        assert!((moves[0].score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_history_entry_serializes_as_triple() {
        let entry = HistoryEntry {
            song_id: "A".to_string(),
            artist_id: "X".to_string(),
            feedback: Feedback::SongOnly,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(json, r#"["A","X",1]"#);
        let back: HistoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
