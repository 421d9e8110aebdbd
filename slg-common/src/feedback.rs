//! Feedback codes and the feedback oracle
//!
//! Artist correctness is judged against the live's aggregated roster, not
//! against the guessed song's own credits: a guest who performed anywhere in
//! the live counts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalogue::Live;

/// Wire code reported for a song id absent from the catalogue
pub const INVALID_FEEDBACK_CODE: i8 = -1;

/// Outcome of a song/artist guess against a live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Feedback {
    /// Song is not in the live's setlist
    NotPresent = 0,
    /// Song is in the setlist, artist is not in the roster
    SongOnly = 1,
    /// Song is in the setlist and artist is in the roster
    SongAndArtist = 2,
}

impl Feedback {
    pub const ALL: [Feedback; 3] = [Feedback::NotPresent, Feedback::SongOnly, Feedback::SongAndArtist];

    pub fn code(self) -> i8 {
        self as i8
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(Feedback::NotPresent),
            1 => Some(Feedback::SongOnly),
            2 => Some(Feedback::SongAndArtist),
            _ => None,
        }
    }

    /// Whether the guessed song was in the live
    pub fn song_hit(self) -> bool {
        self != Feedback::NotPresent
    }

    /// Short label for history displays
    pub fn label(self) -> &'static str {
        match self {
            Feedback::NotPresent => "MISS",
            Feedback::SongOnly => "SONG OK",
            Feedback::SongAndArtist => "PERFECT",
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Feedback> for i8 {
    fn from(feedback: Feedback) -> Self {
        feedback.code()
    }
}

impl TryFrom<i8> for Feedback {
    type Error = String;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        Feedback::from_code(code).ok_or_else(|| format!("invalid feedback code {}", code))
    }
}

/// Score a guess against a live
///
/// Pure and deterministic; used both to answer guesses against the target
/// and to simulate candidate lives while pruning.
pub fn score(song_id: &str, artist_id: &str, live: &Live) -> Feedback {
    if !live.contains_song(song_id) {
        Feedback::NotPresent
    } else if live.has_artist(artist_id) {
        Feedback::SongAndArtist
    } else {
        Feedback::SongOnly
    }
}
