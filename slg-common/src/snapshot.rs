//! Serialized session state
//!
//! The snapshot is the whole state carried between turns by a stateless
//! front-end. Solved state is not stored: a session is solved exactly when
//! its target appears among the guessed lives.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalogue::Catalogue;
use crate::error::{Error, Result};
use crate::session::{GameSession, GameStatus, HistoryEntry};
use crate::{LiveId, SongId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub target_live_id: LiveId,
    pub possible_live_ids: Vec<LiveId>,
    pub guessed_song_ids: Vec<SongId>,
    pub guessed_live_ids: Vec<LiveId>,
    pub history: Vec<HistoryEntry>,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }
}

impl GameSession {
    /// Capture the session state; fails on an unstarted session
    pub fn snapshot(&self) -> Result<SessionSnapshot> {
        let target = self
            .target_live_id
            .clone()
            .ok_or_else(|| Error::InvalidState("Game not started".to_string()))?;

        Ok(SessionSnapshot {
            target_live_id: target,
            possible_live_ids: self.candidates.iter().cloned().collect(),
            guessed_song_ids: self.guessed_song_ids.iter().cloned().collect(),
            guessed_live_ids: self.guessed_live_ids.iter().cloned().collect(),
            history: self.history.clone(),
        })
    }

    /// Rebuild a session from a snapshot, validating it against `catalogue`
    pub fn restore(catalogue: Arc<Catalogue>, snapshot: SessionSnapshot) -> Result<Self> {
        let target = snapshot.target_live_id;
        if catalogue.live(&target).is_none() {
            return Err(Error::InvalidSnapshot(format!("Unknown target live {}", target)));
        }

        let candidates: BTreeSet<LiveId> = snapshot.possible_live_ids.into_iter().collect();
        if let Some(bad) = candidates.iter().find(|id| catalogue.live(id).is_none()) {
            return Err(Error::InvalidSnapshot(format!("Unknown candidate live {}", bad)));
        }
        if !candidates.contains(&target) {
            return Err(Error::InvalidSnapshot(
                "Target live missing from candidates".to_string(),
            ));
        }

        let guessed_live_ids: BTreeSet<LiveId> = snapshot.guessed_live_ids.into_iter().collect();
        if let Some(bad) = guessed_live_ids.iter().find(|id| catalogue.live(id).is_none()) {
            return Err(Error::InvalidSnapshot(format!("Unknown guessed live {}", bad)));
        }

        let guessed_song_ids: BTreeSet<SongId> = snapshot.guessed_song_ids.into_iter().collect();
        if let Some(bad) = guessed_song_ids.iter().find(|id| catalogue.song(id).is_none()) {
            return Err(Error::InvalidSnapshot(format!("Unknown guessed song {}", bad)));
        }
        if let Some(entry) = snapshot
            .history
            .iter()
            .find(|entry| !guessed_song_ids.contains(&entry.song_id))
        {
            return Err(Error::InvalidSnapshot(format!(
                "History song {} not among guessed songs",
                entry.song_id
            )));
        }

        let status = if guessed_live_ids.contains(&target) {
            GameStatus::Solved
        } else {
            GameStatus::InProgress
        };

        Ok(Self {
            catalogue,
            status,
            target_live_id: Some(target),
            candidates,
            guessed_song_ids,
            guessed_live_ids,
            history: snapshot.history,
        })
    }
}
