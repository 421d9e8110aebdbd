//! Candidate pruning
//!
//! Each candidate live is re-scored with the feedback oracle and kept only
//! when the simulated feedback equals the observed one. The true target
//! produced the observed feedback, so it always survives.

use std::collections::BTreeSet;

use tracing::{debug, error};

use crate::catalogue::Catalogue;
use crate::feedback::{score, Feedback};
use crate::LiveId;

/// Remove every candidate inconsistent with one feedback observation
///
/// Runs in time proportional to the current candidate count. Candidate ids
/// missing from the catalogue are dropped. Returns the number of lives
/// removed.
pub fn prune(
    catalogue: &Catalogue,
    candidates: &mut BTreeSet<LiveId>,
    song_id: &str,
    artist_id: &str,
    observed: Feedback,
) -> usize {
    let before = candidates.len();
    candidates.retain(|live_id| match catalogue.live(live_id) {
        Some(live) => score(song_id, artist_id, live) == observed,
        None => false,
    });
    let removed = before - candidates.len();

    debug!(
        song_id,
        artist_id,
        feedback = %observed,
        removed,
        remaining = candidates.len(),
        "Pruned candidates"
    );
    check_not_empty(candidates);
    removed
}

/// Remove a single live after a wrong live guess
///
/// Returns whether the live was still a candidate.
pub fn eliminate(candidates: &mut BTreeSet<LiveId>, live_id: &str) -> bool {
    let removed = candidates.remove(live_id);
    if removed {
        debug!(live_id, remaining = candidates.len(), "Eliminated live");
        check_not_empty(candidates);
    }
    removed
}

/// An empty candidate set means the caller pruned with feedback the oracle
/// never produced for this target.
fn check_not_empty(candidates: &BTreeSet<LiveId>) {
    if candidates.is_empty() {
        error!("Candidate set is empty: pruning was fed inconsistent feedback");
        debug_assert!(!candidates.is_empty(), "candidate set emptied by pruning");
    }
}
