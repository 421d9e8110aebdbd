//! slg-cli library - terminal front-ends for the setlist guessing game
//!
//! - `play`: interactive game loop (`slg-play`)
//! - `agents`: automated players (`slg-bench`)
//! - `report`: benchmark aggregation, table output and JSON export

pub mod agents;
pub mod play;
pub mod report;

pub use agents::{Agent, GameOutcome, HybridAgent, PureAlgoAgent};
pub use play::{PlayEnd, PlayOptions};
pub use report::{AgentSummary, BenchmarkReport};

#[cfg(test)]
pub(crate) mod test_support {
    use slg_common::{Catalogue, LoadPolicy};

    /// L1{A,B; X}, L2{B,C; Y}, L3{C; X,Y}
    pub const SCENARIO_JSON: &str = r#"{
        "songs": {
            "A": {"name": "Song A", "artist_ids": ["X"]},
            "B": {"name": "Song B", "artist_ids": ["X", "Y"]},
            "C": {"name": "Song C", "artist_ids": ["Y"]}
        },
        "artists": {
            "X": {"name": "Artist X"},
            "Y": {"name": "Artist Y"}
        },
        "lives": {
            "L1": {"name": "Live One", "song_ids": ["A", "B"], "artist_ids": ["X"]},
            "L2": {"name": "Live Two", "song_ids": ["B", "C"], "artist_ids": ["Y"]},
            "L3": {"name": "Live Three", "song_ids": ["C"], "artist_ids": ["X", "Y"]}
        }
    }"#;

    pub fn scenario() -> Catalogue {
        Catalogue::from_json_str(SCENARIO_JSON, LoadPolicy::Strict).unwrap()
    }
}
