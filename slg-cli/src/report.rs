//! Benchmark runs and their report
//!
//! A [`BenchmarkReport`] holds one [`AgentSummary`] per agent, all measured
//! over the same targets. It renders as a fixed-width table and exports to
//! JSON.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slg_common::{LiveId, Result};
use tracing::debug;

use crate::agents::Agent;

/// Aggregate results of one agent over a target list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub agent: String,
    pub games: usize,
    pub wins: usize,
    pub avg_turns: f64,
    /// Fraction of games solved (0.0-1.0)
    pub win_rate: f64,
    pub avg_time_secs: f64,
}

/// Benchmark session metadata plus per-agent summaries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Run start (ISO 8601)
    pub timestamp: DateTime<Utc>,
    pub data_path: String,
    pub seed: u64,
    pub max_turns: usize,
    pub targets: Vec<LiveId>,
    pub results: Vec<AgentSummary>,
}

/// Play every target once and aggregate
pub fn run_agent(agent: &mut dyn Agent, targets: &[LiveId]) -> Result<AgentSummary> {
    let mut total_turns = 0usize;
    let mut total_secs = 0.0f64;
    let mut wins = 0usize;

    for target in targets {
        let start = Instant::now();
        let outcome = agent.play(target)?;
        total_secs += start.elapsed().as_secs_f64();
        total_turns += outcome.turns;
        if outcome.solved {
            wins += 1;
        }
        debug!(agent = agent.name(), target = %target, solved = outcome.solved, turns = outcome.turns, "Game finished");
    }

    let games = targets.len();
    let per_game = |total: f64| if games == 0 { 0.0 } else { total / games as f64 };
    Ok(AgentSummary {
        agent: agent.name().to_string(),
        games,
        wins,
        avg_turns: per_game(total_turns as f64),
        win_rate: per_game(wins as f64),
        avg_time_secs: per_game(total_secs),
    })
}

impl BenchmarkReport {
    pub fn new(data_path: &Path, seed: u64, max_turns: usize, targets: Vec<LiveId>) -> Self {
        Self {
            timestamp: Utc::now(),
            data_path: data_path.display().to_string(),
            seed,
            max_turns,
            targets,
            results: Vec::new(),
        }
    }

    /// Results table, one row per agent
    pub fn format_table(&self) -> String {
        let rule = "-".repeat(60);
        let mut out = String::new();
        out.push_str(&format!("Benchmark: {} games\n", self.targets.len()));
        out.push_str(&rule);
        out.push('\n');
        out.push_str(&format!(
            "{:<15} | {:<10} | {:<10} | {:<12}\n",
            "Agent", "Avg Turns", "Win Rate", "Avg Time (s)"
        ));
        out.push_str(&rule);
        out.push('\n');
        for r in &self.results {
            out.push_str(&format!(
                "{:<15} | {:<10.2} | {:<10} | {:<12.4}\n",
                r.agent,
                r.avg_turns,
                format!("{:.0}%", r.win_rate * 100.0),
                r.avg_time_secs
            ));
        }
        out.push_str(&rule);
        out
    }

    /// Export report to JSON file
    pub fn export_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Import report from JSON file
    pub fn import_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }
}
