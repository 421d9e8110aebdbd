//! Agent benchmark and dataset utilities
//!
//! **Usage:**
//! ```bash
//! slg-bench [--data <file>] [--games 50] [--max-turns 20] [--seed 42] [--export <file>] [--split-moves]
//! slg-bench prune --data <in> --out <out>
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use slg_cli::agents::{Agent, HybridAgent, PureAlgoAgent};
use slg_cli::report::{run_agent, BenchmarkReport};
use slg_common::config::{resolve_data_path, TomlConfig};
use slg_common::rerank::{InferenceContext, UniformReranker};
use slg_common::{Catalogue, Dataset, LiveId, LoadPolicy};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Agent benchmark for the setlist guessing game
#[derive(Parser, Debug)]
#[command(name = "slg-bench")]
#[command(about = "Benchmark solver agents over sampled target lives")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Dataset JSON (songs, artists, lives)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Reranker index mappings JSON for the hybrid agent
    #[arg(short, long)]
    mappings: Option<PathBuf>,

    /// Number of target lives to sample (without replacement)
    #[arg(long, default_value = "50")]
    games: usize,

    /// Turn cap per game (defaults to the config file value)
    #[arg(long)]
    max_turns: Option<usize>,

    /// Seed for target sampling and agent fallbacks
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Export results to JSON file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Also run a hybrid agent that picks songs by reranker mass split
    #[arg(long)]
    split_moves: bool,

    /// Explicit config file (a broken one is an error; `SLG_CONFIG` is
    /// only a discovery hint and degrades to defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Drop songs and artists no live references
    Prune {
        /// Input dataset
        #[arg(long)]
        data: PathBuf,

        /// Output path for the pruned dataset
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SLG benchmark (slg-bench) v{}", env!("CARGO_PKG_VERSION"));

    match &args.command {
        Some(Command::Prune { data, out }) => prune_dataset(data, out),
        None => run_benchmark(&args, &config),
    }
}

fn prune_dataset(input: &Path, output: &Path) -> Result<()> {
    let dataset = Dataset::from_path(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let pruned = dataset.pruned();

    println!("Songs:   {} -> {}", dataset.songs.len(), pruned.songs.len());
    println!("Artists: {} -> {}", dataset.artists.len(), pruned.artists.len());
    println!("Lives:   {}", pruned.lives.len());

    pruned
        .write_to(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("\n✓ Pruned dataset written to: {}", output.display());
    Ok(())
}

fn run_benchmark(args: &Args, config: &TomlConfig) -> Result<()> {
    let data_path = resolve_data_path(args.data.as_deref(), config);
    let catalogue = Arc::new(
        Catalogue::from_path(&data_path, LoadPolicy::Strict)
            .with_context(|| format!("Failed to load catalogue from {}", data_path.display()))?,
    );
    let max_turns = args.max_turns.unwrap_or(config.game.max_turns);

    let mut rng = StdRng::seed_from_u64(args.seed);
    let games = args.games.min(catalogue.live_ids().len());
    if games < args.games {
        warn!(requested = args.games, available = games, "Fewer lives than requested games");
    }
    let targets: Vec<LiveId> = catalogue
        .live_ids()
        .choose_multiple(&mut rng, games)
        .cloned()
        .collect();

    let context = match args.mappings.as_ref().or(config.mappings_path.as_ref()) {
        Some(path) => InferenceContext::from_path(path)
            .with_context(|| format!("Failed to load mappings from {}", path.display()))?,
        None => InferenceContext::from_catalogue(&catalogue),
    };

    let context = Arc::new(context);
    let mut agents: Vec<Box<dyn Agent>> = vec![
        Box::new(PureAlgoAgent::new(catalogue.clone(), max_turns, args.seed)),
        Box::new(HybridAgent::new(
            catalogue.clone(),
            Arc::new(UniformReranker),
            context.clone(),
            max_turns,
            args.seed,
        )),
    ];
    if args.split_moves {
        agents.push(Box::new(
            HybridAgent::new(catalogue.clone(), Arc::new(UniformReranker), context, max_turns, args.seed)
                .with_split_moves(),
        ));
    }

    let mut report = BenchmarkReport::new(&data_path, args.seed, max_turns, targets);
    let start_time = Instant::now();
    for agent in agents.iter_mut() {
        info!(agent = agent.name(), games, "Running agent");
        let summary = run_agent(agent.as_mut(), &report.targets)?;
        report.results.push(summary);
    }

    println!("{}", report.format_table());

    if let Some(path) = &args.export {
        match report.export_json(path) {
            Ok(()) => println!("\n✓ Results exported to: {}", path.display()),
            Err(e) => error!("Failed to export results: {}", e),
        }
    }

    info!("Benchmark complete in {:.1} seconds", start_time.elapsed().as_secs_f64());
    Ok(())
}
