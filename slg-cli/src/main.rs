//! slg-play - play the setlist guessing game in a terminal

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use slg_cli::play::{self, PlayEnd, PlayOptions};
use slg_common::config::{resolve_data_path, TomlConfig};
use slg_common::{Catalogue, ExactResolver, FuzzyResolver, GameSession, LoadPolicy, NameResolver};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "slg-play")]
#[command(about = "Guess the live concert from its setlist")]
#[command(version)]
struct Args {
    /// Dataset JSON (songs, artists, lives)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Play against this live id instead of a random one
    #[arg(short, long)]
    target: Option<String>,

    /// Explicit config file (a broken one is an error; `SLG_CONFIG` is
    /// only a discovery hint and degrades to defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Do not narrow candidates after guesses
    #[arg(long)]
    no_assist: bool,

    /// Only accept exact names
    #[arg(long)]
    exact: bool,

    /// Skip lives that reference unknown songs instead of failing
    #[arg(long)]
    lenient: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;

    // Logs go to stderr so they never interleave with the game prompts
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    info!("Starting SLG terminal game (slg-play) v{}", env!("CARGO_PKG_VERSION"));

    let data_path = resolve_data_path(args.data.as_deref(), &config);
    let policy = if args.lenient {
        LoadPolicy::SkipInvalidLives
    } else {
        LoadPolicy::Strict
    };
    let catalogue = Catalogue::from_path(&data_path, policy)
        .with_context(|| format!("Failed to load catalogue from {}", data_path.display()))?;

    let resolver: Box<dyn NameResolver> = if args.exact {
        Box::new(ExactResolver)
    } else {
        Box::new(FuzzyResolver::new(config.game.fuzzy_cutoff))
    };
    let options = PlayOptions {
        top_k: config.game.top_k,
        assisted: !args.no_assist,
    };

    let mut session = GameSession::new(Arc::new(catalogue));
    session.start(args.target.as_deref())?;

    let stdin = io::stdin();
    let end = play::run(&mut session, resolver.as_ref(), options, stdin.lock(), io::stdout())?;
    info!(solved = end == PlayEnd::Solved, guesses = session.history().len(), "Game over");

    Ok(())
}
