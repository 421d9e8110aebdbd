//! slg-web - browser front-end for the setlist guessing game
//!
//! Serves the JSON game API on localhost. Sessions travel with each request
//! as snapshots, so the server holds only the catalogue and the reranker.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use slg_common::config::{resolve_data_path, TomlConfig};
use slg_common::rerank::{InferenceContext, UniformReranker};
use slg_common::{Catalogue, FuzzyResolver, LoadPolicy};
use slg_web::{build_router, AppState};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RerankerKind {
    /// Disable the prediction endpoint
    None,
    /// Even split across remaining candidates
    Uniform,
}

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "slg-web")]
#[command(about = "Setlist guessing game web server")]
#[command(version)]
struct Args {
    /// Dataset JSON (songs, artists, lives)
    #[arg(short, long, env = "SLG_DATA")]
    data: Option<PathBuf>,

    /// Reranker index mappings JSON
    #[arg(short, long)]
    mappings: Option<PathBuf>,

    /// HTTP port (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Explicit config file (a broken one is an error; `SLG_CONFIG` is
    /// only a discovery hint and degrades to defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip lives that reference unknown songs instead of failing
    #[arg(long)]
    lenient: bool,

    /// Reranker backing the prediction endpoint
    #[arg(long, value_enum, default_value = "uniform")]
    reranker: RerankerKind,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TomlConfig::load_or_default(args.config.as_deref()).context("Failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    info!("Starting SLG web server (slg-web) v{}", env!("CARGO_PKG_VERSION"));

    let data_path = resolve_data_path(args.data.as_deref(), &config);
    let policy = if args.lenient {
        LoadPolicy::SkipInvalidLives
    } else {
        LoadPolicy::Strict
    };
    let catalogue = Arc::new(
        Catalogue::from_path(&data_path, policy)
            .with_context(|| format!("Failed to load catalogue from {}", data_path.display()))?,
    );
    info!(
        songs = catalogue.songs().len(),
        artists = catalogue.artists().len(),
        lives = catalogue.lives().len(),
        "✓ Catalogue loaded from {}",
        data_path.display()
    );

    let resolver = Arc::new(FuzzyResolver::new(config.game.fuzzy_cutoff));
    let mut state = AppState::new(catalogue.clone(), resolver, config.game.top_k);

    match args.reranker {
        RerankerKind::None => info!("Reranker disabled; prediction endpoint returns 503"),
        RerankerKind::Uniform => {
            let context = match args.mappings.as_ref().or(config.mappings_path.as_ref()) {
                Some(path) => match InferenceContext::from_path(path) {
                    Ok(context) => {
                        info!("✓ Loaded reranker mappings from {}", path.display());
                        context
                    }
                    Err(e) => {
                        warn!("Mappings unusable ({}), deriving them from the catalogue", e);
                        InferenceContext::from_catalogue(&catalogue)
                    }
                },
                None => InferenceContext::from_catalogue(&catalogue),
            };
            state = state.with_reranker(Arc::new(UniformReranker), Arc::new(context));
        }
    }

    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("slg-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
