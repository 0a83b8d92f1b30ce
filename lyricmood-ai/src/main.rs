//! lyricmood - song lyrics emotion analysis
//!
//! Resolves songs through the lyrics catalog, scores their lyrics with the AI
//! inference service and prints the outcome as JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lyricmood_ai::catalog::{CatalogClient, SearchMode};
use lyricmood_ai::config::{resolve_catalog_token, resolve_inference_api_key};
use lyricmood_ai::inference::InferenceClient;
use lyricmood_ai::models::{AnalysisHistory, AnalysisStatus};
use lyricmood_ai::workflow::{LyricMoodPipeline, SongRequest};
use lyricmood_common::config::{load_or_default, TomlConfig};
use lyricmood_common::logging::init_tracing;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "lyricmood", version, about = "Emotion analysis of song lyrics")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyse one song
    Analyze {
        #[arg(long)]
        song: String,
        #[arg(long)]
        artist: String,
    },
    /// Analyse every `Song - Artist` line of a file
    Batch {
        #[arg(long)]
        file: PathBuf,
    },
    /// Search the catalog without analysing
    Search {
        query: String,
        /// auto, artist, song or combined
        #[arg(long, default_value = "auto")]
        mode: SearchMode,
    },
    /// Verify credentials and connectivity of both services
    Check,
}

#[derive(Serialize)]
struct BatchReport<'a> {
    total: usize,
    successful: usize,
    success_rate: f64,
    sessions: &'a [lyricmood_ai::models::AnalysisSession],
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_or_default(cli.config.as_deref())?;
    init_tracing(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        built = env!("BUILD_TIMESTAMP"),
        profile = env!("BUILD_PROFILE"),
        "Starting lyricmood"
    );

    match cli.command {
        Command::Analyze { song, artist } => {
            let pipeline = build_pipeline(&config)?;
            let session = pipeline.run(&song, &artist).await;
            print_json(&session)?;

            if session.status() == AnalysisStatus::Failed {
                bail!(
                    "Analysis failed: {}",
                    session.error_message().unwrap_or("unknown error")
                );
            }
        }
        Command::Batch { file } => {
            let body = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read batch file {}", file.display()))?;
            let requests = SongRequest::parse_batch(&body)?;
            if requests.is_empty() {
                bail!("Batch file {} lists no songs", file.display());
            }

            let pipeline = build_pipeline(&config)?;
            let mut history = AnalysisHistory::new();
            for session in pipeline.run_batch(&requests).await {
                history.add(session);
            }

            print_json(&BatchReport {
                total: history.len(),
                successful: history.successful().len(),
                success_rate: history.success_rate(),
                sessions: history.sessions(),
            })?;
        }
        Command::Search { query, mode } => {
            let catalog = build_catalog(&config)?;
            let candidates = catalog.smart_search(&query, mode).await?;
            print_json(&candidates)?;
        }
        Command::Check => {
            let pipeline = build_pipeline(&config)?;
            pipeline.catalog().validate_connection().await?;
            pipeline.inference().validate_connection().await?;
            println!("Catalog and inference services reachable");
        }
    }

    Ok(())
}

fn build_catalog(config: &TomlConfig) -> Result<CatalogClient> {
    let token = resolve_catalog_token(config)?;
    Ok(CatalogClient::from_settings(&config.catalog, token)?)
}

fn build_pipeline(config: &TomlConfig) -> Result<LyricMoodPipeline> {
    let catalog = build_catalog(config)?;
    let api_key = resolve_inference_api_key(config)?;
    let inference = InferenceClient::new(&config.inference, api_key)?;
    Ok(LyricMoodPipeline::new(catalog, inference, config.batch.delay()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
