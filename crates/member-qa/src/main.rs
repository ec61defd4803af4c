//! # Member QA CLI (`mqa`)
//!
//! The `mqa` binary is the primary interface for Member QA. It can crawl
//! the upstream messages API into a local snapshot, inspect that
//! snapshot, answer a question one-shot, and serve the HTTP API.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mqa serve` | Start the HTTP API (`/ask`, `/health`) |
//! | `mqa fetch` | Crawl all upstream messages into the local snapshot |
//! | `mqa ask "<question>"` | Answer a single question in the terminal |
//! | `mqa stats` | Print a corpus summary from the snapshot |
//!
//! ## Examples
//!
//! ```bash
//! # Crawl the upstream API into data/messages_fetch_full.json
//! mqa fetch --limit 100 --delay-ms 200
//!
//! # Ask without starting a server
//! mqa ask "When is Layla planning her trip to London?"
//!
//! # Serve the HTTP API
//! mqa serve --config ./config/mqa.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use member_qa::cache::CorpusCache;
use member_qa::config::Config;
use member_qa::source::{HttpMessageSource, MessageSource};
use member_qa::{server, stats};
use member_qa_core::answer::answer_question;

/// Member QA — answer natural-language questions over member messages.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file; every setting has a default, so the flag is
/// optional.
#[derive(Parser)]
#[command(
    name = "mqa",
    about = "Member QA — a retrieval-and-answer service for member messages",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    ///
    /// Attempts one refresh before accepting traffic; if the upstream
    /// is unreachable the service still boots from the local snapshot
    /// (or an empty corpus) and retries once per TTL window.
    Serve,

    /// Crawl all upstream messages into the local snapshot.
    ///
    /// Resumes from the existing snapshot and deduplicates by message
    /// id, so re-running is safe and cheap.
    Fetch {
        /// Initial page size (halved automatically on client errors).
        #[arg(long)]
        limit: Option<usize>,

        /// Pause between page requests, in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Answer a single question in the terminal.
    Ask {
        /// The question to answer.
        question: String,
    },

    /// Print a corpus summary from the local snapshot.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Serve => server::run_server(&config).await,
        Commands::Fetch { limit, delay_ms } => run_fetch(&config, limit, delay_ms).await,
        Commands::Ask { question } => run_ask(&config, &question).await,
        Commands::Stats => stats::run_stats(&config),
    }
}

/// Crawl the upstream API into the snapshot and report what landed.
async fn run_fetch(config: &Config, limit: Option<usize>, delay_ms: Option<u64>) -> Result<()> {
    let mut source_config = config.source.clone();
    if let Some(limit) = limit {
        source_config.page_limit = limit;
    }
    if let Some(delay_ms) = delay_ms {
        source_config.page_delay_ms = delay_ms;
    }

    let source =
        HttpMessageSource::new(&source_config, Some(config.cache.snapshot_path.clone()))?;
    let messages = source.fetch_messages().await?;

    println!(
        "Wrote {} messages to {}",
        messages.len(),
        config.cache.snapshot_path.display()
    );
    Ok(())
}

/// One-shot question answering through the same cache the server uses.
async fn run_ask(config: &Config, question: &str) -> Result<()> {
    if question.trim().is_empty() {
        anyhow::bail!("question must not be empty");
    }

    let source = HttpMessageSource::new(
        &config.source,
        Some(config.cache.snapshot_path.clone()),
    )?;
    let cache = CorpusCache::new(
        Arc::new(source),
        config.cache.snapshot_paths(),
        Duration::from_secs(config.cache.ttl_secs),
        config.retrieval.max_features,
    );

    cache.ensure_fresh().await;
    let corpus = cache.current();

    let candidates = corpus.rank(question, config.retrieval.top_k);
    println!("{}", answer_question(question, candidates));
    Ok(())
}
