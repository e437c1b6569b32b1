//! # Manual QA CLI (`mqa`)
//!
//! ## Usage
//!
//! ```bash
//! mqa --config ./config/mqa.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mqa init` | Create the SQLite database and schema |
//! | `mqa ingest [DIR]` | Extract, chunk and embed manuals |
//! | `mqa ask "<question>"` | Answer a question from the manuals |
//! | `mqa context "<question>"` | Show the ranked context without generating |
//! | `mqa status` | Vector store size and model service reachability |
//! | `mqa feedback` | Record a rating for an answer |
//! | `mqa cache stats\|clear` | Inspect or empty the response cache |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use manual_qa::{assistant, cache_cmd, config, feedback, ingest, logging, migrate, status};

/// Manual QA: ask questions about your PDF manuals, answered by a local model.
#[derive(Parser)]
#[command(
    name = "mqa",
    about = "Manual QA: a local question-answering assistant over PDF manuals",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mqa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Ingest manuals from a directory.
    ///
    /// Re-ingesting a document replaces its previous chunks.
    Ingest {
        /// Directory to scan. Defaults to `[ingest] docs_dir`.
        dir: Option<PathBuf>,
    },

    /// Ask a question.
    Ask {
        /// The question.
        question: String,

        /// Print the answer, sources, context and timing as JSON.
        #[arg(long)]
        json: bool,

        /// Bypass the response cache for this question.
        #[arg(long)]
        no_cache: bool,
    },

    /// Show the ranked context that would be used for a question.
    Context {
        question: String,

        /// Number of context items. Defaults to `[retrieval] top_k`.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Report vector store size and model service status.
    Status {
        #[arg(long)]
        json: bool,
    },

    /// Record feedback about an answer.
    Feedback {
        #[arg(long)]
        query: String,

        #[arg(long)]
        answer: String,

        /// Rating from 1 (poor) to 5 (excellent).
        #[arg(long)]
        rating: u8,

        #[arg(long)]
        comment: Option<String>,
    },

    /// Manage the response cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry count and bound.
    Stats,
    /// Delete every cached response.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { dir } => {
            ingest::run_ingest(&cfg, dir).await?;
        }
        Commands::Ask {
            question,
            json,
            no_cache,
        } => {
            assistant::run_ask(&cfg, &question, json, no_cache).await?;
        }
        Commands::Context { question, limit } => {
            assistant::run_context(&cfg, &question, limit).await?;
        }
        Commands::Status { json } => {
            status::run_status(&cfg, json).await?;
        }
        Commands::Feedback {
            query,
            answer,
            rating,
            comment,
        } => {
            feedback::run_feedback(&cfg, query, answer, rating, comment).await?;
        }
        Commands::Cache { action } => match action {
            CacheAction::Stats => cache_cmd::run_cache_stats(&cfg).await?,
            CacheAction::Clear => cache_cmd::run_cache_clear(&cfg).await?,
        },
    }

    Ok(())
}
