//! Mnemos CLI — the main entry point.
//!
//! Commands:
//! - `optimize` — Collapse reminder boilerplate and bound a query
//! - `persona`  — Parse a persona file into its eight sections
//! - `validate` — Validate the embedding and project configs
//! - `recall`   — Run a query through the full pipeline
//! - `doctor`   — Diagnose configuration health

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "mnemos",
    about = "Mnemos — pre-retrieval normalization for conversational memory",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Optimize a query (reads stdin when no query is given)
    Optimize {
        query: Option<String>,

        /// Maximum length in characters before truncation
        #[arg(long, default_value_t = mnemos_core::MAX_LENGTH)]
        max_length: usize,
    },

    /// Parse a persona file and print its sections as JSON
    Persona {
        path: PathBuf,

        /// Print the rendered system-prompt block instead of JSON
        #[arg(long)]
        prompt: bool,
    },

    /// Validate the embedding and project configuration documents
    Validate {
        /// Embedding config path (default: ~/.mnemos/embedding.toml)
        #[arg(long, env = "MNEMOS_EMBEDDING_CONFIG")]
        embedding: Option<PathBuf>,

        /// Project config path (default: ~/.mnemos/project.toml)
        #[arg(long, env = "MNEMOS_PROJECT_CONFIG")]
        project: Option<PathBuf>,

        /// Validate --document against this schema file instead
        #[arg(long, requires = "document")]
        schema: Option<PathBuf>,

        /// Document checked against --schema
        #[arg(long, requires = "schema")]
        document: Option<PathBuf>,
    },

    /// Recall memories for a query through the full pipeline
    Recall {
        query: String,

        /// Maximum number of memories to return
        #[arg(short, long, default_value_t = 5)]
        limit: usize,

        /// Text file with one memory per line to seed the in-memory backend
        #[arg(short, long)]
        memory: Option<PathBuf>,

        #[arg(long, env = "MNEMOS_EMBEDDING_CONFIG")]
        embedding: Option<PathBuf>,

        #[arg(long, env = "MNEMOS_PROJECT_CONFIG")]
        project: Option<PathBuf>,
    },

    /// Diagnose configuration health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Optimize { query, max_length } => {
            commands::optimize::run(query, max_length).await?
        }
        Commands::Persona { path, prompt } => commands::persona::run(&path, prompt).await?,
        Commands::Validate {
            embedding,
            project,
            schema,
            document,
        } => commands::validate::run(embedding, project, schema.zip(document)).await?,
        Commands::Recall {
            query,
            limit,
            memory,
            embedding,
            project,
        } => commands::recall::run(&query, limit, memory, embedding, project).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
