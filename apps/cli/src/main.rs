//! Waypoint CLI
//!
//! Command-line interface for running flight-search queries through the
//! tool-use loop, the managed agent, or both side by side.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{agent, ask, compare, seed};

/// Waypoint - flight-search assistant driven by LLM tool use
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "wpt")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Configuration file (defaults to ~/.waypoint/config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Answer a question with the tool-use loop
    Ask {
        /// The user's question
        message: String,

        /// Iteration budget (overrides the configured value)
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Sampling temperature (overrides the configured value)
        #[arg(long)]
        temperature: Option<f32>,
    },

    /// Send a question to the managed agent
    Agent {
        /// The user's question
        message: String,

        /// Conversation session identifier (generated when omitted)
        #[arg(long)]
        session_id: Option<String>,
    },

    /// Run a question through both paths and report the difference
    Compare {
        /// The user's question
        message: String,
    },

    /// Load the sample flight schedule into a SQLite database
    Seed {
        /// Database file to create or update
        #[arg(long)]
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Results go to stdout; keep logs on stderr so output stays parseable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cfg = config::load_config(args.config.as_deref())?;

    match args.command {
        Command::Ask { message, max_iterations, temperature } => {
            ask::execute(&cfg, &message, max_iterations, temperature).await?;
        }
        Command::Agent { message, session_id } => {
            agent::execute(&cfg, &message, session_id).await?;
        }
        Command::Compare { message } => {
            compare::execute(&cfg, &message).await?;
        }
        Command::Seed { db } => {
            seed::execute(&db)?;
        }
    }

    Ok(())
}
