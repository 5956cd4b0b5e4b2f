//! # wordlebot CLI
//!
//! ## Usage
//!
//! ```bash
//! wordlebot --config ./config/wordlebot.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wordlebot init` | Create the SQLite database and run schema migrations |
//! | `wordlebot score "<text>"` | Parse and score one post offline |
//! | `wordlebot replay <file>` | Process recorded posts (JSON lines) |
//! | `wordlebot top <puzzle>` | Show the leaderboard for a puzzle |
//!
//! ## Examples
//!
//! ```bash
//! wordlebot init
//! wordlebot score "$(pbpaste)"
//! wordlebot score "Wordle 1,234 3/6" --alt "Line 1: 2 perfect"
//! wordlebot replay ./data/mentions.jsonl --dry-run
//! wordlebot top 1234 --limit 20
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use wordlebot::config::{load_config, Config};
use wordlebot::{leaderboard, logging, migrate, replay, score_cmd};

/// wordlebot: scores Wordle results shared on social networks.
#[derive(Parser)]
#[command(
    name = "wordlebot",
    about = "Scores Wordle results shared on social networks, once per post",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Not read by `score`, which needs no database.
    #[arg(long, global = true, default_value = "./config/wordlebot.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent; running it again is safe.
    Init,

    /// Parse and score one post without touching the database.
    Score {
        /// Post text.
        text: String,

        /// Image alt-text, in attachment order. Repeatable.
        #[arg(long = "alt")]
        alt_texts: Vec<String>,
    },

    /// Process recorded posts from a JSON-lines file.
    ///
    /// Each line is one post. A post with `parent_id` falls back to that
    /// post (looked up in the same file) when it has no result itself.
    Replay {
        /// Path to the JSON-lines file.
        file: PathBuf,

        /// Use an in-memory store instead of the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the highest scores for a puzzle.
    Top {
        /// Puzzle number.
        puzzle: u32,

        /// Maximum number of rows.
        #[arg(long, default_value = "10")]
        limit: i64,
    },
}

/// Load the config file and start logging with its filter.
fn setup(path: &Path) -> Result<Config> {
    let config = load_config(path)?;
    logging::init(&config.logging.filter);
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let config = setup(&cli.config)?;
            migrate::run_migrations(&config).await?;
            println!("Database initialized successfully.");
        }
        Commands::Score { text, alt_texts } => {
            logging::init("warn");
            score_cmd::run_score(&text, &alt_texts);
        }
        Commands::Replay { file, dry_run } => {
            let config = setup(&cli.config)?;
            replay::run_replay(&config, &file, dry_run).await?;
        }
        Commands::Top { puzzle, limit } => {
            let config = setup(&cli.config)?;
            leaderboard::run_top(&config, puzzle, limit).await?;
        }
    }

    Ok(())
}
