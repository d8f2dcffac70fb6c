//! # MCPDict CLI (`mcpdict`)
//!
//! The `mcpdict` binary wraps the full build-and-serve lifecycle of the
//! MCPDict pronunciation database.
//!
//! ## Usage
//!
//! ```bash
//! mcpdict --config ./config/mcpdict.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mcpdict build` | Clone/update the upstream dataset and run its build tool |
//! | `mcpdict stamp` | Write the `info_rowid` table and a build-version marker |
//! | `mcpdict check` | Verify the database is complete and stamped |
//! | `mcpdict serve` | Start the read-only HTTP query API |
//!
//! ## Examples
//!
//! ```bash
//! # Full build-to-serve cycle
//! mcpdict build --config ./config/mcpdict.toml
//! mcpdict stamp --config ./config/mcpdict.toml
//! mcpdict check --config ./config/mcpdict.toml
//! mcpdict serve --config ./config/mcpdict.toml
//! ```

mod check;
mod config;
mod db;
mod models;
mod query;
mod server;
mod stamp;
mod upstream;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MCPDict: build, stamp, and serve the Chinese-dialect pronunciation
/// database.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/mcpdict.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "mcpdict",
    about = "Build, stamp, and serve the MCPDict pronunciation database",
    version,
    long_about = "mcpdict wraps the upstream MCPDict dataset project: it clones the \
    upstream repository, runs its build tool to produce a SQLite database, stamps the \
    result with a build-version marker, and serves read-only character-lookup queries \
    over HTTP."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/mcpdict.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Clone or update the upstream dataset repository and run its build tool.
    ///
    /// The upstream project owns the database generation logic; this command
    /// only drives it and copies the produced file to the configured path.
    /// Any clone, build, or artifact failure exits non-zero.
    Build,

    /// Stamp the built database with a version marker.
    ///
    /// Materializes the `info_rowid` lookup table and writes the build
    /// timestamp into `build_version`. Fails when the expected upstream
    /// tables are missing.
    Stamp,

    /// Verify the database is complete and stamped.
    ///
    /// The pre-packaging gate: checks all expected tables and the version
    /// marker, and prints a summary.
    Check,

    /// Start the read-only HTTP query API.
    ///
    /// Serves `GET /list-langs/` and `GET /chars/` from the stamped database
    /// until the process is terminated.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Build => {
            upstream::run_build(&cfg)?;
        }
        Commands::Stamp => {
            stamp::run_stamp(&cfg.db.path).await?;
        }
        Commands::Check => {
            check::run_check(&cfg.db.path).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
