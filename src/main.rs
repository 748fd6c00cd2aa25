//! # Rowdex CLI (`rdx`)
//!
//! The `rdx` binary is the interface to Rowdex. It provides commands for
//! database initialization, incremental indexing, ranked search, record
//! retrieval, and index statistics.
//!
//! ## Usage
//!
//! ```bash
//! rdx --config ./rowdex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rdx init` | Create the SQLite database and run schema migrations |
//! | `rdx index` | Index new and changed files under the configured root |
//! | `rdx search "<query>"` | Search indexed rows |
//! | `rdx get <id>` | Retrieve a full record by ID |
//! | `rdx stats` | Print index statistics |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! rdx init --config ./rowdex.toml
//!
//! # Index the configured directory (skips unchanged files)
//! rdx index --config ./rowdex.toml
//!
//! # Re-derive everything regardless of fingerprints
//! rdx index --full
//!
//! # Search, restricted to one sheet
//! rdx search "Lima" --sheet Clients --limit 10
//!
//! # Search within files whose path contains a substring
//! rdx search "invoice" --file 2024/
//! ```

mod config;
mod db;
mod error;
mod extract;
mod fingerprint;
mod get;
mod ingest;
mod migrate;
mod models;
mod rows;
mod scan;
mod search;
mod stats;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Rowdex CLI — a local-first incremental indexer and full-text search
/// engine for spreadsheet and CSV rows.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file with `[db]`, `[indexing]`, and `[retrieval]` sections.
#[derive(Parser)]
#[command(
    name = "rdx",
    about = "Rowdex — incremental indexing and full-text search for spreadsheet and CSV rows",
    version,
    long_about = "Rowdex fingerprints tabular files (XLSX, CSV), flattens their rows into \
    searchable records stored in SQLite with an FTS5 index, and answers ranked queries \
    that combine text relevance with a recency boost. Re-indexing only touches files \
    whose fingerprint changed."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./rowdex.toml`. Database location, indexing root, glob
    /// filters, and retrieval tuning are all read from this file.
    #[arg(long, global = true, default_value = "./rowdex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables
    /// (files, records, records_fts). This command is idempotent —
    /// running it multiple times is safe.
    Init,

    /// Index new and changed files.
    ///
    /// Scans the configured root for tabular files, skips files whose
    /// fingerprint (size, mtime, head hash) is unchanged, and replaces all
    /// records of files that changed. Per-file failures are reported and
    /// do not abort the run.
    Index {
        /// Ignore stored fingerprints — re-derive records for every file.
        #[arg(long)]
        full: bool,

        /// Show file and row counts without writing to the database.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of files to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search indexed rows.
    ///
    /// Runs an FTS5 match over record text and returns results ranked by
    /// combined relevance/recency score (lower is better), with matched
    /// terms highlighted in the snippet.
    Search {
        /// The search query string (FTS5 syntax: terms, "phrases", AND/OR).
        query: String,

        /// Only match records whose file path contains this substring
        /// (case-insensitive).
        #[arg(long)]
        file: Option<String>,

        /// Only match records from this exact sheet name.
        #[arg(long)]
        sheet: Option<String>,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Retrieve a record by its ID.
    ///
    /// Prints the record's source file, sheet, row number, column headers,
    /// and full flattened text.
    Get {
        /// Record ID (as shown in search results).
        id: i64,
    },

    /// Print index statistics.
    ///
    /// Shows file and record counts, a per-file breakdown, and the
    /// database size.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Index {
            full,
            dry_run,
            limit,
        } => {
            ingest::run_index(&cfg, full, dry_run, limit).await?;
        }
        Commands::Search {
            query,
            file,
            sheet,
            limit,
        } => {
            search::run_search(&cfg, &query, file, sheet, limit).await?;
        }
        Commands::Get { id } => {
            get::run_get(&cfg, id).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
