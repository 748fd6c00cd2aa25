//! # Rowdex
//!
//! A local-first incremental indexer and full-text search engine for
//! spreadsheet and CSV rows.
//!
//! Rowdex walks a directory of tabular files (XLSX, CSV), flattens every row
//! into a searchable text record, and stores records in SQLite with an FTS5
//! index. Files are fingerprinted (size + mtime + head hash) so re-indexing
//! only touches files that actually changed, and queries combine FTS5
//! relevance with a recency boost over the source file's modification time.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │  Scanner │──▶│ Fingerprint │──▶│ Row Extract │──▶│  SQLite   │
//! │ walk+glob│   │ skip if     │   │ CSV / XLSX  │   │ files     │
//! └──────────┘   │ unchanged   │   │ → records   │   │ records   │
//!                └─────────────┘   └─────────────┘   │ FTS5      │
//!                                                    └────┬─────┘
//!                                                         ▼
//!                                                   ranked search
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rdx init                      # create database
//! rdx index                     # index new/changed files
//! rdx search "Lima" --sheet Clients
//! rdx get 42                    # inspect one record
//! rdx stats                     # index overview
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`scan`] | Source file discovery |
//! | [`fingerprint`] | File change detection |
//! | [`extract`] | CSV/XLSX row extraction |
//! | [`rows`] | Row flattening into record text |
//! | [`ingest`] | Incremental indexing run |
//! | [`search`] | Ranked full-text queries |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod get;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod rows;
pub mod scan;
pub mod search;
pub mod stats;
