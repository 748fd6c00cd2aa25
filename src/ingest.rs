//! Incremental indexing run.
//!
//! Coordinates the full pass: scan → fingerprint → extract → flatten →
//! store. Unchanged files are skipped via their stored fingerprint; changed
//! files have all their records replaced inside one transaction, so a
//! failure mid-file leaves the previous index state intact. Per-file
//! failures are collected into the run summary and never abort the run.

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::db;
use crate::error::IndexError;
use crate::extract::{self, ExtractError};
use crate::fingerprint;
use crate::models::RowRecord;
use crate::rows;
use crate::scan;

/// Outcome of indexing one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Fingerprint matched the stored one; nothing was written.
    Unchanged,
    /// Records were replaced; carries the new record count.
    Indexed { records: u64 },
}

/// Aggregate result of an indexing run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub indexed: u64,
    pub unchanged: u64,
    pub records_written: u64,
    pub failures: Vec<(PathBuf, IndexError)>,
}

pub async fn run_index(
    config: &Config,
    full: bool,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<RunSummary> {
    let mut files = scan::scan_files(config)?;

    if let Some(lim) = limit {
        files.truncate(lim);
    }

    if dry_run {
        let mut estimated_records = 0usize;
        let mut would_fail = 0usize;
        for path in &files {
            match extract::extract_tables(path) {
                Ok(tables) => {
                    estimated_records += tables.iter().map(|t| t.rows.len()).sum::<usize>();
                }
                Err(e) => {
                    eprintln!("warning: {}: {}", path.display(), e);
                    would_fail += 1;
                }
            }
        }
        println!("index (dry-run)");
        println!("  files found: {}", files.len());
        println!("  estimated records: {}", estimated_records);
        println!("  would fail: {}", would_fail);
        return Ok(RunSummary::default());
    }

    let pool = db::connect(config).await?;
    let now = chrono::Utc::now().timestamp();

    let mut summary = RunSummary::default();

    for path in &files {
        match index_file(&pool, config, path, full, now).await {
            Ok(FileOutcome::Unchanged) => summary.unchanged += 1,
            Ok(FileOutcome::Indexed { records }) => {
                summary.indexed += 1;
                summary.records_written += records;
            }
            Err(e) => {
                eprintln!("warning: {}: {}", path.display(), e);
                summary.failures.push((path.clone(), e));
            }
        }
    }

    println!("index");
    println!("  files found: {}", files.len());
    println!("  indexed: {}", summary.indexed);
    println!("  unchanged: {}", summary.unchanged);
    println!("  records written: {}", summary.records_written);
    println!("  failed: {}", summary.failures.len());
    println!("ok");

    pool.close().await;
    Ok(summary)
}

/// Index a single file. Change detection happens first; extraction happens
/// before any write so a parse failure cannot disturb the stored state; the
/// file-row update and record replacement commit atomically.
pub async fn index_file(
    pool: &SqlitePool,
    config: &Config,
    path: &Path,
    full: bool,
    now: i64,
) -> Result<FileOutcome, IndexError> {
    let fp = fingerprint::fingerprint_file(path, config.indexing.fingerprint_head_bytes)?;
    let path_str = path.to_string_lossy().to_string();

    let existing: Option<(i64, i64, String)> =
        sqlx::query_as("SELECT id, mtime, sha_head FROM files WHERE path = ?")
            .bind(&path_str)
            .fetch_optional(pool)
            .await?;

    if let Some((_, mtime, ref sha_head)) = existing {
        if fp.matches(mtime, sha_head) && !full {
            return Ok(FileOutcome::Unchanged);
        }
    }

    let tables = extract::extract_tables(path).map_err(|e| match e {
        ExtractError::Io(msg) => IndexError::Io(msg),
        other => IndexError::Parse(other.to_string()),
    })?;

    let records: Vec<RowRecord> = tables
        .iter()
        .flat_map(|t| rows::build_records(t, config.indexing.keep_empty_rows))
        .collect();

    let mut tx = pool.begin().await?;

    let file_id = match existing {
        Some((id, _, _)) => {
            sqlx::query(
                "UPDATE files SET size = ?, mtime = ?, sha_head = ?, indexed_at = ? WHERE id = ?",
            )
            .bind(fp.size)
            .bind(fp.mtime)
            .bind(&fp.sha_head)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

            // Replace-on-change: drop every prior record (and its FTS entry)
            // owned by this file before inserting the re-derived set.
            sqlx::query(
                "DELETE FROM records_fts WHERE record_id IN (SELECT id FROM records WHERE file_id = ?)",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
            sqlx::query("DELETE FROM records WHERE file_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            id
        }
        None => {
            let result = sqlx::query(
                "INSERT INTO files (path, size, mtime, sha_head, indexed_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&path_str)
            .bind(fp.size)
            .bind(fp.mtime)
            .bind(&fp.sha_head)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            result.last_insert_rowid()
        }
    };

    for record in &records {
        let result = sqlx::query(
            "INSERT INTO records (file_id, sheet, row_idx, header_sig, text, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(file_id)
        .bind(&record.sheet)
        .bind(record.row_idx)
        .bind(&record.header_sig)
        .bind(&record.text)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let record_id = result.last_insert_rowid();

        sqlx::query("INSERT INTO records_fts (record_id, text) VALUES (?, ?)")
            .bind(record_id)
            .bind(&record.text)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(FileOutcome::Indexed {
        records: records.len() as u64,
    })
}
