//! Record retrieval by ID.
//!
//! Fetches one indexed record with its owning file's metadata, for tracing
//! a search hit back to the exact sheet and row it came from.

use anyhow::{bail, Result};
use sqlx::Row;

use crate::config::Config;
use crate::db;

#[derive(Debug, Clone)]
pub struct RecordDetail {
    pub id: i64,
    pub path: String,
    pub sheet: String,
    pub row_idx: i64,
    pub header_sig: String,
    pub text: String,
    pub created_at: String, // ISO8601
    pub file_mtime: String, // ISO8601
}

/// Core get function returning structured data.
pub async fn get_record(config: &Config, id: i64) -> Result<RecordDetail> {
    let pool = db::connect(config).await?;

    let row = sqlx::query(
        r#"
        SELECT r.id, f.path, r.sheet, r.row_idx, r.header_sig, r.text,
               r.created_at, f.mtime
        FROM records r
        JOIN files f ON f.id = r.file_id
        WHERE r.id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => {
            pool.close().await;
            bail!("record not found: {}", id);
        }
    };

    let created_at: i64 = row.get("created_at");
    let mtime: i64 = row.get("mtime");

    let detail = RecordDetail {
        id: row.get("id"),
        path: row.get("path"),
        sheet: row.get("sheet"),
        row_idx: row.get("row_idx"),
        header_sig: row.get("header_sig"),
        text: row.get("text"),
        created_at: format_ts_iso(created_at),
        file_mtime: format_ts_iso(mtime),
    };

    pool.close().await;
    Ok(detail)
}

/// CLI entry point — calls get_record and prints to stdout.
pub async fn run_get(config: &Config, id: i64) -> Result<()> {
    let record = get_record(config, id).await?;

    println!("--- Record ---");
    println!("id:         {}", record.id);
    println!("file:       {}", record.path);
    println!("sheet:      {}", record.sheet);
    println!("row:        {}", record.row_idx);
    println!("headers:    {}", record.header_sig);
    println!("indexed:    {}", record.created_at);
    println!("file mtime: {}", record.file_mtime);
    println!();
    println!("--- Text ---");
    println!("{}", record.text);

    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
