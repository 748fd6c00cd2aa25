//! Database statistics and health overview.
//!
//! Quick summary of what's indexed: file and record counts, a per-file
//! breakdown, and database size. Used by `rdx stats` to confirm indexing
//! runs are keeping the catalog current.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Per-file breakdown of record and sheet counts.
struct FileStats {
    path: String,
    sheet_count: i64,
    record_count: i64,
    indexed_at: i64,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_files: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
        .fetch_one(&pool)
        .await?;

    let total_records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Rowdex — Database Stats");
    println!("=======================");
    println!();
    println!("  Database:  {}", config.db.path.display());
    println!("  Size:      {}", format_bytes(db_size));
    println!();
    println!("  Files:     {}", total_files);
    println!("  Records:   {}", total_records);

    let file_rows = sqlx::query(
        r#"
        SELECT
            f.path,
            f.indexed_at,
            COUNT(DISTINCT r.sheet) AS sheet_count,
            COUNT(r.id) AS record_count
        FROM files f
        LEFT JOIN records r ON r.file_id = f.id
        GROUP BY f.id
        ORDER BY record_count DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let file_stats: Vec<FileStats> = file_rows
        .iter()
        .map(|row| FileStats {
            path: row.get("path"),
            sheet_count: row.get("sheet_count"),
            record_count: row.get("record_count"),
            indexed_at: row.get("indexed_at"),
        })
        .collect();

    if !file_stats.is_empty() {
        println!();
        println!("  By file:");
        println!(
            "  {:<48} {:>6} {:>8}   {}",
            "FILE", "SHEETS", "RECORDS", "INDEXED"
        );
        println!("  {}", "-".repeat(76));

        for s in &file_stats {
            println!(
                "  {:<48} {:>6} {:>8}   {}",
                s.path,
                s.sheet_count,
                s.record_count,
                format_ts_relative(s.indexed_at)
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
