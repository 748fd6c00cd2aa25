//! Ranked full-text queries over indexed row records.
//!
//! FTS5 supplies the match set, its native bm25 rank (lower is more
//! relevant), and highlighted snippets. The combined score subtracts a
//! recency boost derived from the source file's mtime, so recently modified
//! files rank strictly better than stale ones with equal text relevance.
//! Filters and scoring run in the engine, not in SQL, to keep the FTS layer
//! a plain match-and-rank primitive.

use anyhow::{bail, Context, Result};
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::models::SearchHit;

/// Seconds per day, for mtime age computation.
const DAY_SECS: f64 = 86_400.0;

/// Linear recency decay: 1.0 at `now`, 0.0 at the horizon and beyond.
/// Clamped so files with future mtimes cannot exceed the maximum boost.
pub fn recency_boost(mtime: i64, now: i64, horizon_days: f64) -> f64 {
    let age_days = (now - mtime) as f64 / DAY_SECS;
    (1.0 - age_days / horizon_days).clamp(0.0, 1.0)
}

/// Combined score, lower is better: bm25 rank minus the weighted boost.
pub fn combined_score(rank: f64, boost: f64, weight: f64) -> f64 {
    rank - weight * boost
}

pub async fn search_records(
    pool: &SqlitePool,
    config: &Config,
    query: &str,
    file_filter: Option<&str>,
    sheet_filter: Option<&str>,
    limit: i64,
    now: i64,
) -> Result<Vec<SearchHit>> {
    if query.trim().is_empty() {
        bail!("Query must not be empty");
    }

    // snippet() arguments must be literals; the token count is validated
    // at config load (1..=64).
    let sql = format!(
        r#"
        SELECT r.id AS record_id, f.path, r.sheet, r.row_idx, r.text, f.mtime,
               snippet(records_fts, 1, '<b>', '</b>', '…', {}) AS snippet,
               rank
        FROM records_fts
        JOIN records r ON r.id = records_fts.record_id
        JOIN files f ON f.id = r.file_id
        WHERE records_fts MATCH ?
        "#,
        config.retrieval.snippet_tokens
    );

    let rows = sqlx::query(&sql)
        .bind(query)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Invalid query expression: {}", query))?;

    let file_filter_lower = file_filter.map(|f| f.to_lowercase());

    let mut hits: Vec<SearchHit> = rows
        .iter()
        .filter_map(|row| {
            let path: String = row.get("path");
            let sheet: String = row.get("sheet");

            // Case-insensitive substring over the file path
            if let Some(ref needle) = file_filter_lower {
                if !path.to_lowercase().contains(needle) {
                    return None;
                }
            }

            // Exact sheet name match
            if let Some(wanted) = sheet_filter {
                if sheet != wanted {
                    return None;
                }
            }

            let rank: f64 = row.get("rank");
            let mtime: i64 = row.get("mtime");
            let boost = recency_boost(mtime, now, config.retrieval.recency_horizon_days);

            Some(SearchHit {
                record_id: row.get("record_id"),
                path,
                sheet,
                row_idx: row.get("row_idx"),
                text: row.get("text"),
                snippet: row.get("snippet"),
                score: combined_score(rank, boost, config.retrieval.recency_weight),
            })
        })
        .collect();

    // Sort: score asc (lower = better), record id asc (deterministic)
    hits.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.record_id.cmp(&b.record_id))
    });

    // A negative limit would wrap when cast; treat it as zero.
    hits.truncate(limit.max(0) as usize);

    Ok(hits)
}

/// CLI entry point — runs the query and prints ranked results.
pub async fn run_search(
    config: &Config,
    query: &str,
    file_filter: Option<String>,
    sheet_filter: Option<String>,
    limit: Option<i64>,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let limit = limit.unwrap_or(config.retrieval.limit);
    let now = chrono::Utc::now().timestamp();

    let hits = match search_records(
        &pool,
        config,
        query,
        file_filter.as_deref(),
        sheet_filter.as_deref(),
        limit,
        now,
    )
    .await
    {
        Ok(hits) => hits,
        Err(e) => {
            pool.close().await;
            return Err(e);
        }
    };

    if hits.is_empty() {
        println!("No results.");
        pool.close().await;
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. [{:.2}] {} / {} / row {}",
            i + 1,
            hit.score,
            hit.path,
            hit.sheet,
            hit.row_idx
        );
        println!("    match: \"{}\"", hit.snippet.replace('\n', " ").trim());
        println!("    id: {}", hit.record_id);
        println!();
    }

    pool.close().await;
    Ok(())
}
