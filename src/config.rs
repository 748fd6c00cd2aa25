use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexingConfig {
    /// Root directory scanned for tabular source files.
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Number of leading bytes hashed for the content fingerprint. Edits
    /// confined to bytes beyond this window are only caught via mtime.
    #[serde(default = "default_head_bytes")]
    pub fingerprint_head_bytes: usize,
    /// Whether rows whose every cell is empty still get a record. Keeping
    /// them preserves the row-number mapping back to the source sheet.
    #[serde(default = "default_keep_empty_rows")]
    pub keep_empty_rows: bool,
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.csv".to_string(), "**/*.xlsx".to_string()]
}
fn default_head_bytes() -> usize {
    64 * 1024
}
fn default_keep_empty_rows() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Weight of the recency boost relative to FTS5 relevance.
    #[serde(default = "default_recency_weight")]
    pub recency_weight: f64,
    /// Days until the recency boost decays to zero.
    #[serde(default = "default_recency_horizon_days")]
    pub recency_horizon_days: f64,
    /// FTS5 snippet context window, in tokens.
    #[serde(default = "default_snippet_tokens")]
    pub snippet_tokens: i64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            recency_weight: default_recency_weight(),
            recency_horizon_days: default_recency_horizon_days(),
            snippet_tokens: default_snippet_tokens(),
        }
    }
}

fn default_limit() -> i64 {
    50
}
fn default_recency_weight() -> f64 {
    2.0
}
fn default_recency_horizon_days() -> f64 {
    3650.0
}
fn default_snippet_tokens() -> i64 {
    16
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.indexing.fingerprint_head_bytes == 0 {
        anyhow::bail!("indexing.fingerprint_head_bytes must be > 0");
    }

    if config.retrieval.limit < 1 {
        anyhow::bail!("retrieval.limit must be >= 1");
    }

    if config.retrieval.recency_weight < 0.0 {
        anyhow::bail!("retrieval.recency_weight must be >= 0");
    }

    if config.retrieval.recency_horizon_days <= 0.0 {
        anyhow::bail!("retrieval.recency_horizon_days must be > 0");
    }

    // FTS5 snippet() accepts at most 64 tokens of context
    if !(1..=64).contains(&config.retrieval.snippet_tokens) {
        anyhow::bail!("retrieval.snippet_tokens must be in 1..=64");
    }

    Ok(config)
}
