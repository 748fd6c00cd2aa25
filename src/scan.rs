use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::config::Config;

/// Walk the configured root and return every tabular source file matching
/// the include globs, sorted for deterministic run order.
pub fn scan_files(config: &Config) -> Result<Vec<PathBuf>> {
    let idx = &config.indexing;

    let root = &idx.root;
    if !root.exists() {
        bail!("Indexing root does not exist: {}", root.display());
    }

    let include_set = build_globset(&idx.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/~$*".to_string(), // Office lock files
    ];
    default_excludes.extend(idx.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(idx.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }

        if !include_set.is_match(&rel_str) {
            continue;
        }

        files.push(path.to_path_buf());
    }

    files.sort();

    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
