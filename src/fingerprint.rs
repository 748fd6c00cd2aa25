//! File change detection.
//!
//! A fingerprint is `(size, mtime, sha_head)` where `sha_head` hashes only
//! the first N bytes of the file. Hashing a bounded prefix keeps indexing
//! cheap on large workbooks; an edit confined to bytes past the window is
//! caught only if the size or mtime moved with it.

use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

use crate::error::IndexError;

/// Identity of a file's content at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub size: i64,
    pub mtime: i64,
    pub sha_head: String,
}

impl Fingerprint {
    /// The no-op fast path: mtime and content hash both unchanged.
    pub fn matches(&self, mtime: i64, sha_head: &str) -> bool {
        self.mtime == mtime && self.sha_head == sha_head
    }
}

/// Fingerprint a file by stat plus a SHA-256 over its first `head_bytes` bytes.
pub fn fingerprint_file(path: &Path, head_bytes: usize) -> Result<Fingerprint, IndexError> {
    let metadata = std::fs::metadata(path)?;
    let mtime = metadata
        .modified()?
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;

    let file = std::fs::File::open(path)?;
    let mut head = Vec::with_capacity(head_bytes.min(metadata.len() as usize));
    file.take(head_bytes as u64).read_to_end(&mut head)?;

    let mut hasher = Sha256::new();
    hasher.update(&head);
    let sha_head = format!("{:x}", hasher.finalize());

    Ok(Fingerprint {
        size: metadata.len() as i64,
        mtime,
        sha_head,
    })
}
