//! Per-file failure taxonomy for indexing runs.
//!
//! A failure on one file never aborts the run; it is collected into the
//! [`RunSummary`](crate::ingest::RunSummary) with its path so callers can
//! assert on failure counts.

/// What went wrong while indexing a single file.
#[derive(Debug)]
pub enum IndexError {
    /// The file could not be opened or read.
    Io(String),
    /// The file was readable but its table structure could not be parsed.
    Parse(String),
    /// The catalog write failed; the file's transaction was rolled back.
    Storage(String),
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::Io(e) => write!(f, "read failed: {}", e),
            IndexError::Parse(e) => write!(f, "parse failed: {}", e),
            IndexError::Storage(e) => write!(f, "storage failed: {}", e),
        }
    }
}

impl std::error::Error for IndexError {}

impl From<std::io::Error> for IndexError {
    fn from(e: std::io::Error) -> Self {
        IndexError::Io(e.to_string())
    }
}

impl From<sqlx::Error> for IndexError {
    fn from(e: sqlx::Error) -> Self {
        IndexError::Storage(e.to_string())
    }
}
