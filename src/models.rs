//! Core data models used throughout Rowdex.
//!
//! These types represent the tables, row records, and search results that
//! flow through the indexing and retrieval pipeline.

/// One named table extracted from a source file: a CSV yields exactly one,
/// an XLSX yields one per worksheet. Column order is preserved end to end;
/// data rows are aligned to `headers` by position.
#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A searchable record derived from one row of one sheet, ready to insert.
#[derive(Debug, Clone)]
pub struct RowRecord {
    pub sheet: String,
    /// Spreadsheet-style row number: data index + 2 (header row consumed).
    pub row_idx: i64,
    pub header_sig: String,
    pub text: String,
}

/// A search result returned from the query engine.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub record_id: i64,
    pub path: String,
    pub sheet: String,
    pub row_idx: i64,
    pub text: String,
    pub snippet: String,
    /// Combined score; lower is more relevant.
    pub score: f64,
}
