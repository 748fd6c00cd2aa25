//! Row flattening into searchable record text.
//!
//! Turns one extracted table row into the `"header: value | ..."` text blob
//! that gets indexed, plus the serialized header signature carried on every
//! record for display and debugging.

use crate::models::{RowRecord, Table};

/// First data row of a sheet lands on spreadsheet row 2 (row 1 is headers).
const HEADER_ROW_OFFSET: i64 = 2;

/// Flatten a row into `"header: value"` pairs joined with `" | "`. Cells
/// that are empty after trimming are dropped; column order is preserved.
pub fn flatten_row(headers: &[String], cells: &[String]) -> String {
    let mut parts = Vec::new();
    for (header, value) in headers.iter().zip(cells.iter()) {
        if value.trim().is_empty() {
            continue;
        }
        parts.push(format!("{}: {}", header, value));
    }
    parts.join(" | ")
}

/// Serialized column headers, pipe-joined in source order.
pub fn header_signature(headers: &[String]) -> String {
    headers.join("|")
}

/// Build the records for one table. Wholly-empty rows still produce a record
/// (empty text) when `keep_empty_rows` is set, so record row numbers stay a
/// faithful map back to the source sheet.
pub fn build_records(table: &Table, keep_empty_rows: bool) -> Vec<RowRecord> {
    let header_sig = header_signature(&table.headers);

    table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, cells)| {
            let text = flatten_row(&table.headers, cells);
            if text.is_empty() && !keep_empty_rows {
                return None;
            }
            Some(RowRecord {
                sheet: table.name.clone(),
                row_idx: i as i64 + HEADER_ROW_OFFSET,
                header_sig: header_sig.clone(),
                text,
            })
        })
        .collect()
}
