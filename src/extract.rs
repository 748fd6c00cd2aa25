//! Row extraction from tabular source files (CSV, XLSX).
//!
//! This is the parsing boundary: given a path, return zero or more named
//! [`Table`]s whose first logical row is the header row. A CSV is a single
//! table named after the file stem; an XLSX yields one table per worksheet,
//! named from the workbook metadata.

use std::io::Read;
use std::path::Path;

use crate::models::Table;

/// Maximum worksheets to process in an xlsx.
const XLSX_MAX_SHEETS: usize = 100;
/// Maximum cells to process per sheet (avoids unbounded memory).
const XLSX_MAX_CELLS_PER_SHEET: usize = 1_000_000;
/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction error. Never panics; the indexing run skips the file.
#[derive(Debug)]
pub enum ExtractError {
    Io(String),
    UnsupportedExtension(String),
    Csv(String),
    Ooxml(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Io(e) => write!(f, "read failed: {}", e),
            ExtractError::UnsupportedExtension(ext) => {
                write!(f, "unsupported file extension: {}", ext)
            }
            ExtractError::Csv(e) => write!(f, "CSV parsing failed: {}", e),
            ExtractError::Ooxml(e) => write!(f, "XLSX parsing failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extracts all tables from a source file, dispatching on the extension.
pub fn extract_tables(path: &Path) -> Result<Vec<Table>, ExtractError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => extract_csv(path),
        "xlsx" => extract_xlsx(path),
        other => Err(ExtractError::UnsupportedExtension(other.to_string())),
    }
}

// ============ CSV ============

fn extract_csv(path: &Path) -> Result<Vec<Table>, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::Io(e.to_string()))?;
    let text = String::from_utf8_lossy(&bytes);

    let mut grid = parse_csv(&text);
    if grid.is_empty() {
        return Ok(Vec::new());
    }

    let headers = grid.remove(0);
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "csv".to_string());

    Ok(vec![grid_to_table(name, headers, grid)])
}

/// RFC-4180-style CSV parsing: quoted fields, doubled quotes, embedded
/// commas and newlines. Lenient about stray quotes mid-field.
fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => {
                row.push(std::mem::take(&mut field));
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    // Trailing record without a final newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    // A lone empty trailing line is not a record
    rows.retain(|r| !(r.len() == 1 && r[0].is_empty()));

    rows
}

// ============ XLSX ============

fn extract_xlsx(path: &Path) -> Result<Vec<Table>, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::Io(e.to_string()))?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;

    let shared_strings = read_shared_strings(&mut archive)?;
    let sheet_names = read_workbook_sheet_names(&mut archive)?;
    let worksheet_files = list_worksheet_files(&mut archive);

    let mut tables = Vec::new();
    for (idx, entry_name) in worksheet_files.into_iter().take(XLSX_MAX_SHEETS).enumerate() {
        let xml = read_zip_entry_bounded(&mut archive, &entry_name, MAX_XML_ENTRY_BYTES)?;
        let mut grid = parse_sheet_grid(&xml, &shared_strings)?;

        let name = sheet_names
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("Sheet{}", idx + 1));

        if grid.is_empty() {
            continue;
        }
        let headers = grid.remove(0);
        tables.push(grid_to_table(name, headers, grid));
    }

    Ok(tables)
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

/// Shared strings are optional; a workbook of pure numbers has none.
fn read_shared_strings(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>, ExtractError> {
    if archive.by_name("xl/sharedStrings.xml").is_err() {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry_bounded(archive, "xl/sharedStrings.xml", MAX_XML_ENTRY_BYTES)?;

    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"si" {
                    current = Some(String::new());
                } else if current.is_some() && e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        if let Some(s) = current.as_mut() {
                            s.push_str(te.unescape().unwrap_or_default().as_ref());
                        }
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"si" {
                    strings.push(current.take().unwrap_or_default());
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Sheet display names from xl/workbook.xml, in workbook order.
fn read_workbook_sheet_names(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
) -> Result<Vec<String>, ExtractError> {
    if archive.by_name("xl/workbook.xml").is_err() {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry_bounded(archive, "xl/workbook.xml", MAX_XML_ENTRY_BYTES)?;

    let mut names = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) | Ok(quick_xml::events::Event::Empty(e)) => {
                if e.local_name().as_ref() == b"sheet" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"name" {
                            names.push(
                                attr.unescape_value().unwrap_or_default().into_owned(),
                            );
                        }
                    }
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(names)
}

fn list_worksheet_files(archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

/// Parse one worksheet's XML into a dense grid of cell strings. Gaps left by
/// sparse cell references are filled with empty strings so column positions
/// stay aligned with the header row.
fn parse_sheet_grid(
    xml: &[u8],
    shared_strings: &[String],
) -> Result<Vec<Vec<String>>, ExtractError> {
    #[derive(PartialEq)]
    enum CellType {
        Raw,
        Shared,
        InlineStr,
    }

    let mut grid: Vec<Vec<String>> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut current_row: Vec<String> = Vec::new();
    let mut cell_type = CellType::Raw;
    let mut cell_col: Option<usize> = None;
    let mut in_v = false;
    let mut in_is_t = false;
    let mut cell_count = 0usize;

    loop {
        if cell_count >= XLSX_MAX_CELLS_PER_SHEET {
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => {
                    current_row = Vec::new();
                    // Sparse sheets skip empty rows entirely; pad so the
                    // intrinsic row numbering survives.
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"r" {
                            if let Ok(n) = attr
                                .unescape_value()
                                .unwrap_or_default()
                                .parse::<usize>()
                            {
                                while grid.len() + 1 < n {
                                    grid.push(Vec::new());
                                }
                            }
                        }
                    }
                }
                b"c" => {
                    cell_type = CellType::Raw;
                    cell_col = None;
                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"t" => {
                                cell_type = match attr.value.as_ref() {
                                    b"s" => CellType::Shared,
                                    b"inlineStr" => CellType::InlineStr,
                                    _ => CellType::Raw,
                                }
                            }
                            b"r" => {
                                cell_col = column_of_ref(
                                    attr.unescape_value().unwrap_or_default().as_ref(),
                                );
                            }
                            _ => {}
                        }
                    }
                }
                b"v" => in_v = true,
                b"t" if cell_type == CellType::InlineStr => in_is_t = true,
                _ => {}
            },
            Ok(quick_xml::events::Event::Text(te)) if in_v || in_is_t => {
                let raw = te.unescape().unwrap_or_default();
                let value = if in_v && cell_type == CellType::Shared {
                    raw.trim()
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| shared_strings.get(i).cloned())
                        .unwrap_or_default()
                } else {
                    raw.into_owned()
                };

                let col = cell_col.unwrap_or(current_row.len());
                while current_row.len() < col {
                    current_row.push(String::new());
                }
                if current_row.len() == col {
                    current_row.push(value);
                } else {
                    current_row[col] = value;
                }
                cell_count += 1;
                in_v = false;
                in_is_t = false;
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"row" => grid.push(std::mem::take(&mut current_row)),
                b"v" => in_v = false,
                b"t" => in_is_t = false,
                b"c" => {
                    cell_type = CellType::Raw;
                    cell_col = None;
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(grid)
}

/// Zero-based column index of a cell reference like `B2` or `AA10`.
fn column_of_ref(cell_ref: &str) -> Option<usize> {
    let letters: String = cell_ref
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let mut col = 0usize;
    for c in letters.chars() {
        col = col * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(col - 1)
}

// ============ Shared ============

/// Align data rows to the header width so header/value zipping is positional.
fn grid_to_table(name: String, headers: Vec<String>, grid: Vec<Vec<String>>) -> Table {
    let width = headers.len();
    let rows = grid
        .into_iter()
        .map(|mut row| {
            row.truncate(width);
            row.resize(width, String::new());
            row
        })
        .collect();

    Table {
        name,
        headers,
        rows,
    }
}
