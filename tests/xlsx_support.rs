//! End-to-end tests for XLSX workbook support and per-file failure isolation.
//!
//! Workbook fixtures are built in-test with `zip::ZipWriter` so no binary
//! test assets are checked in.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn rdx_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("rdx");
    path
}

/// Build a minimal xlsx: one worksheet per (name, rows) pair, inline-string
/// cells, row 1 as headers.
fn make_xlsx(sheets: &[(&str, Vec<Vec<&str>>)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();

        let sheet_tags: String = sheets
            .iter()
            .enumerate()
            .map(|(i, (name, _))| {
                format!("<sheet name=\"{}\" sheetId=\"{}\" r:id=\"rId{}\"/>", name, i + 1, i + 1)
            })
            .collect();
        let workbook_xml = format!(
            "<?xml version=\"1.0\"?><workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"><sheets>{}</sheets></workbook>",
            sheet_tags
        );
        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(workbook_xml.as_bytes()).unwrap();

        for (i, (_, rows)) in sheets.iter().enumerate() {
            let mut sheet_xml = String::from(
                "<?xml version=\"1.0\"?><worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\"><sheetData>",
            );
            for (r, row) in rows.iter().enumerate() {
                sheet_xml.push_str(&format!("<row r=\"{}\">", r + 1));
                for (c, cell) in row.iter().enumerate() {
                    let col_letter = (b'A' + c as u8) as char;
                    sheet_xml.push_str(&format!(
                        "<c r=\"{}{}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                        col_letter,
                        r + 1,
                        cell
                    ));
                }
                sheet_xml.push_str("</row>");
            }
            sheet_xml.push_str("</sheetData></worksheet>");

            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)
                .unwrap();
            zip.write_all(sheet_xml.as_bytes()).unwrap();
        }

        zip.finish().unwrap();
    }
    buf
}

fn setup_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    fs::create_dir_all(root.join("data")).unwrap();
    fs::create_dir_all(root.join("sheets")).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/rowdex.sqlite"

[indexing]
root = "{}/sheets"
"#,
        root.display(),
        root.display()
    );

    let config_path = root.join("rowdex.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_rdx(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = rdx_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run rdx binary at {:?}: {}", binary, e));

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

#[test]
fn test_index_multi_sheet_workbook() {
    let (tmp, config_path) = setup_env();

    let xlsx = make_xlsx(&[
        (
            "Clients",
            vec![
                vec!["Name", "City"],
                vec!["Ana", "Lima"],
                vec!["Bob", "Quito"],
            ],
        ),
        (
            "Orders",
            vec![vec!["Order", "Amount"], vec!["A-17", "420"]],
        ),
    ]);
    fs::write(tmp.path().join("sheets").join("book.xlsx"), xlsx).unwrap();

    run_rdx(&config_path, &["init"]);
    let (stdout, stderr, success) = run_rdx(&config_path, &["index"]);
    assert!(success, "index failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("indexed: 1"), "got: {}", stdout);
    // 2 client rows + 1 order row
    assert!(stdout.contains("records written: 3"), "got: {}", stdout);

    let (search_out, _, _) = run_rdx(&config_path, &["search", "Lima"]);
    assert!(search_out.contains("Clients"), "got: {}", search_out);
    assert!(search_out.contains("<b>Lima</b>"), "got: {}", search_out);
}

#[test]
fn test_sheet_filter_against_workbook_sheets() {
    let (tmp, config_path) = setup_env();

    let xlsx = make_xlsx(&[
        ("Sheet1", vec![vec!["Name"], vec!["Ana"]]),
        ("Sheet2", vec![vec!["Name"], vec!["Bob"]]),
    ]);
    fs::write(tmp.path().join("sheets").join("book.xlsx"), xlsx).unwrap();

    run_rdx(&config_path, &["init"]);
    run_rdx(&config_path, &["index"]);

    let (stdout, _, _) = run_rdx(&config_path, &["search", "Ana", "--sheet", "Sheet1"]);
    assert!(stdout.contains("1. ["), "got: {}", stdout);

    // "Ana" lives only in Sheet1
    let (stdout, _, _) = run_rdx(&config_path, &["search", "Ana", "--sheet", "Sheet2"]);
    assert!(stdout.contains("No results"), "got: {}", stdout);
}

#[test]
fn test_corrupt_workbook_does_not_abort_run() {
    let (tmp, config_path) = setup_env();
    let sheets_dir = tmp.path().join("sheets");

    fs::write(sheets_dir.join("good.csv"), "Name,City\nAna,Lima\n").unwrap();
    fs::write(sheets_dir.join("broken.xlsx"), b"this is not a zip archive").unwrap();

    run_rdx(&config_path, &["init"]);
    let (stdout, stderr, success) = run_rdx(&config_path, &["index"]);

    // The run itself succeeds; the bad file is reported and skipped
    assert!(success, "run should not abort: {}", stderr);
    assert!(stdout.contains("indexed: 1"), "got: {}", stdout);
    assert!(stdout.contains("failed: 1"), "got: {}", stdout);
    assert!(stderr.contains("broken.xlsx"), "got: {}", stderr);

    let (search_out, _, _) = run_rdx(&config_path, &["search", "Lima"]);
    assert!(search_out.contains("Ana"), "got: {}", search_out);
}

#[test]
fn test_dry_run_reports_unparseable_files() {
    let (tmp, config_path) = setup_env();
    let sheets_dir = tmp.path().join("sheets");

    fs::write(sheets_dir.join("good.csv"), "Name,City\nAna,Lima\n").unwrap();
    fs::write(sheets_dir.join("broken.xlsx"), b"this is not a zip archive").unwrap();

    run_rdx(&config_path, &["init"]);
    let (stdout, stderr, success) = run_rdx(&config_path, &["index", "--dry-run"]);
    assert!(success, "got stderr: {}", stderr);
    assert!(stdout.contains("files found: 2"), "got: {}", stdout);
    assert!(stdout.contains("estimated records: 1"), "got: {}", stdout);
    assert!(stdout.contains("would fail: 1"), "got: {}", stdout);
    assert!(stderr.contains("broken.xlsx"), "got: {}", stderr);
}

#[test]
fn test_failed_reindex_keeps_prior_records() {
    let (tmp, config_path) = setup_env();
    let book_path = tmp.path().join("sheets").join("book.xlsx");

    let xlsx = make_xlsx(&[(
        "Clients",
        vec![vec!["Name", "City"], vec!["Ana", "Lima"]],
    )]);
    fs::write(&book_path, xlsx).unwrap();

    run_rdx(&config_path, &["init"]);
    run_rdx(&config_path, &["index"]);

    let (search_out, _, _) = run_rdx(&config_path, &["search", "Lima"]);
    assert!(search_out.contains("Ana"), "got: {}", search_out);

    // Corrupt the workbook: the fingerprint changes, extraction fails, and
    // the prior records must survive untouched
    std::thread::sleep(std::time::Duration::from_secs(1));
    fs::write(&book_path, b"corrupted beyond recognition").unwrap();

    let (stdout, _, success) = run_rdx(&config_path, &["index"]);
    assert!(success);
    assert!(stdout.contains("failed: 1"), "got: {}", stdout);

    let (search_out, _, _) = run_rdx(&config_path, &["search", "Lima"]);
    assert!(
        search_out.contains("Ana"),
        "prior records should survive a failed re-index, got: {}",
        search_out
    );

    let (stats_out, _, _) = run_rdx(&config_path, &["stats"]);
    assert!(stats_out.contains("Records:   1"), "got: {}", stats_out);
}

#[test]
fn test_empty_cells_dropped_from_record_text() {
    let (tmp, config_path) = setup_env();

    let xlsx = make_xlsx(&[(
        "People",
        vec![
            vec!["Name", "Age", "City"],
            vec!["Ana", "", "Lima"],
        ],
    )]);
    fs::write(tmp.path().join("sheets").join("people.xlsx"), xlsx).unwrap();

    run_rdx(&config_path, &["init"]);
    run_rdx(&config_path, &["index"]);

    let (search_out, _, _) = run_rdx(&config_path, &["search", "Ana"]);
    let id = search_out
        .lines()
        .find(|l| l.trim().starts_with("id:"))
        .and_then(|l| l.split("id:").nth(1))
        .map(|s| s.trim().to_string())
        .expect("search output should contain a record id");

    let (stdout, _, _) = run_rdx(&config_path, &["get", &id]);
    assert!(
        stdout.contains("Name: Ana | City: Lima"),
        "empty Age cell must be dropped, got: {}",
        stdout
    );
    assert!(stdout.contains("Name|Age|City"), "got: {}", stdout);
}
