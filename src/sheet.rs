//! Spreadsheet sources and exports.
//!
//! Identifier workbooks hold one sheet with an `asin` column. When the
//! workbook is missing it is generated from the identifiers the target
//! records currently carry, so the user can edit it for the next run.

use crate::asin::Asin;
use crate::pool::{PoolLoad, parse_lines, require_non_empty};
use crate::target::TargetSet;
use calamine::{Reader, open_workbook_auto};
use eyre::Result;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::path::Path;

/// Default workbook file name.
pub const DEFAULT_WORKBOOK: &str = "asins.xlsx";

/// Default sheet holding the identifiers.
pub const DEFAULT_SHEET: &str = "ASINs";

/// Default identifier column header.
pub const DEFAULT_COLUMN: &str = "asin";

/// Spreadsheet lookup failures.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetError {
    /// The workbook has no sheet with this name.
    MissingSheet(String),
    /// The sheet's header row has no matching column.
    MissingColumn { sheet: String, column: String },
}

impl std::fmt::Display for SheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetError::MissingSheet(sheet) => write!(f, "sheet '{}' not found", sheet),
            SheetError::MissingColumn { sheet, column } => {
                write!(f, "column '{}' not found in sheet '{}'", column, sheet)
            }
        }
    }
}

impl std::error::Error for SheetError {}

fn xlsx_error(path: &Path, e: XlsxError) -> eyre::Report {
    eyre::eyre!("Failed to write {}: {}", path.display(), e)
}

/// Read every cell below the header of `column` (matched case-insensitively).
pub fn read_column(path: &Path, sheet: &str, column: &str) -> Result<Vec<String>> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| eyre::eyre!("Failed to open {}: {}", path.display(), e))?;

    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(eyre::eyre!(SheetError::MissingSheet(sheet.to_string())));
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| eyre::eyre!("Failed to read sheet '{}' of {}: {}", sheet, path.display(), e))?;

    let mut rows = range.rows();
    let header = rows.next().unwrap_or(&[]);
    let Some(idx) = header
        .iter()
        .position(|cell| cell.to_string().trim().eq_ignore_ascii_case(column))
    else {
        return Err(eyre::eyre!(SheetError::MissingColumn {
            sheet: sheet.to_string(),
            column: column.to_string(),
        }));
    };

    Ok(rows
        .map(|row| row.get(idx).map(|cell| cell.to_string()).unwrap_or_default())
        .collect())
}

/// Write a single-sheet workbook with a header row.
pub fn write_rows(path: &Path, sheet: &str, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).map_err(|e| xlsx_error(path, e))?;

    for (col, header) in headers.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *header)
            .map_err(|e| xlsx_error(path, e))?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet
                .write_string(r as u32 + 1, col as u16, value.as_str())
                .map_err(|e| xlsx_error(path, e))?;
        }
    }

    workbook.save(path).map_err(|e| xlsx_error(path, e))?;
    Ok(())
}

/// Load the identifier pool from a workbook.
pub fn load_sheet_pool(path: &Path, sheet: &str, column: &str) -> Result<PoolLoad> {
    let cells = read_column(path, sheet, column)?;
    let load = require_non_empty(parse_lines(cells), &path.display().to_string())?;
    log::info!(
        "Loaded {} unique ASINs from {} (sheet '{}')",
        load.pool.len(),
        path.display(),
        sheet
    );
    Ok(load)
}

/// Create the identifier workbook from the currently observed identifiers.
pub fn generate_sheet(path: &Path, sheet: &str, column: &str, observed: &[Asin]) -> Result<()> {
    log::warn!("{} not found, generating it from {} record(s)", path.display(), observed.len());
    let rows: Vec<Vec<String>> = observed.iter().map(|a| vec![a.to_string()]).collect();
    write_rows(path, sheet, &[column], &rows)
}

/// Export the target records' `(file, asin)` pairs. Returns the row count.
pub fn export_targets(path: &Path, sheet: &str, targets: &TargetSet) -> Result<usize> {
    let rows: Vec<Vec<String>> = targets
        .targets
        .iter()
        .map(|t| vec![t.record.name(), t.original.to_string()])
        .collect();
    write_rows(path, sheet, &["file", DEFAULT_COLUMN], &rows)?;
    log::info!("Exported {} row(s) to {}", rows.len(), path.display());
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read_column_case_insensitive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("asins.xlsx");
        let rows = vec![
            vec!["22.json".to_string(), "aaaaaaaaaa".to_string()],
            vec!["23.json".to_string(), "BBBBBBBBBB".to_string()],
        ];
        write_rows(&path, DEFAULT_SHEET, &["file", " ASIN "], &rows).unwrap();

        let cells = read_column(&path, DEFAULT_SHEET, "asin").unwrap();
        assert_eq!(cells, vec!["aaaaaaaaaa", "BBBBBBBBBB"]);
    }

    #[test]
    fn test_read_column_missing_column() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("asins.xlsx");
        write_rows(&path, DEFAULT_SHEET, &["file"], &[vec!["22.json".to_string()]]).unwrap();

        let err = read_column(&path, DEFAULT_SHEET, "asin").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SheetError>(),
            Some(SheetError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_read_column_missing_sheet() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("asins.xlsx");
        write_rows(&path, "Other", &["asin"], &[]).unwrap();

        let err = read_column(&path, DEFAULT_SHEET, "asin").unwrap_err();
        assert_eq!(
            err.downcast_ref::<SheetError>(),
            Some(&SheetError::MissingSheet(DEFAULT_SHEET.to_string()))
        );
    }

    #[test]
    fn test_load_sheet_pool_filters_and_dedupes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("asins.xlsx");
        let rows: Vec<Vec<String>> = ["aaaaaaaaaa", "bad", "AAAAAAAAAA", "CCCCCCCCCC"]
            .iter()
            .map(|s| vec![s.to_string()])
            .collect();
        write_rows(&path, DEFAULT_SHEET, &[DEFAULT_COLUMN], &rows).unwrap();

        let load = load_sheet_pool(&path, DEFAULT_SHEET, DEFAULT_COLUMN).unwrap();
        let got: Vec<&str> = load.pool.iter().map(|a| a.as_str()).collect();
        assert_eq!(got, vec!["AAAAAAAAAA", "CCCCCCCCCC"]);
        assert_eq!(load.invalid.len(), 1);
    }

    #[test]
    fn test_generate_sheet_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("asins.xlsx");
        let observed = vec![Asin::parse("AAAAAAAAAA").unwrap(), Asin::parse("AAAAAAAAAA").unwrap()];

        generate_sheet(&path, DEFAULT_SHEET, DEFAULT_COLUMN, &observed).unwrap();

        let cells = read_column(&path, DEFAULT_SHEET, DEFAULT_COLUMN).unwrap();
        assert_eq!(cells, vec!["AAAAAAAAAA", "AAAAAAAAAA"]);
    }
}
