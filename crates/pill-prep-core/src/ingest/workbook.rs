//! Spreadsheet loaders for the code list and the usage log.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{ensure_exists, find_column, IngestError, IngestResult, RawTable};

/// Number of leading values inspected by the first-column fallback.
const FALLBACK_PROBE_ROWS: usize = 5;

/// Where K-CODEs live in the code-list workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeListLayout {
    /// Sheet indices to read; empty means every sheet
    pub sheets: Vec<usize>,
    /// Accepted headers for the code column
    pub columns: Vec<String>,
    /// Use the first column when no header matches and its leading
    /// values look like K-CODEs
    pub first_column_fallback: bool,
}

impl Default for CodeListLayout {
    fn default() -> Self {
        Self {
            sheets: Vec::new(),
            columns: ["K-CODE", "KCODE", "K_CODE", "CODE"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            first_column_fallback: true,
        }
    }
}

/// Fixed positions in the usage-log workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageLayout {
    pub sheet: usize,
    /// Rows before the first data row
    pub header_rows: usize,
    pub name_column: usize,
    pub edi_column: usize,
    pub quantity_column: usize,
}

impl Default for UsageLayout {
    fn default() -> Self {
        Self {
            sheet: 0,
            header_rows: 4,
            name_column: 0,
            edi_column: 1,
            quantity_column: 6,
        }
    }
}

/// Render a cell as text. Integral floats drop their fractional part so
/// numeric codes keep their digits.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_number(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format_number(dt.as_f64()),
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Convert a calamine range into a table with absolute positions.
pub fn range_to_table(range: &Range<Data>) -> RawTable {
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<String>> = vec![Vec::new(); row_offset];
    for cells in range.rows() {
        let mut row = vec![String::new(); col_offset];
        row.extend(cells.iter().map(cell_text));
        rows.push(row);
    }
    RawTable::new(rows)
}

/// Read every sheet of a workbook, in sheet order.
pub fn read_sheets(path: &Path) -> IngestResult<Vec<(String, RawTable)>> {
    ensure_exists(path)?;
    let workbook_error = |e: calamine::Error| IngestError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_error)?;
    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name).map_err(workbook_error)?;
        debug!(sheet = %name, rows = range.height(), columns = range.width(), "Read sheet");
        sheets.push((name, range_to_table(&range)));
    }
    Ok(sheets)
}

/// Pick the configured sheets, or all of them.
fn select_sheets(
    path: &Path,
    sheets: Vec<(String, RawTable)>,
    indices: &[usize],
) -> IngestResult<Vec<(String, RawTable)>> {
    if indices.is_empty() {
        return Ok(sheets);
    }
    let mut slots: Vec<Option<(String, RawTable)>> = sheets.into_iter().map(Some).collect();
    indices
        .iter()
        .map(|&index| {
            slots
                .get_mut(index)
                .and_then(Option::take)
                .ok_or_else(|| IngestError::MissingSheet {
                    path: path.to_path_buf(),
                    index,
                })
        })
        .collect()
}

/// Locate the code column of a sheet whose first row is the header.
pub fn code_column(table: &RawTable, layout: &CodeListLayout) -> Option<usize> {
    let headers = table.rows.first()?;
    if let Some(idx) = find_column(headers, &layout.columns) {
        return Some(idx);
    }
    if !layout.first_column_fallback {
        return None;
    }
    let looks_like_codes = (1..table.height())
        .filter_map(|row| table.cell(row, 0))
        .take(FALLBACK_PROBE_ROWS)
        .any(|value| value.to_uppercase().contains('K'));
    looks_like_codes.then_some(0)
}

/// Raw code values from one sheet, in row order (header excluded).
pub fn extract_codes(table: &RawTable, layout: &CodeListLayout) -> Option<Vec<String>> {
    let column = code_column(table, layout)?;
    Some(
        (1..table.height())
            .filter_map(|row| table.cell(row, column))
            .map(str::to_string)
            .collect(),
    )
}

/// Load raw K-CODE values from the code-list workbook.
pub fn load_code_list(path: &Path, layout: &CodeListLayout) -> IngestResult<Vec<String>> {
    let sheets = select_sheets(path, read_sheets(path)?, &layout.sheets)?;
    let mut codes = Vec::new();
    for (name, table) in &sheets {
        match extract_codes(table, layout) {
            Some(found) => {
                info!(sheet = %name, rows = table.height(), codes = found.len(), "Extracted K-CODEs");
                codes.extend(found);
            }
            None => warn!(sheet = %name, "No K-CODE column found; sheet skipped"),
        }
    }
    Ok(codes)
}

/// Load the usage-log sheet as a raw table (header rows included).
pub fn load_usage_table(path: &Path, layout: &UsageLayout) -> IngestResult<RawTable> {
    let mut sheets = select_sheets(path, read_sheets(path)?, &[layout.sheet])?;
    let (name, table) = sheets.remove(0);
    info!(sheet = %name, rows = table.height(), "Loaded usage log");
    Ok(table)
}
