//! Drug-selection workspace workbook.
//!
//! Three sheets:
//! - `All_Drugs`: every ranked row
//! - `Top_<N>`: the head of the ranking plus blank columns for manual curation
//! - `Statistics`: selection criteria and counts

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::info;

use super::ExportResult;
use crate::models::SelectionRow;
use crate::ranking::{RankedSelection, SelectionStats};

pub const SELECTION_WORKBOOK: &str = "drug_selection_workspace.xlsx";

pub const ALL_DRUGS_SHEET: &str = "All_Drugs";
pub const STATISTICS_SHEET: &str = "Statistics";

/// Columns shared by the ranked sheets.
pub const SELECTION_COLUMNS: [&str; 7] = [
    "Rank",
    "K-CODE",
    "EDI",
    "Drug_Name",
    "Manufacturer",
    "Usage_Count",
    "Mapping_Source",
];

/// Blank columns appended to the top-N sheet for manual curation.
pub const CURATION_COLUMNS: [&str; 3] = ["Selected_for_100", "Shootable", "Notes"];

/// Name of the top-N sheet.
pub fn top_sheet_name(top_n: usize) -> String {
    format!("Top_{top_n}")
}

fn write_header(sheet: &mut Worksheet, columns: &[&str], bold: &Format) -> Result<(), XlsxError> {
    for (col, name) in columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, bold)?;
    }
    Ok(())
}

fn write_rows(
    sheet: &mut Worksheet,
    rows: &[SelectionRow],
    with_curation: bool,
    bold: &Format,
) -> Result<(), XlsxError> {
    if with_curation {
        let mut columns: Vec<&str> = SELECTION_COLUMNS.to_vec();
        columns.extend(CURATION_COLUMNS);
        write_header(sheet, &columns, bold)?;
    } else {
        write_header(sheet, &SELECTION_COLUMNS, bold)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = idx as u32 + 1;
        sheet.write_number(r, 0, row.rank as f64)?;
        sheet.write_string(r, 1, row.kcode.as_str())?;
        sheet.write_string(r, 2, row.edi_code.as_deref().unwrap_or(""))?;
        sheet.write_string(r, 3, &row.drug_name)?;
        sheet.write_string(r, 4, &row.manufacturer)?;
        sheet.write_number(r, 5, row.usage_count as f64)?;
        sheet.write_string(r, 6, row.mapping_source.as_str())?;
    }

    sheet.set_column_width(1, 12)?;
    sheet.set_column_width(3, 30)?;
    sheet.set_column_width(4, 20)?;
    Ok(())
}

fn write_statistics(
    sheet: &mut Worksheet,
    stats: &SelectionStats,
    top_n: usize,
    bold: &Format,
) -> Result<(), XlsxError> {
    write_header(sheet, &["Metric", "Value"], bold)?;

    let criteria = [
        "=== Selection criteria ===".to_string(),
        format!("Top {top_n}: Usage_Count descending"),
        "EDI dedup: keep the highest-usage K-CODE per EDI".to_string(),
        String::new(),
        "=== Data statistics ===".to_string(),
    ];
    let mut r = 1u32;
    for line in &criteria {
        sheet.write_string(r, 0, line)?;
        r += 1;
    }

    let metrics = [
        ("Total K-CODEs", stats.total as f64),
        ("K-CODEs with EDI", stats.with_edi as f64),
        ("K-CODEs with Usage", stats.with_usage as f64),
        ("K-CODEs without EDI", stats.without_edi as f64),
        ("Unique EDIs", stats.unique_edis as f64),
        ("Total Usage Count", stats.total_usage as f64),
        ("Removed Duplicates", stats.removed_duplicates as f64),
    ];
    for (name, value) in metrics {
        sheet.write_string(r, 0, name)?;
        sheet.write_number(r, 1, value)?;
        r += 1;
    }
    for (source, count) in &stats.by_source {
        sheet.write_string(r, 0, format!("Source: {source}"))?;
        sheet.write_number(r, 1, *count as f64)?;
        r += 1;
    }

    sheet.set_column_width(0, 48)?;
    Ok(())
}

/// Write the selection workspace workbook to `path`.
pub fn write_selection_workbook(
    selection: &RankedSelection,
    top_n: usize,
    path: &Path,
) -> ExportResult<()> {
    let bold = Format::new().set_bold();
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name(ALL_DRUGS_SHEET)?;
    write_rows(sheet, &selection.rows, false, &bold)?;

    let top = selection.head(top_n);
    let sheet = workbook.add_worksheet();
    sheet.set_name(top_sheet_name(top_n))?;
    write_rows(sheet, top, true, &bold)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(STATISTICS_SHEET)?;
    write_statistics(sheet, &selection.stats(), top_n, &bold)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| super::ExportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    workbook.save(path)?;
    info!(
        path = %path.display(),
        rows = selection.len(),
        top = top.len(),
        "Wrote selection workbook"
    );
    Ok(())
}
