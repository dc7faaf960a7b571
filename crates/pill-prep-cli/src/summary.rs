//! Console summaries.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use pill_prep_core::pipeline::{LoadScriptRun, MappingRun, SelectionRun};
use pill_prep_core::{ReconcileReport, UsageTable};
use pill_prep_storage::SmokeTestReport;

/// Rows shown in the ranking preview.
const PREVIEW_ROWS: usize = 10;

/// Drug names are cut to this many characters in the preview.
const NAME_WIDTH: usize = 20;

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Reconciliation counts as a two-column table.
pub fn reconcile_table(report: &ReconcileReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);

    let rate_color = if report.mapping_rate() < 80.0 {
        Color::Yellow
    } else {
        Color::Green
    };
    table.add_row(vec![Cell::new("K-CODEs"), Cell::new(report.total)]);
    table.add_row(vec![Cell::new("Mapped"), count_cell(report.mapped, Color::Green)]);
    table.add_row(vec![Cell::new("Unmapped"), count_cell(report.unmapped, Color::Red)]);
    table.add_row(vec![
        Cell::new("Duplicate matches"),
        count_cell(report.duplicates.len(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Unparseable inputs"),
        count_cell(report.unparseable.len(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Mapping rate"),
        Cell::new(format!("{:.2}%", report.mapping_rate()))
            .fg(rate_color)
            .add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn print_mapping_summary(run: &MappingRun) {
    println!("{}", reconcile_table(&run.reconciliation.report));
    println!("Mapping: {}", run.outputs.mapping.display());
    println!("Statistics: {}", run.outputs.statistics.display());
    if let Some(path) = &run.outputs.unmapped {
        println!("Unmapped list: {}", path.display());
    }
    println!("Summary CSV: {}", run.outputs.summary.display());
    if let Some(path) = &run.outputs.with_edi {
        println!("With-EDI CSV: {}", path.display());
    }
}

/// Top rows of the ranking.
pub fn preview_table(run: &SelectionRun) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Rank"),
        header_cell("K-CODE"),
        header_cell("EDI"),
        header_cell("Drug"),
        header_cell("Usage"),
        header_cell("Source"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);

    for row in run.selection.head(PREVIEW_ROWS) {
        table.add_row(vec![
            Cell::new(row.rank),
            Cell::new(row.kcode.as_str()),
            match row.edi_code.as_deref() {
                Some(edi) => Cell::new(edi),
                None => dim_cell("-"),
            },
            Cell::new(truncate(&row.drug_name, NAME_WIDTH)),
            Cell::new(row.usage_count),
            dim_cell(row.mapping_source.as_str()),
        ]);
    }
    table
}

/// Highest-usage EDI codes from the usage log, joined or not.
pub fn usage_table(usage: &UsageTable) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("EDI"), header_cell("Usage")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for record in usage.ranked().into_iter().take(PREVIEW_ROWS) {
        table.add_row(vec![Cell::new(record.edi_code), Cell::new(record.quantity)]);
    }
    table
}

pub fn print_selection_summary(run: &SelectionRun, top_n: usize) {
    let stats = run.selection.stats();

    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("K-CODEs"), Cell::new(stats.total)]);
    table.add_row(vec![Cell::new("With EDI"), Cell::new(stats.with_edi)]);
    table.add_row(vec![Cell::new("With usage"), Cell::new(stats.with_usage)]);
    table.add_row(vec![
        Cell::new("Without EDI"),
        count_cell(stats.without_edi, Color::Yellow),
    ]);
    table.add_row(vec![Cell::new("Unique EDIs"), Cell::new(stats.unique_edis)]);
    table.add_row(vec![Cell::new("Total usage"), Cell::new(stats.total_usage)]);
    table.add_row(vec![
        Cell::new("Removed duplicates"),
        count_cell(stats.removed_duplicates, Color::Yellow),
    ]);
    for (source, count) in &stats.by_source {
        table.add_row(vec![dim_cell(format!("Source: {source}")), Cell::new(count)]);
    }

    println!("{table}");
    println!("Top {PREVIEW_ROWS} EDI codes in the usage log:");
    println!("{}", usage_table(&run.usage));
    println!("Top {PREVIEW_ROWS} by usage:");
    println!("{}", preview_table(run));
    println!("Workbook: {} (Top_{top_n})", run.workbook.display());
}

pub fn print_load_script_summary(run: &LoadScriptRun) {
    let set = &run.selection;
    let with_edi = set.with_edi_count();

    let mut table = Table::new();
    table.set_header(vec![header_cell("Metric"), header_cell("Value")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Drugs"), Cell::new(set.drugs.len())]);
    table.add_row(vec![Cell::new("With EDI"), Cell::new(with_edi)]);
    table.add_row(vec![
        Cell::new("Without EDI"),
        count_cell(set.drugs.len() - with_edi, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Total usage"),
        Cell::new(set.statistics.total_usage),
    ]);
    table.add_row(vec![
        Cell::new("Shootable Y / M"),
        Cell::new(format!(
            "{} / {}",
            set.statistics.shootable_y, set.statistics.shootable_m
        )),
    ]);
    if let Some(rows) = run.verified_rows {
        table.add_row(vec![
            Cell::new("SQLite dry run"),
            Cell::new(format!("{rows} rows")).fg(Color::Green),
        ]);
    }

    println!("{table}");
    println!("SQL: {}", run.sql_path.display());
    println!("Checklist: {}", run.checklist_path.display());
}

pub fn print_smoke_test_summary(report: &SmokeTestReport) {
    println!("Local image: {}", report.local_image.display());
    println!("Uploaded: {}", report.object_path);
    if let Some(id) = &report.row_id {
        println!("Row id: {id}");
    }
    println!("Rows for K-CODE: {}", report.records.len());
    println!("Public URL (auth required for private buckets): {}", report.public_url);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("타이레놀정500밀리그램", 4), "타이레놀");
        assert_eq!(truncate("abc", 20), "abc");
    }

    #[test]
    fn test_reconcile_table_rows() {
        let report = ReconcileReport {
            total: 4,
            mapped: 3,
            unmapped: 1,
            ..ReconcileReport::default()
        };
        let rendered = reconcile_table(&report).to_string();
        assert!(rendered.contains("75.00%"));
        assert!(rendered.contains("Unmapped"));
    }

    #[test]
    fn test_usage_table_sorted_and_capped() {
        let usage: UsageTable = (0..15)
            .map(|i| (format!("E{i:02}"), i as i64))
            .collect();
        let rendered = usage_table(&usage).to_string();

        assert!(rendered.contains("E14"));
        assert!(!rendered.contains("E04"));
        let top = rendered.find("E14").unwrap();
        let next = rendered.find("E13").unwrap();
        assert!(top < next);
    }
}
