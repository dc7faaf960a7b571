//! Usage aggregation by EDI code.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::ingest::{RawTable, UsageLayout};
use crate::models::UsageTable;

/// Parse a quantity cell. Anything non-numeric counts as zero.
pub fn parse_quantity(value: Option<&str>) -> f64 {
    value
        .map(|v| v.replace(',', ""))
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|q| q.is_finite())
        .unwrap_or(0.0)
}

/// Sum quantity per EDI code over the data rows of a usage log.
///
/// Rows before `layout.header_rows` are skipped and rows without an EDI
/// code are ignored entirely. When no data row has a value in the quantity
/// column the log is treated as a list of dispensing events and rows are
/// counted. Header rows do not count toward that check.
pub fn aggregate_usage(table: &RawTable, layout: &UsageLayout) -> UsageTable {
    let data = layout.header_rows..table.height();
    let data_rows = data.len();
    let has_quantity = data
        .clone()
        .any(|row| table.cell(row, layout.quantity_column).is_some());
    if !has_quantity {
        warn!(
            rows = data_rows,
            quantity_column = layout.quantity_column,
            "Usage log has no quantity column; counting rows per EDI"
        );
    }

    let mut totals: HashMap<String, f64> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    for row in data {
        let Some(edi) = table.cell(row, layout.edi_column) else {
            continue;
        };
        let quantity = if has_quantity {
            parse_quantity(table.cell(row, layout.quantity_column))
        } else {
            1.0
        };
        match totals.get_mut(edi) {
            Some(total) => *total += quantity,
            None => {
                order.push(edi.to_string());
                totals.insert(edi.to_string(), quantity);
            }
        }
    }

    let usage: UsageTable = order
        .into_iter()
        .map(|edi| {
            let total = totals[&edi].trunc() as i64;
            (edi, total)
        })
        .collect();

    info!(rows = data_rows, codes = usage.len(), "Aggregated usage by EDI");
    usage
}
