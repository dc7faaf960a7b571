//! Selection ranker.
//!
//! Pipeline: left join with usage → stable sort → dedup by EDI → re-rank
//!
//! Rows without an EDI code are never deduplicated; they carry zero usage
//! and sink to the bottom of the ranking in join order.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::info;

use crate::models::{DrugEntry, SelectionRow, UsageTable};

/// Ranked and deduplicated selection rows.
#[derive(Debug, Clone, Default)]
pub struct RankedSelection {
    /// Final rows in rank order, `rank` starting at 1
    pub rows: Vec<SelectionRow>,
    /// Rows dropped because a higher-ranked row shared their EDI code
    pub removed_duplicates: usize,
}

impl RankedSelection {
    /// The top `n` rows (all rows when fewer exist).
    pub fn head(&self, n: usize) -> &[SelectionRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Summary counts over the final rows.
    pub fn stats(&self) -> SelectionStats {
        let mut by_source: BTreeMap<String, usize> = BTreeMap::new();
        let mut unique_edis: HashSet<&str> = HashSet::new();
        let mut stats = SelectionStats {
            total: self.rows.len(),
            removed_duplicates: self.removed_duplicates,
            ..SelectionStats::default()
        };

        for row in &self.rows {
            *by_source
                .entry(row.mapping_source.as_str().to_string())
                .or_default() += 1;
            match row.edi_code.as_deref().filter(|e| !e.is_empty()) {
                Some(edi) => {
                    stats.with_edi += 1;
                    unique_edis.insert(edi);
                }
                None => stats.without_edi += 1,
            }
            if row.usage_count > 0 {
                stats.with_usage += 1;
            }
            stats.total_usage += row.usage_count;
        }

        stats.unique_edis = unique_edis.len();
        stats.by_source = by_source;
        stats
    }
}

/// Counts reported on the Statistics sheet and in the CLI summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStats {
    pub total: usize,
    pub with_edi: usize,
    pub with_usage: usize,
    pub without_edi: usize,
    pub unique_edis: usize,
    pub total_usage: i64,
    pub removed_duplicates: usize,
    /// Row count per mapping source name
    pub by_source: BTreeMap<String, usize>,
}

/// Join, rank and deduplicate reconciled entries by usage.
pub fn rank_selection(entries: &[DrugEntry], usage: &UsageTable) -> RankedSelection {
    // (join position, row)
    let mut joined: Vec<(usize, SelectionRow)> = entries
        .iter()
        .enumerate()
        .map(|(position, entry)| (position, join_usage(entry, usage)))
        .collect();

    // sort_by is stable, so equal usage keeps join order
    joined.sort_by(|a, b| b.1.usage_count.cmp(&a.1.usage_count));

    let before = joined.len();
    let mut seen: HashSet<String> = HashSet::new();
    joined.retain(|(_, row)| match row.edi_code.as_deref() {
        Some(edi) if !edi.is_empty() => seen.insert(edi.to_string()),
        _ => true,
    });
    let removed_duplicates = before - joined.len();

    joined.sort_by(|a, b| {
        b.1.usage_count
            .cmp(&a.1.usage_count)
            .then_with(|| a.0.cmp(&b.0))
    });

    let rows: Vec<SelectionRow> = joined
        .into_iter()
        .enumerate()
        .map(|(idx, (_, mut row))| {
            row.rank = idx + 1;
            row
        })
        .collect();

    info!(
        rows = rows.len(),
        removed_duplicates, "Ranked selection by usage"
    );

    RankedSelection {
        rows,
        removed_duplicates,
    }
}

fn join_usage(entry: &DrugEntry, usage: &UsageTable) -> SelectionRow {
    let edi_code = entry.edi_code.clone().filter(|e| !e.is_empty());
    let usage_count = edi_code
        .as_deref()
        .and_then(|edi| usage.get(edi))
        .unwrap_or(0);
    SelectionRow {
        kcode: entry.kcode.clone(),
        edi_code,
        drug_name: entry.drug_name.clone(),
        manufacturer: entry.manufacturer.clone(),
        usage_count,
        mapping_source: entry.source,
        rank: 0,
    }
}
