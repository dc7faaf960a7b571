//! Usage and selection models.

use std::collections::HashMap;

use serde::Serialize;

use super::{KCode, MappingSource};

/// Total usage for one EDI code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    pub edi_code: String,
    pub quantity: i64,
}

/// Aggregated usage keyed by EDI code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageTable {
    totals: HashMap<String, i64>,
}

impl UsageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total for a code, replacing any previous value.
    pub fn insert(&mut self, edi_code: impl Into<String>, quantity: i64) {
        self.totals.insert(edi_code.into(), quantity);
    }

    /// Usage for a code, if any rows referenced it.
    pub fn get(&self, edi_code: &str) -> Option<i64> {
        self.totals.get(edi_code).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Records sorted by quantity descending, ties by code ascending.
    pub fn ranked(&self) -> Vec<UsageRecord> {
        let mut records: Vec<UsageRecord> = self
            .totals
            .iter()
            .map(|(edi_code, quantity)| UsageRecord {
                edi_code: edi_code.clone(),
                quantity: *quantity,
            })
            .collect();
        records.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then_with(|| a.edi_code.cmp(&b.edi_code))
        });
        records
    }
}

impl FromIterator<(String, i64)> for UsageTable {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self {
            totals: iter.into_iter().collect(),
        }
    }
}

/// One row of the ranked selection worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionRow {
    pub kcode: KCode,
    pub edi_code: Option<String>,
    pub drug_name: String,
    pub manufacturer: String,
    pub usage_count: i64,
    pub mapping_source: MappingSource,
    /// 1-based position in the final ranking (0 until ranked)
    pub rank: usize,
}

impl SelectionRow {
    pub fn has_edi(&self) -> bool {
        self.edi_code.as_deref().is_some_and(|e| !e.is_empty())
    }
}
