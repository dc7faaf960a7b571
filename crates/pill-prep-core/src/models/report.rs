//! Reconciliation run report.

use serde::Serialize;

use super::KCode;

/// A code that matched more than one registry row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateMatch {
    pub kcode: KCode,
    pub count: usize,
}

/// Run-level reconciliation counts.
///
/// `mapped + unmapped == total` holds for every report the engine builds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    /// Distinct normalized input codes
    pub total: usize,
    pub mapped: usize,
    pub unmapped: usize,
    /// Every input code no source could map, in input order
    pub unmapped_codes: Vec<KCode>,
    pub duplicates: Vec<DuplicateMatch>,
    /// Raw inputs that failed normalization and were skipped
    pub unparseable: Vec<String>,
}

impl ReconcileReport {
    /// Mapped share as a percentage (0 when there were no inputs).
    pub fn mapping_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.mapped as f64 / self.total as f64 * 100.0
    }

    /// Unmapped codes sorted ascending, as written to the audit list.
    pub fn sorted_unmapped(&self) -> Vec<KCode> {
        let mut codes = self.unmapped_codes.clone();
        codes.sort();
        codes
    }
}
