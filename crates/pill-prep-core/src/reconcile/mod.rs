//! Reconciliation of K-CODEs against EDI mapping sources.
//!
//! Pipeline: Normalization → Per-source lookup (ordered variants) → DrugEntry

mod normalizer;

pub use normalizer::*;

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::models::{
    CodeRecord, CodeSource, DrugEntry, DuplicateMatch, KCode, MappingSource, ReconcileReport,
    SourceRow,
};

/// Result of a reconciliation run.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// One entry per distinct normalized input code, in first-seen order.
    pub entries: Vec<DrugEntry>,
    pub report: ReconcileReport,
}

impl Reconciliation {
    /// Entries that some source mapped.
    pub fn mapped(&self) -> impl Iterator<Item = &DrugEntry> {
        self.entries.iter().filter(|e| e.is_mapped())
    }
}

/// A source's rows indexed by code as written and by normalized code.
struct IndexedSource<'a> {
    kind: MappingSource,
    rows: &'a [SourceRow],
    verbatim: HashMap<String, Vec<usize>>,
    normalized: HashMap<String, Vec<usize>>,
}

/// Rows of one source that denote a given code.
struct SourceMatch<'a> {
    kind: MappingSource,
    variant: CodeVariant,
    /// Winning row: first row carrying an EDI code, in variant then
    /// table order; the first matched row when none carries one
    row: &'a SourceRow,
    /// Distinct rows matched by any variant
    count: usize,
}

impl<'a> IndexedSource<'a> {
    fn new(source: &'a CodeSource) -> Self {
        let mut verbatim: HashMap<String, Vec<usize>> = HashMap::new();
        let mut normalized: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, row) in source.rows.iter().enumerate() {
            let Some(code) = row.code.as_deref() else {
                continue;
            };
            let written = verbatim_code(code);
            if written.is_empty() {
                continue;
            }
            verbatim.entry(written).or_default().push(idx);
            if let Some(kcode) = normalize_kcode(code) {
                normalized
                    .entry(kcode.as_str().to_string())
                    .or_default()
                    .push(idx);
            }
        }
        Self {
            kind: source.kind,
            rows: &source.rows,
            verbatim,
            normalized,
        }
    }

    fn hits(&self, variant: CodeVariant, raw: &str, canonical: &KCode) -> &[usize] {
        let index = if variant.uses_normalized_index() {
            &self.normalized
        } else {
            &self.verbatim
        };
        variant
            .key(raw, canonical)
            .and_then(|key| index.get(&key))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn lookup(&self, raw: &str, canonical: &KCode) -> Option<SourceMatch<'a>> {
        let mut first: Option<(CodeVariant, usize)> = None;
        let mut first_with_edi: Option<(CodeVariant, usize)> = None;
        let mut matched: Vec<usize> = Vec::new();
        for variant in CodeVariant::ORDER {
            let hits = self.hits(variant, raw, canonical);
            if let (None, Some(&idx)) = (first, hits.first()) {
                first = Some((variant, idx));
            }
            if first_with_edi.is_none() {
                first_with_edi = hits
                    .iter()
                    .find(|&&idx| has_edi(&self.rows[idx]))
                    .map(|&idx| (variant, idx));
            }
            matched.extend_from_slice(hits);
        }
        matched.sort_unstable();
        matched.dedup();

        first_with_edi.or(first).map(|(variant, idx)| SourceMatch {
            kind: self.kind,
            variant,
            row: &self.rows[idx],
            count: matched.len(),
        })
    }
}

fn has_edi(row: &SourceRow) -> bool {
    row.edi_code.as_deref().is_some_and(|e| !e.trim().is_empty())
}

/// Joins input codes against mapping sources in priority order.
///
/// The first source (in load order) that matches a code owns its mapping;
/// later sources never overwrite it. Within a source, rows with an EDI code
/// are preferred; ties go to the first matching [`CodeVariant`], then the
/// first row in table order.
pub struct ReconcileEngine<'a> {
    sources: Vec<IndexedSource<'a>>,
    display_names: HashMap<KCode, String>,
}

impl<'a> ReconcileEngine<'a> {
    /// Create an engine over sources given in priority order.
    pub fn new(sources: &'a [CodeSource]) -> Self {
        let sources = sources.iter().map(IndexedSource::new).collect::<Vec<_>>();
        for source in &sources {
            debug!(
                source = source.kind.as_str(),
                rows = source.rows.len(),
                keys = source.verbatim.len(),
                "Indexed mapping source"
            );
        }
        Self {
            sources,
            display_names: HashMap::new(),
        }
    }

    /// Names that take precedence over a source's drug name.
    pub fn with_display_names(mut self, names: HashMap<KCode, String>) -> Self {
        self.display_names = names;
        self
    }

    /// Reconcile raw input codes.
    pub fn reconcile<I, S>(&self, inputs: I) -> Reconciliation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = ReconcileReport::default();
        let mut entries = Vec::new();
        let mut seen: HashSet<KCode> = HashSet::new();

        for raw in inputs {
            let record = CodeRecord::new(raw.as_ref());
            let raw = record.raw_code.as_str();
            let Some(kcode) = record.normalized_code.clone() else {
                if !record.is_blank() {
                    warn!(code = raw, "Skipping unparseable K-CODE");
                    report.unparseable.push(raw.to_string());
                }
                continue;
            };
            if !seen.insert(kcode.clone()) {
                continue;
            }

            let entry = match self.resolve(raw, &kcode) {
                Some(found) => {
                    if found.count > 1 {
                        debug!(kcode = %kcode, count = found.count, "Multiple source rows matched");
                        report.duplicates.push(DuplicateMatch {
                            kcode: kcode.clone(),
                            count: found.count,
                        });
                    }
                    report.mapped += 1;
                    self.build_entry(kcode, found.kind, found.row)
                }
                None => {
                    report.unmapped += 1;
                    report.unmapped_codes.push(kcode.clone());
                    let name = self.display_names.get(&kcode).cloned();
                    DrugEntry::unmapped(kcode, name)
                }
            };
            entries.push(entry);
        }

        report.total = entries.len();
        info!(
            total = report.total,
            mapped = report.mapped,
            unmapped = report.unmapped,
            duplicates = report.duplicates.len(),
            rate = format!("{:.2}%", report.mapping_rate()),
            "Reconciliation complete"
        );

        Reconciliation { entries, report }
    }

    /// Match from the first source that knows the code.
    fn resolve(&self, raw: &str, kcode: &KCode) -> Option<SourceMatch<'a>> {
        let found = self
            .sources
            .iter()
            .find_map(|source| source.lookup(raw, kcode))?;
        if found.variant != CodeVariant::Canonical {
            debug!(kcode = %kcode, variant = ?found.variant, "Matched via fallback variant");
        }
        Some(found)
    }

    fn build_entry(&self, kcode: KCode, kind: MappingSource, row: &SourceRow) -> DrugEntry {
        let drug_name = self
            .display_names
            .get(&kcode)
            .filter(|n| !n.trim().is_empty())
            .cloned()
            .or_else(|| row.drug_name.clone())
            .unwrap_or_default();

        DrugEntry {
            kcode,
            edi_code: row.edi_code.clone().filter(|e| !e.is_empty()),
            drug_name,
            manufacturer: row.manufacturer.clone().unwrap_or_default(),
            form: row.form.clone(),
            strength: row.strength.clone(),
            source: kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(rows: Vec<SourceRow>) -> CodeSource {
        CodeSource::new(MappingSource::MasterRegistry, rows)
    }

    #[test]
    fn test_exact_match() {
        let sources = vec![registry(vec![
            SourceRow::new("K-000001", "E1").with_name("Alpha"),
        ])];
        let result = ReconcileEngine::new(&sources).reconcile(["K-1"]);

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.entries[0].edi_code.as_deref(), Some("E1"));
        assert_eq!(result.entries[0].drug_name, "Alpha");
        assert_eq!(result.entries[0].source, MappingSource::MasterRegistry);
        assert_eq!(result.report.mapped, 1);
    }

    #[test]
    fn test_separator_flipped_match() {
        let sources = vec![registry(vec![SourceRow::new("K030864", "E5")])];
        let result = ReconcileEngine::new(&sources).reconcile(["K-030864"]);

        assert_eq!(result.report.mapped, 1);
        assert_eq!(result.entries[0].edi_code.as_deref(), Some("E5"));
    }

    #[test]
    fn test_normalized_match_for_unpadded_registry() {
        let sources = vec![registry(vec![
            SourceRow::new("30864", "E6"),
            SourceRow::new("not-a-code", "E0"),
        ])];
        let result = ReconcileEngine::new(&sources).reconcile(["K-030864"]);

        assert_eq!(result.entries[0].edi_code.as_deref(), Some("E6"));
    }

    #[test]
    fn test_textual_match_preferred_over_normalized() {
        // Both rows denote K-000002; the one spelled canonically wins even
        // though it comes later in the table.
        let sources = vec![registry(vec![
            SourceRow::new("2", "E-NORMALIZED"),
            SourceRow::new("K-000002", "E-EXACT"),
        ])];
        let result = ReconcileEngine::new(&sources).reconcile(["K2"]);

        assert_eq!(result.entries[0].edi_code.as_deref(), Some("E-EXACT"));
        assert_eq!(result.report.duplicates[0].count, 2);
    }

    #[test]
    fn test_duplicate_takes_first_row() {
        let sources = vec![registry(vec![
            SourceRow::new("K-000002", "E-FIRST"),
            SourceRow::new("k-000002 ", "E-SECOND"),
        ])];
        let result = ReconcileEngine::new(&sources).reconcile(["K-2"]);

        assert_eq!(result.entries[0].edi_code.as_deref(), Some("E-FIRST"));
        assert_eq!(result.report.duplicates.len(), 1);
        assert_eq!(result.report.duplicates[0].count, 2);
    }

    #[test]
    fn test_first_source_wins() {
        let sources = vec![
            CodeSource::new(
                MappingSource::LabelMap,
                vec![SourceRow::new("K-3", "E-LABEL")],
            ),
            registry(vec![SourceRow::new("K-000003", "E-REGISTRY")]),
        ];
        let result = ReconcileEngine::new(&sources).reconcile(["K3"]);

        assert_eq!(result.entries[0].edi_code.as_deref(), Some("E-LABEL"));
        assert_eq!(result.entries[0].source, MappingSource::LabelMap);
    }

    #[test]
    fn test_unmapped_and_unparseable() {
        let sources = vec![registry(vec![SourceRow::new("K-1", "E1")])];
        let result = ReconcileEngine::new(&sources).reconcile(["K-9999999", "bogus", "", "K-1"]);

        assert_eq!(result.report.total, 2);
        assert_eq!(result.report.unmapped_codes[0].as_str(), "K-9999999");
        assert_eq!(result.report.unparseable, vec!["bogus".to_string()]);
        assert_eq!(result.mapped().count(), 1);
        assert_eq!(
            result.report.mapped + result.report.unmapped,
            result.report.total
        );
    }

    #[test]
    fn test_distinct_inputs() {
        let sources = vec![registry(vec![SourceRow::new("K-1", "E1")])];
        let result = ReconcileEngine::new(&sources).reconcile(["K-1", "K1", "1", "K-000001"]);

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.report.total, 1);
    }

    #[test]
    fn test_display_names_override() {
        let sources = vec![registry(vec![
            SourceRow::new("K-1", "E1").with_name("Registry Name"),
        ])];
        let mut names = HashMap::new();
        names.insert(normalize_kcode("K-1").unwrap(), "Label Name".to_string());
        names.insert(normalize_kcode("K-2").unwrap(), "Unmapped Name".to_string());

        let result = ReconcileEngine::new(&sources)
            .with_display_names(names)
            .reconcile(["K-1", "K-2"]);

        assert_eq!(result.entries[0].drug_name, "Label Name");
        assert_eq!(result.entries[1].drug_name, "Unmapped Name");
    }

    #[test]
    fn test_blank_edi_treated_as_absent() {
        let sources = vec![registry(vec![SourceRow::new("K-4", "")])];
        let result = ReconcileEngine::new(&sources).reconcile(["K-4"]);

        assert!(result.entries[0].is_mapped());
        assert!(result.entries[0].edi_code.is_none());
    }

    #[test]
    fn test_row_with_edi_preferred_over_blank() {
        let sources = vec![registry(vec![
            SourceRow::new("K-000005", ""),
            SourceRow::new("K-000005", "E5").with_name("Epsilon"),
        ])];
        let result = ReconcileEngine::new(&sources).reconcile(["K-5"]);

        assert_eq!(result.entries[0].edi_code.as_deref(), Some("E5"));
        assert_eq!(result.entries[0].drug_name, "Epsilon");
        assert_eq!(result.report.duplicates[0].count, 2);
    }

    #[test]
    fn test_edi_row_from_later_variant_wins() {
        let sources = vec![registry(vec![
            SourceRow::new("K-000006", ""),
            SourceRow::new("6", "E6"),
        ])];
        let result = ReconcileEngine::new(&sources).reconcile(["K-6"]);

        assert_eq!(result.entries[0].edi_code.as_deref(), Some("E6"));
        assert_eq!(result.report.mapped, 1);
    }
}
