//! Mapping reports: JSON mapping, statistics, unmapped list, summary CSVs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{csv_with_bom, write_file, ExportResult};
use crate::models::{DrugEntry, DuplicateMatch, KCode, ReconcileReport};
use crate::reconcile::Reconciliation;

pub const MAPPING_JSON: &str = "kcode_edi_mapping.json";
pub const STATISTICS_JSON: &str = "mapping_statistics.json";
pub const UNMAPPED_TXT: &str = "unmapped_kcodes.txt";
pub const SUMMARY_CSV: &str = "kcode_edi_mapping_summary.csv";
pub const WITH_EDI_CSV: &str = "kcode_with_edi.csv";

/// Mapping rate below which the run is flagged for manual follow-up.
pub const LOW_MAPPING_RATE: f64 = 80.0;

const SUMMARY_HEADER: [&str; 6] = [
    "K-CODE",
    "EDI_CODE",
    "DRUG_NAME",
    "MANUFACTURER",
    "FORM",
    "STRENGTH",
];

/// One record of the mapping JSON.
#[derive(Debug, Clone, Serialize)]
struct MappingRecord<'a> {
    kcode: &'a KCode,
    drug_name: &'a str,
    edi_code: &'a str,
    manufacturer: &'a str,
    form: &'a str,
    strength: &'a str,
}

impl<'a> From<&'a DrugEntry> for MappingRecord<'a> {
    fn from(entry: &'a DrugEntry) -> Self {
        Self {
            kcode: &entry.kcode,
            drug_name: &entry.drug_name,
            edi_code: entry.edi_code.as_deref().unwrap_or(""),
            manufacturer: &entry.manufacturer,
            form: entry.form.as_deref().unwrap_or(""),
            strength: entry.strength.as_deref().unwrap_or(""),
        }
    }
}

/// Run statistics as written to `mapping_statistics.json`.
#[derive(Debug, Clone, Serialize)]
pub struct MappingStatistics {
    pub total_kcodes: usize,
    pub mapped_count: usize,
    pub unmapped_count: usize,
    pub unmapped_kcodes: Vec<KCode>,
    pub duplicate_edi: Vec<DuplicateMatch>,
    pub unparseable: Vec<String>,
    pub mapping_rate: f64,
    pub created_at: String,
}

impl MappingStatistics {
    pub fn from_report(report: &ReconcileReport, created_at: DateTime<Local>) -> Self {
        Self {
            total_kcodes: report.total,
            mapped_count: report.mapped,
            unmapped_count: report.unmapped,
            unmapped_kcodes: report.unmapped_codes.clone(),
            duplicate_edi: report.duplicates.clone(),
            unparseable: report.unparseable.clone(),
            mapping_rate: report.mapping_rate(),
            created_at: created_at.to_rfc3339(),
        }
    }
}

/// Mapped entries keyed by K-CODE, in reconciliation order.
///
/// Unmapped codes are left out.
pub fn mapping_json(entries: &[DrugEntry]) -> ExportResult<Value> {
    let mut map = Map::new();
    for entry in entries.iter().filter(|e| e.is_mapped()) {
        map.insert(
            entry.kcode.to_string(),
            serde_json::to_value(MappingRecord::from(entry))?,
        );
    }
    Ok(Value::Object(map))
}

/// Summary CSV rows for mapped entries, optionally only those with an EDI.
pub fn summary_csv<'a, I>(entries: I) -> ExportResult<Vec<u8>>
where
    I: IntoIterator<Item = &'a DrugEntry>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(SUMMARY_HEADER)?;
    for entry in entries {
        writer.write_record([
            entry.kcode.as_str(),
            entry.edi_code.as_deref().unwrap_or(""),
            entry.drug_name.as_str(),
            entry.manufacturer.as_str(),
            entry.form.as_deref().unwrap_or(""),
            entry.strength.as_deref().unwrap_or(""),
        ])?;
    }
    csv_with_bom(writer)
}

/// Files produced by [`write_mapping_reports`].
#[derive(Debug, Clone, Default)]
pub struct MappingOutputs {
    pub mapping: PathBuf,
    pub statistics: PathBuf,
    /// Absent when every code mapped
    pub unmapped: Option<PathBuf>,
    pub summary: PathBuf,
    /// Absent when no mapped entry carries an EDI code
    pub with_edi: Option<PathBuf>,
}

/// Write every mapping report under `output_dir`.
pub fn write_mapping_reports(
    reconciliation: &Reconciliation,
    output_dir: &Path,
) -> ExportResult<MappingOutputs> {
    let report = &reconciliation.report;
    let mut outputs = MappingOutputs {
        mapping: output_dir.join(MAPPING_JSON),
        statistics: output_dir.join(STATISTICS_JSON),
        summary: output_dir.join(SUMMARY_CSV),
        ..MappingOutputs::default()
    };

    let mapping = mapping_json(&reconciliation.entries)?;
    write_file(&outputs.mapping, serde_json::to_string_pretty(&mapping)?.as_bytes())?;
    info!(path = %outputs.mapping.display(), mapped = report.mapped, "Wrote mapping");

    let stats = MappingStatistics::from_report(report, Local::now());
    write_file(&outputs.statistics, serde_json::to_string_pretty(&stats)?.as_bytes())?;
    info!(path = %outputs.statistics.display(), "Wrote mapping statistics");

    if !report.unmapped_codes.is_empty() {
        let path = output_dir.join(UNMAPPED_TXT);
        let mut text = String::new();
        for code in report.sorted_unmapped() {
            text.push_str(code.as_str());
            text.push('\n');
        }
        write_file(&path, text.as_bytes())?;
        info!(path = %path.display(), count = report.unmapped, "Wrote unmapped K-CODE list");
        outputs.unmapped = Some(path);
    }

    write_file(&outputs.summary, &summary_csv(reconciliation.mapped())?)?;

    let with_edi: Vec<&DrugEntry> = reconciliation
        .mapped()
        .filter(|e| e.edi_code.as_deref().is_some_and(|c| !c.is_empty()))
        .collect();
    info!(total = report.mapped, with_edi = with_edi.len(), "Wrote summary CSV");
    if !with_edi.is_empty() {
        let path = output_dir.join(WITH_EDI_CSV);
        write_file(&path, &summary_csv(with_edi)?)?;
        outputs.with_edi = Some(path);
    }

    if report.total > 0 && report.mapping_rate() < LOW_MAPPING_RATE {
        warn!(
            rate = format!("{:.2}", report.mapping_rate()),
            "Mapping rate is below 80%; additional sources or manual mapping may be needed"
        );
    }

    Ok(outputs)
}
