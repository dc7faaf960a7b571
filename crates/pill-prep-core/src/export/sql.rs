//! SQL load script for the curated drug selection.
//!
//! The script upserts into `drugs_master` keyed on `kcode` and carries the
//! same payload as a commented `load_selected_drugs(jsonb)` call.

use std::collections::HashSet;

use chrono::{DateTime, Local};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use super::{ExportError, ExportResult};
use crate::models::{SelectedDrug, SelectedDrugSet};

pub const LOAD_SCRIPT_SQL: &str = "supabase_load_drugs.sql";

/// Columns written by the upsert, in order.
pub const DRUGS_MASTER_COLUMNS: [&str; 6] = [
    "kcode",
    "edi_code",
    "drug_name",
    "manufacturer",
    "usage_count",
    "shootable",
];

/// Minimal `drugs_master` table used to verify a generated script.
const VERIFY_SCHEMA: &str = r#"
CREATE TABLE drugs_master (
    kcode TEXT PRIMARY KEY,
    edi_code TEXT,
    drug_name TEXT,
    manufacturer TEXT,
    usage_count INTEGER,
    shootable TEXT
);
"#;

/// Quote a string literal, mapping absent or empty values to `NULL`.
pub fn sql_str(value: Option<&str>) -> String {
    match value {
        Some(s) if !s.is_empty() => format!("'{}'", s.replace('\'', "''")),
        _ => "NULL".to_string(),
    }
}

/// Row of the stored-procedure payload.
#[derive(Debug, Serialize)]
struct PayloadDrug<'a> {
    kcode: &'a str,
    edi_code: &'a str,
    drug_name: &'a str,
    manufacturer: &'a str,
    usage_count: i64,
    shootable: &'a str,
}

impl<'a> From<&'a SelectedDrug> for PayloadDrug<'a> {
    fn from(drug: &'a SelectedDrug) -> Self {
        Self {
            kcode: &drug.kcode,
            edi_code: drug.edi_code.as_deref().unwrap_or(""),
            drug_name: drug.drug_name.as_deref().unwrap_or(""),
            manufacturer: drug.manufacturer.as_deref().unwrap_or(""),
            usage_count: drug.usage_count.unwrap_or(0),
            shootable: drug.shootable_or_default(),
        }
    }
}

fn values_row(drug: &SelectedDrug) -> String {
    let usage = drug
        .usage_count
        .map(|u| u.to_string())
        .unwrap_or_else(|| "NULL".to_string());
    format!(
        "  ({}, {}, {}, {}, {}, {})",
        sql_str(Some(&drug.kcode)),
        sql_str(drug.edi_code.as_deref()),
        sql_str(drug.drug_name.as_deref()),
        sql_str(drug.manufacturer.as_deref()),
        usage,
        sql_str(Some(drug.shootable_or_default())),
    )
}

/// A rendered load script.
#[derive(Debug, Clone)]
pub struct LoadScript {
    pub sql: String,
    /// Rows in the INSERT statement
    pub drug_count: usize,
}

impl LoadScript {
    /// Render the script for a selection, stamped with the current time.
    pub fn generate(set: &SelectedDrugSet) -> ExportResult<Self> {
        Self::generate_at(set, Local::now())
    }

    /// Render the script with an explicit generation timestamp.
    ///
    /// Fails with [`ExportError::DuplicateKcode`] when a K-CODE repeats: a
    /// single upsert may not touch the same key twice.
    pub fn generate_at(set: &SelectedDrugSet, generated_at: DateTime<Local>) -> ExportResult<Self> {
        let mut seen = HashSet::new();
        if let Some(dup) = set.drugs.iter().find(|d| !seen.insert(d.kcode.as_str())) {
            return Err(ExportError::DuplicateKcode {
                kcode: dup.kcode.clone(),
            });
        }

        let mut sql = String::new();
        sql.push_str("-- Selected drugs load script\n");
        sql.push_str(&format!("-- Generated: {}\n", generated_at.format("%Y-%m-%d")));
        sql.push_str(&format!("-- Total drugs: {}\n\n", set.drugs.len()));

        if set.drugs.is_empty() {
            sql.push_str("-- No drugs selected; nothing to insert.\n");
            info!("Selection is empty; load script has no INSERT");
            return Ok(Self { sql, drug_count: 0 });
        }

        sql.push_str("-- Direct INSERT\n");
        sql.push_str(&format!(
            "INSERT INTO drugs_master ({})\nVALUES\n",
            DRUGS_MASTER_COLUMNS.join(", ")
        ));
        let values: Vec<String> = set.drugs.iter().map(values_row).collect();
        sql.push_str(&values.join(",\n"));
        sql.push_str("\nON CONFLICT (kcode) DO UPDATE SET\n");
        sql.push_str("  edi_code = EXCLUDED.edi_code,\n");
        sql.push_str("  drug_name = EXCLUDED.drug_name,\n");
        sql.push_str("  manufacturer = EXCLUDED.manufacturer,\n");
        sql.push_str("  usage_count = EXCLUDED.usage_count;\n\n");

        let payload: Vec<PayloadDrug> = set.drugs.iter().map(PayloadDrug::from).collect();
        // `*/` inside a string would end the comment; `\/` is the same JSON text
        let json = serde_json::to_string(&payload)?.replace("*/", "*\\/");
        sql.push_str("-- Alternatively, via the stored procedure\n");
        sql.push_str("/*\n");
        sql.push_str(&format!(
            "SELECT load_selected_drugs('{}'::jsonb);\n",
            json.replace('\'', "''")
        ));
        sql.push_str("*/\n");

        info!(drugs = set.drugs.len(), "Generated load script");
        Ok(Self {
            sql,
            drug_count: set.drugs.len(),
        })
    }
}

/// Execute a script against an in-memory `drugs_master` and count rows.
///
/// Checks syntax and literal quoting only. SQLite applies a multi-row upsert
/// row by row, so key uniqueness is enforced by [`LoadScript::generate`].
pub fn dry_run(sql: &str) -> ExportResult<usize> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(VERIFY_SCHEMA)?;
    conn.execute_batch(sql)?;
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM drugs_master", [], |row| row.get(0))?;
    debug!(rows = count, "Dry-run load script");
    Ok(count as usize)
}
