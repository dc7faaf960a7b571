//! K-CODE label map loader.
//!
//! The label map is a JSON object keyed by K-CODE. Values are either a plain
//! label string or an object carrying descriptive fields:
//!
//! ```json
//! {
//!   "K-030864": {"name_kr": "...", "company": "...", "edi_codes": ["642102570"]},
//!   "K-000012": "Plain label"
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use super::{read_bytes, IngestError, IngestResult};
use crate::models::{CodeSource, KCode, MappingSource, SourceRow};
use crate::reconcile::normalize_kcode;

/// One label map entry, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelEntry {
    /// Key as written in the file
    pub code: String,
    pub name: Option<String>,
    pub manufacturer: Option<String>,
    /// First non-empty element of `edi_codes`
    pub edi_code: Option<String>,
}

/// Parsed label map.
#[derive(Debug, Clone, Default)]
pub struct LabelMap {
    pub entries: Vec<LabelEntry>,
}

impl LabelMap {
    /// Parse label map JSON. Key order is preserved.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };
        let entries = map
            .into_iter()
            .map(|(code, value)| parse_entry(code, &value))
            .collect();
        Some(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw keys, in file order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.code.as_str())
    }

    /// Entries that carry an EDI code, as a mapping source.
    pub fn to_source(&self) -> CodeSource {
        let rows = self
            .entries
            .iter()
            .filter(|e| e.edi_code.is_some())
            .map(|e| SourceRow {
                code: Some(e.code.clone()),
                edi_code: e.edi_code.clone(),
                drug_name: e.name.clone(),
                manufacturer: e.manufacturer.clone(),
                ..SourceRow::default()
            })
            .collect();
        CodeSource::new(MappingSource::LabelMap, rows)
    }

    /// Labels keyed by normalized code. The first label for a code wins.
    pub fn display_names(&self) -> HashMap<KCode, String> {
        let mut names = HashMap::new();
        for entry in &self.entries {
            let (Some(code), Some(name)) = (normalize_kcode(&entry.code), entry.name.as_ref())
            else {
                continue;
            };
            names.entry(code).or_insert_with(|| name.clone());
        }
        names
    }
}

fn parse_entry(code: String, value: &Value) -> LabelEntry {
    match value {
        Value::String(label) => LabelEntry {
            code,
            name: non_empty(label),
            ..LabelEntry::default()
        },
        Value::Object(info) => LabelEntry {
            code,
            name: info.get("name_kr").and_then(value_text),
            manufacturer: info.get("company").and_then(value_text),
            edi_code: info
                .get("edi_codes")
                .and_then(Value::as_array)
                .and_then(|codes| codes.iter().find_map(value_text)),
        },
        _ => LabelEntry {
            code,
            ..LabelEntry::default()
        },
    }
}

/// Trimmed text of a string or number value.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Load the label map from disk.
pub fn load_label_map(path: &Path) -> IngestResult<LabelMap> {
    let bytes = read_bytes(path)?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|source| IngestError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let map = LabelMap::from_value(value).ok_or_else(|| IngestError::LabelMapShape {
        path: path.to_path_buf(),
    })?;
    info!(path = %path.display(), codes = map.len(), "Loaded K-CODE label map");
    Ok(map)
}
