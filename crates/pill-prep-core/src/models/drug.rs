//! Drug mapping models.

use serde::{Deserialize, Serialize};

use super::KCode;

/// Which source supplied the EDI mapping for a K-CODE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    /// The K-CODE label map (JSON).
    LabelMap,
    /// The drugs master registry (CSV).
    MasterRegistry,
    /// No source matched.
    None,
}

impl MappingSource {
    /// Stable name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            MappingSource::LabelMap => "label_map",
            MappingSource::MasterRegistry => "master_registry",
            MappingSource::None => "none",
        }
    }
}

/// A row projected from a source table into the uniform drug shape.
///
/// Every field may be absent; loaders never reject a row for missing data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRow {
    /// Raw K-CODE as it appears in the source
    pub code: Option<String>,
    /// EDI billing code
    pub edi_code: Option<String>,
    /// Drug display name
    pub drug_name: Option<String>,
    /// Manufacturer name
    pub manufacturer: Option<String>,
    /// Dosage form
    pub form: Option<String>,
    /// Strength
    pub strength: Option<String>,
}

impl SourceRow {
    /// Create a row with only code and EDI set.
    pub fn new(code: impl Into<String>, edi_code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            edi_code: Some(edi_code.into()),
            ..Self::default()
        }
    }

    /// Set the drug name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.drug_name = Some(name.into());
        self
    }

    /// Set the manufacturer.
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }
}

/// A loaded mapping source: rows in table order plus their origin.
#[derive(Debug, Clone)]
pub struct CodeSource {
    pub kind: MappingSource,
    pub rows: Vec<SourceRow>,
}

impl CodeSource {
    pub fn new(kind: MappingSource, rows: Vec<SourceRow>) -> Self {
        Self { kind, rows }
    }
}

/// A reconciled drug keyed by its normalized K-CODE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrugEntry {
    pub kcode: KCode,
    pub edi_code: Option<String>,
    pub drug_name: String,
    pub manufacturer: String,
    pub form: Option<String>,
    pub strength: Option<String>,
    pub source: MappingSource,
}

impl DrugEntry {
    /// Entry for a code no source could map.
    pub fn unmapped(kcode: KCode, drug_name: Option<String>) -> Self {
        Self {
            kcode,
            edi_code: None,
            drug_name: drug_name.unwrap_or_default(),
            manufacturer: String::new(),
            form: None,
            strength: None,
            source: MappingSource::None,
        }
    }

    /// Whether a source supplied a mapping.
    pub fn is_mapped(&self) -> bool {
        self.source != MappingSource::None
    }
}
