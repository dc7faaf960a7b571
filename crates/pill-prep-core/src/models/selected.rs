//! Curated final selection consumed by the load-script generator.

use serde::{Deserialize, Serialize};

/// The hand-curated selection file (`top_100_metadata_final.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectedDrugSet {
    #[serde(default)]
    pub total_drugs: usize,
    #[serde(default)]
    pub statistics: SelectionSummary,
    pub drugs: Vec<SelectedDrug>,
}

/// Summary block of the selection file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionSummary {
    #[serde(default)]
    pub total_usage: i64,
    #[serde(default)]
    pub average_usage: f64,
    #[serde(default, rename = "shootable_Y")]
    pub shootable_y: usize,
    #[serde(default, rename = "shootable_M")]
    pub shootable_m: usize,
}

/// A single selected drug. Every field except the code may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectedDrug {
    #[serde(default)]
    pub kcode: String,
    #[serde(default)]
    pub edi_code: Option<String>,
    #[serde(default)]
    pub drug_name: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub usage_count: Option<i64>,
    #[serde(default)]
    pub shootable: Option<String>,
}

impl SelectedDrug {
    /// Shootable grade, defaulting to `Y`.
    pub fn shootable_or_default(&self) -> &str {
        match self.shootable.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => "Y",
        }
    }
}

impl SelectedDrugSet {
    /// Parse the selection file contents.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Number of drugs that carry an EDI code.
    pub fn with_edi_count(&self) -> usize {
        self.drugs
            .iter()
            .filter(|d| d.edi_code.as_deref().is_some_and(|e| !e.is_empty()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_selection_file() {
        let json = r#"{
            "total_drugs": 2,
            "statistics": {"total_usage": 120, "average_usage": 60.0, "shootable_Y": 1, "shootable_M": 1},
            "drugs": [
                {"kcode": "K-000001", "edi_code": "E1", "drug_name": "A", "usage_count": 100, "shootable": "M"},
                {"kcode": "K-000002", "edi_code": null, "drug_name": null}
            ]
        }"#;

        let set = SelectedDrugSet::from_json(json).unwrap();
        assert_eq!(set.total_drugs, 2);
        assert_eq!(set.statistics.shootable_m, 1);
        assert_eq!(set.drugs[0].shootable_or_default(), "M");
        assert_eq!(set.drugs[1].shootable_or_default(), "Y");
        assert_eq!(set.with_edi_count(), 1);
    }
}
