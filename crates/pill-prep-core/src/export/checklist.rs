//! Capture progress checklist.

use super::{csv_with_bom, ExportResult};
use crate::models::SelectedDrugSet;

pub const CHECKLIST_CSV: &str = "capture_checklist.csv";

/// Drugs listed on the checklist.
pub const CHECKLIST_LIMIT: usize = 20;

const CHECKLIST_HEADER: [&str; 6] = ["K-CODE", "DRUG_NAME", "SHOOTABLE", "FRONT", "BACK", "DONE"];

/// Unchecked box placeholder.
const UNCHECKED: &str = "[]";

/// Render the checklist CSV for the first [`CHECKLIST_LIMIT`] drugs.
pub fn capture_checklist(set: &SelectedDrugSet) -> ExportResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CHECKLIST_HEADER)?;
    for drug in set.drugs.iter().take(CHECKLIST_LIMIT) {
        writer.write_record([
            drug.kcode.as_str(),
            drug.drug_name.as_deref().unwrap_or(""),
            drug.shootable_or_default(),
            UNCHECKED,
            UNCHECKED,
            UNCHECKED,
        ])?;
    }
    csv_with_bom(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SelectedDrug;

    fn text(bytes: &[u8]) -> String {
        String::from_utf8(bytes[3..].to_vec()).unwrap()
    }

    #[test]
    fn test_checklist_limit() {
        let drugs = (1..=25)
            .map(|i| SelectedDrug {
                kcode: format!("K-{i:06}"),
                drug_name: Some(format!("Drug {i}")),
                ..SelectedDrug::default()
            })
            .collect();
        let set = SelectedDrugSet {
            drugs,
            ..SelectedDrugSet::default()
        };

        let csv = text(&capture_checklist(&set).unwrap());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 21);
        assert_eq!(lines[0], "K-CODE,DRUG_NAME,SHOOTABLE,FRONT,BACK,DONE");
        assert_eq!(lines[1], "K-000001,Drug 1,Y,[],[],[]");
    }

    #[test]
    fn test_checklist_quotes_commas() {
        let set = SelectedDrugSet {
            drugs: vec![SelectedDrug {
                kcode: "K-000007".into(),
                drug_name: Some("Amoxicillin, 500mg".into()),
                shootable: Some("M".into()),
                ..SelectedDrug::default()
            }],
            ..SelectedDrugSet::default()
        };
        let csv = text(&capture_checklist(&set).unwrap());
        assert!(csv.contains("K-000007,\"Amoxicillin, 500mg\",M,[],[],[]"));
    }

    #[test]
    fn test_empty_checklist_is_header_only() {
        let csv = text(&capture_checklist(&SelectedDrugSet::default()).unwrap());
        assert_eq!(csv.lines().count(), 1);
    }
}
