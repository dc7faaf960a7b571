//! Declared column aliases for tabular sources.
//!
//! Each logical field lists the header spellings it accepts. Headers and
//! aliases are compared after folding: trimmed, uppercased, with spaces
//! and hyphens turned into underscores.

use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;
use tracing::warn;

/// Minimum similarity for a header to be suggested as a likely alias.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Fold a header or alias for comparison.
pub fn fold_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_uppercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

/// Index of the first alias (in alias order) present in `headers`.
pub fn find_column(headers: &[String], aliases: &[String]) -> Option<usize> {
    let folded: Vec<String> = headers.iter().map(|h| fold_header(h)).collect();
    aliases.iter().find_map(|alias| {
        let alias = fold_header(alias);
        folded.iter().position(|h| *h == alias)
    })
}

/// Header most similar to any alias, for diagnostics.
pub fn suggest_column<'h>(headers: &'h [String], aliases: &[String]) -> Option<&'h str> {
    headers
        .iter()
        .filter_map(|header| {
            let folded = fold_header(header);
            aliases
                .iter()
                .map(|alias| jaro_winkler(&folded, &fold_header(alias)))
                .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
                .map(|score| (header.as_str(), score))
        })
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(header, _)| header)
}

/// Accepted header aliases for a drug registry table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryColumns {
    pub kcode: Vec<String>,
    pub edi_code: Vec<String>,
    pub drug_name: Vec<String>,
    pub manufacturer: Vec<String>,
    pub form: Vec<String>,
    pub strength: Vec<String>,
}

fn aliases(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for RegistryColumns {
    fn default() -> Self {
        Self {
            kcode: aliases(&["K-CODE", "KCODE", "K_CODE"]),
            edi_code: aliases(&["EDI_CODE", "EDI", "EDI CODE"]),
            drug_name: aliases(&["DRUG_NAME", "ITEM_NAME", "약품명"]),
            manufacturer: aliases(&["MANUFACTURER", "ENTP_NAME", "제조사"]),
            form: aliases(&["FORM", "제형"]),
            strength: aliases(&["STRENGTH", "함량"]),
        }
    }
}

/// Resolved column positions for one registry table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryLayout {
    pub kcode: Option<usize>,
    pub edi_code: Option<usize>,
    pub drug_name: Option<usize>,
    pub manufacturer: Option<usize>,
    pub form: Option<usize>,
    pub strength: Option<usize>,
}

impl RegistryColumns {
    /// Resolve aliases against a header row.
    ///
    /// Missing code columns are not an error: the affected field is absent
    /// on every row. A warning names the closest header, if any.
    pub fn resolve(&self, headers: &[String]) -> RegistryLayout {
        let layout = RegistryLayout {
            kcode: find_column(headers, &self.kcode),
            edi_code: find_column(headers, &self.edi_code),
            drug_name: find_column(headers, &self.drug_name),
            manufacturer: find_column(headers, &self.manufacturer),
            form: find_column(headers, &self.form),
            strength: find_column(headers, &self.strength),
        };

        for (field, found, accepted) in [
            ("kcode", layout.kcode, &self.kcode),
            ("edi_code", layout.edi_code, &self.edi_code),
        ] {
            if found.is_none() {
                warn!(
                    field,
                    accepted = ?accepted,
                    closest = suggest_column(headers, accepted).unwrap_or("-"),
                    "No column matched; field will be absent"
                );
            }
        }

        layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fold_header() {
        assert_eq!(fold_header(" k-code "), "K_CODE");
        assert_eq!(fold_header("edi code"), "EDI_CODE");
        assert_eq!(fold_header("\u{feff}kcode"), "KCODE");
    }

    #[test]
    fn test_find_column_case_and_order_insensitive() {
        let cols = headers(&["item_name", "edi_code", "kcode"]);
        let layout = RegistryColumns::default().resolve(&cols);

        assert_eq!(layout.kcode, Some(2));
        assert_eq!(layout.edi_code, Some(1));
        assert_eq!(layout.drug_name, Some(0));
        assert_eq!(layout.manufacturer, None);
    }

    #[test]
    fn test_alias_priority() {
        // EDI_CODE is listed before EDI, so it wins even though EDI comes first
        let cols = headers(&["EDI", "EDI_CODE"]);
        assert_eq!(find_column(&cols, &RegistryColumns::default().edi_code), Some(1));
    }

    #[test]
    fn test_missing_column() {
        let cols = headers(&["name", "price"]);
        assert_eq!(RegistryColumns::default().resolve(&cols).kcode, None);
    }

    #[test]
    fn test_suggest_column() {
        let cols = headers(&["K_COD", "price"]);
        assert_eq!(
            suggest_column(&cols, &RegistryColumns::default().kcode),
            Some("K_COD")
        );
        let cols = headers(&["price"]);
        assert_eq!(suggest_column(&cols, &RegistryColumns::default().kcode), None);
    }
}
