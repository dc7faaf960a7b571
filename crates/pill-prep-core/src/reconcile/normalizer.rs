//! K-CODE normalizer.
//!
//! Handles:
//! - Whitespace and case (` k030864 ` → `K-030864`)
//! - Prefix variants (`K-30864`, `K30864`, `30864`)
//! - Zero padding to six digits
//!
//! Lookup against a registry goes through an ordered list of
//! [`CodeVariant`]s so that inconsistent `K-`/`K` spellings still match.

use crate::models::KCode;

/// Width of the zero-padded numeric suffix.
pub const KCODE_DIGITS: usize = 6;

/// Normalize a raw K-CODE into canonical `K-NNNNNN` form.
///
/// Returns `None` for empty input or when no numeric suffix can be parsed.
/// Leading zeros are dropped; suffixes wider than [`KCODE_DIGITS`] are kept
/// at any length.
pub fn normalize_kcode(raw: &str) -> Option<KCode> {
    let upper = raw.trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }

    let digits = strip_prefix(&upper);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let significant = digits.trim_start_matches('0');
    let number = if significant.is_empty() { "0" } else { significant };
    Some(KCode::from_canonical(format!(
        "K-{number:0>width$}",
        width = KCODE_DIGITS
    )))
}

/// Strip a recognized `K-` or `K` prefix.
fn strip_prefix(code: &str) -> &str {
    code.strip_prefix("K-")
        .or_else(|| code.strip_prefix('K'))
        .unwrap_or(code)
}

/// Trim and uppercase without any other rewriting.
pub fn verbatim_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// One way of spelling an input code when looking it up in a source.
///
/// Sources are indexed twice: by the code exactly as written (trimmed,
/// uppercased) and by its normalized form. Textual matches are preferred
/// over matches that needed registry-side normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeVariant {
    /// Canonical form matched against codes as written, e.g. `K-000001`
    Canonical,
    /// Canonical form with the `K-` separator toggled, e.g. `K000001`
    SeparatorFlipped,
    /// The input exactly as written, e.g. `K-1`
    Verbatim,
    /// Canonical form matched against normalized source codes
    Normalized,
}

impl CodeVariant {
    /// Lookup order. Earlier variants win when several would match.
    pub const ORDER: [CodeVariant; 4] = [
        CodeVariant::Canonical,
        CodeVariant::SeparatorFlipped,
        CodeVariant::Verbatim,
        CodeVariant::Normalized,
    ];

    /// Render the lookup key for this variant.
    pub fn key(&self, raw: &str, canonical: &KCode) -> Option<String> {
        match self {
            CodeVariant::Canonical | CodeVariant::Normalized => {
                Some(canonical.as_str().to_string())
            }
            CodeVariant::SeparatorFlipped => flip_separator(canonical.as_str()),
            CodeVariant::Verbatim => {
                let verbatim = verbatim_code(raw);
                (!verbatim.is_empty()).then_some(verbatim)
            }
        }
    }

    /// Whether the key is looked up among normalized source codes rather
    /// than codes as written.
    pub fn uses_normalized_index(&self) -> bool {
        matches!(self, CodeVariant::Normalized)
    }
}

/// Toggle the `K-` separator: `K-123` → `K123`, `K123` → `K-123`.
///
/// Codes without a `K` prefix have no flipped form.
pub fn flip_separator(code: &str) -> Option<String> {
    if let Some(rest) = code.strip_prefix("K-") {
        Some(format!("K{rest}"))
    } else {
        code.strip_prefix('K').map(|rest| format!("K-{rest}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> Option<String> {
        normalize_kcode(raw).map(|c| c.as_str().to_string())
    }

    #[test]
    fn test_prefix_variants_agree() {
        assert_eq!(norm("K-30864").as_deref(), Some("K-030864"));
        assert_eq!(norm("K030864").as_deref(), Some("K-030864"));
        assert_eq!(norm("30864").as_deref(), Some("K-030864"));
        assert_eq!(norm("  k-030864 ").as_deref(), Some("K-030864"));
    }

    #[test]
    fn test_wide_numbers_unpadded() {
        assert_eq!(norm("K-9999999").as_deref(), Some("K-9999999"));
        assert_eq!(norm("K-1").as_deref(), Some("K-000001"));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(norm(""), None);
        assert_eq!(norm("   "), None);
        assert_eq!(norm("K-"), None);
        assert_eq!(norm("K-12A"), None);
        assert_eq!(norm("-12"), None);
        assert_eq!(norm("KK12"), None);
    }

    #[test]
    fn test_idempotent_on_output() {
        for raw in ["K-1", "K030864", "30864", "K-9999999"] {
            let once = normalize_kcode(raw).unwrap();
            let twice = normalize_kcode(once.as_str()).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_variant_canonical() {
        let canonical = normalize_kcode("k1").unwrap();
        let variant = CodeVariant::Canonical;
        assert_eq!(variant.key("k1", &canonical).as_deref(), Some("K-000001"));
        assert!(!variant.uses_normalized_index());
    }

    #[test]
    fn test_variant_separator_flipped() {
        let canonical = normalize_kcode("K-1").unwrap();
        assert_eq!(
            CodeVariant::SeparatorFlipped.key("K-1", &canonical).as_deref(),
            Some("K000001")
        );
    }

    #[test]
    fn test_variant_verbatim() {
        let canonical = normalize_kcode(" k-1 ").unwrap();
        assert_eq!(
            CodeVariant::Verbatim.key(" k-1 ", &canonical).as_deref(),
            Some("K-1")
        );
    }

    #[test]
    fn test_variant_normalized() {
        let canonical = normalize_kcode("1").unwrap();
        let variant = CodeVariant::Normalized;
        assert_eq!(variant.key("1", &canonical).as_deref(), Some("K-000001"));
        assert!(variant.uses_normalized_index());
    }

    #[test]
    fn test_long_suffix_kept() {
        let digits = "1234567890123456789012345";
        assert_eq!(norm(&format!("K-00{digits}")), Some(format!("K-{digits}")));
        assert_eq!(norm("K-0").as_deref(), Some("K-000000"));
        assert_eq!(norm("0000000").as_deref(), Some("K-000000"));
    }

    #[test]
    fn test_flip_separator() {
        assert_eq!(flip_separator("K-12").as_deref(), Some("K12"));
        assert_eq!(flip_separator("K12").as_deref(), Some("K-12"));
        assert_eq!(flip_separator("12"), None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalize_is_idempotent(n in 0u64..10_000_000_000, prefix in "(K-|K|k-|k|)", pad in " {0,2}") {
                let raw = format!("{pad}{prefix}{n}{pad}");
                let once = normalize_kcode(&raw).unwrap();
                prop_assert_eq!(normalize_kcode(once.as_str()), Some(once.clone()));
                prop_assert_eq!(once.as_str().trim_start_matches("K-").parse::<u64>().unwrap(), n);
            }

            #[test]
            fn prefix_spellings_agree(n in 0u64..1_000_000) {
                let canonical = normalize_kcode(&n.to_string());
                prop_assert_eq!(normalize_kcode(&format!("K{n}")), canonical.clone());
                prop_assert_eq!(normalize_kcode(&format!("K-{n}")), canonical);
            }
        }
    }
}
