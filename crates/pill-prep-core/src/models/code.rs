//! Drug code identifiers.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::reconcile::normalize_kcode;

/// A K-CODE in canonical `K-NNNNNN` form.
///
/// Only the normalizer constructs values of this type, so two `KCode`s
/// compare equal exactly when their raw inputs denote the same drug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KCode(String);

impl KCode {
    /// Wrap an already-canonical code string.
    pub(crate) fn from_canonical(canonical: String) -> Self {
        Self(canonical)
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for KCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A raw code value paired with its normalized form, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRecord {
    pub raw_code: String,
    pub normalized_code: Option<KCode>,
}

impl CodeRecord {
    /// Normalize a raw code value.
    pub fn new(raw_code: impl Into<String>) -> Self {
        let raw_code = raw_code.into();
        let normalized_code = normalize_kcode(&raw_code);
        Self {
            raw_code,
            normalized_code,
        }
    }

    /// Blank after trimming; such values are dropped without a warning.
    pub fn is_blank(&self) -> bool {
        self.raw_code.trim().is_empty()
    }
}
