//! Text decoding with an ordered encoding fallback list.

use std::path::Path;

use encoding_rs::Encoding;
use tracing::debug;

use super::{read_bytes, IngestError, IngestResult};

/// Default fallback order for delimited text exports.
pub const DEFAULT_ENCODINGS: &[&str] = &["utf-8", "euc-kr"];

/// Resolve encoding labels, failing on the first unknown label.
pub fn resolve_encodings(labels: &[String]) -> IngestResult<Vec<&'static Encoding>> {
    labels
        .iter()
        .map(|label| {
            Encoding::for_label(label.trim().as_bytes())
                .ok_or_else(|| IngestError::UnknownEncoding(label.clone()))
        })
        .collect()
}

/// Decode bytes with the first encoding that accepts them without errors.
///
/// A UTF-8 byte-order mark is stripped regardless of the encoding chosen.
pub fn decode_with_fallback(
    bytes: &[u8],
    encodings: &[&'static Encoding],
) -> Option<(String, &'static Encoding)> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    encodings.iter().find_map(|encoding| {
        encoding
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| (text.into_owned(), *encoding))
    })
}

/// Read a text file, trying each encoding label in order.
pub fn read_text(path: &Path, labels: &[String]) -> IngestResult<String> {
    let encodings = resolve_encodings(labels)?;
    let bytes = read_bytes(path)?;
    let (text, encoding) =
        decode_with_fallback(&bytes, &encodings).ok_or_else(|| IngestError::Encoding {
            path: path.to_path_buf(),
            tried: labels.join(", "),
        })?;
    debug!(path = %path.display(), encoding = encoding.name(), "Decoded text file");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_utf8_first() {
        let encodings = resolve_encodings(&labels(DEFAULT_ENCODINGS)).unwrap();
        let (text, encoding) = decode_with_fallback("약품명".as_bytes(), &encodings).unwrap();
        assert_eq!(text, "약품명");
        assert_eq!(encoding, encoding_rs::UTF_8);
    }

    #[test]
    fn test_falls_back_to_euc_kr() {
        let (bytes, _, _) = encoding_rs::EUC_KR.encode("제조사,kcode");
        let encodings = resolve_encodings(&labels(DEFAULT_ENCODINGS)).unwrap();
        let (text, encoding) = decode_with_fallback(&bytes, &encodings).unwrap();
        assert_eq!(text, "제조사,kcode");
        assert_eq!(encoding, encoding_rs::EUC_KR);
    }

    #[test]
    fn test_strips_utf8_bom() {
        let encodings = resolve_encodings(&labels(&["utf-8"])).unwrap();
        let (text, _) = decode_with_fallback(b"\xEF\xBB\xBFkcode", &encodings).unwrap();
        assert_eq!(text, "kcode");
    }

    #[test]
    fn test_exhausted_fallbacks_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[0xFF, 0xFE, 0xFF, 0x00, 0xC3]).unwrap();

        let result = read_text(file.path(), &labels(&["utf-8"]));
        assert!(matches!(result, Err(IngestError::Encoding { .. })));
    }

    #[test]
    fn test_unknown_label() {
        let result = resolve_encodings(&labels(&["klingon"]));
        assert!(matches!(result, Err(IngestError::UnknownEncoding(_))));
    }
}
