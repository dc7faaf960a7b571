//! Source loaders for label maps, registries and workbooks.
//!
//! Every loader projects its input into [`SourceRow`](crate::models::SourceRow)s
//! or a plain [`RawTable`], preserving table order.

mod columns;
mod label_map;
mod registry;
mod text;
mod workbook;

pub use columns::*;
pub use label_map::*;
pub use registry::*;
pub use text::*;
pub use workbook::*;

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Ingestion errors. All of them abort the run.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("input file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not decode {path} with any of: {tried}")]
    Encoding { path: PathBuf, tried: String },

    #[error("unknown text encoding label: {0}")]
    UnknownEncoding(String),

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse JSON {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("label map {path} must be a JSON object")]
    LabelMapShape { path: PathBuf },

    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("workbook {path} has no sheet at index {index}")]
    MissingSheet { path: PathBuf, index: usize },
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Fail with [`IngestError::FileNotFound`] unless `path` exists.
pub fn ensure_exists(path: &Path) -> IngestResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Read a whole file, mapping a missing file to [`IngestError::FileNotFound`].
pub(crate) fn read_bytes(path: &Path) -> IngestResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// A sheet or delimited table as rows of trimmed strings.
///
/// Positions are absolute: row 0 is the first row of the sheet and
/// column 0 its first column, even when those cells are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Non-empty cell at the given position.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    /// Widest row length.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/data/drugs_master.csv"),
        };
        assert_eq!(err.to_string(), "input file not found: /data/drugs_master.csv");
    }

    #[test]
    fn test_ensure_exists_missing() {
        let result = ensure_exists(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
    }

    #[test]
    fn test_raw_table_cells() {
        let table = RawTable::new(vec![
            vec!["a".into(), "  ".into()],
            vec!["b".into(), " c ".into(), "d".into()],
        ]);
        assert_eq!(table.cell(0, 0), Some("a"));
        assert_eq!(table.cell(0, 1), None);
        assert_eq!(table.cell(1, 1), Some("c"));
        assert_eq!(table.cell(5, 0), None);
        assert_eq!(table.width(), 3);
    }
}
