//! Report, workbook and load-script writers.

mod checklist;
mod mapping;
mod sql;
mod workbook;

pub use checklist::*;
pub use mapping::*;
pub use sql::*;
pub use workbook::*;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("K-CODE {kcode} appears more than once in the selection")]
    DuplicateKcode { kcode: String },

    #[error("SQL verification failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// UTF-8 byte order mark, prefixed to CSVs meant for spreadsheets.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write bytes to `path`, creating parent directories.
pub fn write_file(path: &Path, contents: &[u8]) -> ExportResult<()> {
    let wrap = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    fs::write(path, contents).map_err(wrap)
}

/// Finish a CSV writer and prefix the buffer with a BOM.
pub(crate) fn csv_with_bom(writer: csv::Writer<Vec<u8>>) -> ExportResult<Vec<u8>> {
    let body = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    let mut bytes = UTF8_BOM.to_vec();
    bytes.extend(body);
    Ok(bytes)
}
