//! Drugs master registry loader (delimited text).

use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::info;

use super::{read_text, IngestError, IngestResult, RegistryColumns, RegistryLayout};
use crate::models::{CodeSource, MappingSource, SourceRow};

/// Parse registry CSV text into source rows, in table order.
///
/// Every field is read as text so leading zeros in codes survive.
pub fn parse_registry(text: &str, columns: &RegistryColumns) -> Result<Vec<SourceRow>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let layout = columns.resolve(&headers);

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(project_row(&record?, &layout));
    }
    Ok(rows)
}

fn project_row(record: &StringRecord, layout: &RegistryLayout) -> SourceRow {
    let field = |idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    SourceRow {
        code: field(layout.kcode),
        edi_code: field(layout.edi_code),
        drug_name: field(layout.drug_name),
        manufacturer: field(layout.manufacturer),
        form: field(layout.form),
        strength: field(layout.strength),
    }
}

/// Load the registry from disk as a mapping source.
pub fn load_registry(
    path: &Path,
    columns: &RegistryColumns,
    encodings: &[String],
) -> IngestResult<CodeSource> {
    let text = read_text(path, encodings)?;
    let rows = parse_registry(&text, columns).map_err(|source| IngestError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), rows = rows.len(), "Loaded drugs master registry");
    Ok(CodeSource::new(MappingSource::MasterRegistry, rows))
}
