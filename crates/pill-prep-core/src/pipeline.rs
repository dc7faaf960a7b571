//! End-to-end runs over a [`PrepConfig`].

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::config::PrepConfig;
use crate::export::{
    capture_checklist, dry_run, write_file, write_mapping_reports, write_selection_workbook,
    ExportError, LoadScript, MappingOutputs, SELECTION_WORKBOOK,
};
use crate::ingest::{
    load_code_list, load_label_map, load_registry, load_usage_table, read_bytes, IngestError,
    LabelMap,
};
use crate::models::{CodeSource, SelectedDrugSet, UsageTable};
use crate::ranking::{aggregate_usage, rank_selection, RankedSelection};
use crate::reconcile::{ReconcileEngine, Reconciliation};

/// Pipeline errors.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to parse selection file {path}: {source}")]
    Selection {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Both mapping sources, in lookup priority order.
pub struct LoadedSources {
    pub label_map: LabelMap,
    /// Label map first, then the master registry
    pub sources: Vec<CodeSource>,
}

impl LoadedSources {
    pub fn load(config: &PrepConfig) -> PipelineResult<Self> {
        let label_map = load_label_map(&config.paths.label_map)?;
        let registry = load_registry(
            &config.paths.registry,
            &config.registry_columns,
            &config.encodings,
        )?;
        let sources = vec![label_map.to_source(), registry];
        Ok(Self { label_map, sources })
    }

    /// Reconcile raw codes, with label-map names taking precedence.
    pub fn reconcile<I, S>(&self, inputs: I) -> Reconciliation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ReconcileEngine::new(&self.sources)
            .with_display_names(self.label_map.display_names())
            .reconcile(inputs)
    }
}

/// Output of the `map` run.
pub struct MappingRun {
    pub reconciliation: Reconciliation,
    pub outputs: MappingOutputs,
}

/// Map every label-map K-CODE to an EDI code and write the reports.
pub fn build_mapping(config: &PrepConfig, output_dir: &Path) -> PipelineResult<MappingRun> {
    let loaded = LoadedSources::load(config)?;
    let reconciliation = loaded.reconcile(loaded.label_map.codes());
    let outputs = write_mapping_reports(&reconciliation, output_dir)?;
    Ok(MappingRun {
        reconciliation,
        outputs,
    })
}

/// Output of the `select` run.
#[derive(Debug)]
pub struct SelectionRun {
    pub reconciliation: Reconciliation,
    pub usage: UsageTable,
    pub selection: RankedSelection,
    pub workbook: PathBuf,
}

/// Rank the dataset's K-CODEs by pharmacy usage and write the workspace.
pub fn prepare_selection(
    config: &PrepConfig,
    output_dir: &Path,
    top_n: usize,
) -> PipelineResult<SelectionRun> {
    let codes = load_code_list(&config.paths.code_list, &config.code_list)?;
    info!(codes = codes.len(), "Loaded dataset code list");

    let loaded = LoadedSources::load(config)?;
    let reconciliation = loaded.reconcile(&codes);

    let table = load_usage_table(&config.paths.usage_log, &config.usage)?;
    let usage = aggregate_usage(&table, &config.usage);

    let selection = rank_selection(&reconciliation.entries, &usage);
    let workbook = output_dir.join(SELECTION_WORKBOOK);
    write_selection_workbook(&selection, top_n, &workbook)?;

    Ok(SelectionRun {
        reconciliation,
        usage,
        selection,
        workbook,
    })
}

/// Read the curated selection file.
pub fn load_selected_drugs(path: &Path) -> PipelineResult<SelectedDrugSet> {
    let bytes = read_bytes(path)?;
    let text = String::from_utf8_lossy(&bytes);
    let text = text.trim_start_matches('\u{feff}');
    SelectedDrugSet::from_json(text).map_err(|source| PipelineError::Selection {
        path: path.to_path_buf(),
        source,
    })
}

/// Render the load script for the curated selection file.
pub fn generate_load_script(path: &Path) -> PipelineResult<(SelectedDrugSet, LoadScript)> {
    let set = load_selected_drugs(path)?;
    let script = LoadScript::generate(&set)?;
    Ok((set, script))
}

/// Output of the `load-script` run.
#[derive(Debug)]
pub struct LoadScriptRun {
    pub selection: SelectedDrugSet,
    pub script: LoadScript,
    pub sql_path: PathBuf,
    pub checklist_path: PathBuf,
    /// Rows loaded by the SQLite dry run, when requested
    pub verified_rows: Option<usize>,
}

/// Write the load script and capture checklist for the curated selection.
pub fn write_load_script(
    input: &Path,
    sql_path: &Path,
    checklist_path: &Path,
    verify: bool,
) -> PipelineResult<LoadScriptRun> {
    let (selection, script) = generate_load_script(input)?;

    let verified_rows = if verify {
        let rows = dry_run(&script.sql)?;
        info!(rows, "Load script verified against SQLite");
        Some(rows)
    } else {
        None
    };

    write_file(sql_path, script.sql.as_bytes())?;
    info!(path = %sql_path.display(), "Wrote load script");
    write_file(checklist_path, &capture_checklist(&selection)?)?;
    info!(path = %checklist_path.display(), "Wrote capture checklist");

    Ok(LoadScriptRun {
        selection,
        script,
        sql_path: sql_path.to_path_buf(),
        checklist_path: checklist_path.to_path_buf(),
        verified_rows,
    })
}
