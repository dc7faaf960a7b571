//! Pill-Prep Core Library
//!
//! K-CODE/EDI reconciliation and drug-selection preparation for the pill
//! photo dataset.
//!
//! # Architecture
//!
//! ```text
//!  Label map (JSON)     Master registry (CSV)      Code list (xlsx)
//!        │                      │                        │
//!        └──────────┬───────────┘                        │
//!                   ▼                                    ▼
//!          Ordered CodeSources ──────► Reconciliation ◄── Normalization
//!                                            │
//!                     ┌──────────────────────┤
//!                     ▼                      ▼
//!              Mapping reports      Left join with usage ◄── Usage log (xlsx)
//!           (JSON, CSV, TXT)                 │
//!                                 Rank → Dedup by EDI → Re-rank
//!                                            │
//!                                  Selection workbook
//!                                            │
//!                                   [manual curation]
//!                                            │
//!                                 Selected drugs (JSON)
//!                                            │
//!                              SQL load script + checklist
//! ```
//!
//! # Modules
//!
//! - [`config`]: TOML run configuration
//! - [`ingest`]: Loaders for the label map, registry and workbooks
//! - [`models`]: Domain types (KCode, DrugEntry, SelectionRow, etc.)
//! - [`reconcile`]: Code normalizer and reconciliation engine
//! - [`ranking`]: Usage aggregation, ranking and deduplication
//! - [`export`]: Reports, selection workbook, load script and checklist
//! - [`pipeline`]: End-to-end runs used by the CLI

pub mod config;
pub mod export;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod ranking;
pub mod reconcile;

// Re-export commonly used types
pub use config::{ConfigError, PrepConfig};
pub use export::{dry_run, ExportError, LoadScript};
pub use ingest::{IngestError, RawTable, UsageLayout};
pub use models::{
    CodeRecord, DrugEntry, KCode, MappingSource, ReconcileReport, SelectedDrug, SelectedDrugSet,
    SelectionRow, UsageTable,
};
pub use pipeline::{
    build_mapping, generate_load_script, prepare_selection, write_load_script, PipelineError,
};
pub use ranking::{aggregate_usage, rank_selection, RankedSelection, SelectionStats};
pub use reconcile::{normalize_kcode, CodeVariant, ReconcileEngine, Reconciliation};
