//! Run configuration.
//!
//! Every field has a default, so an empty (or absent) config file is valid.
//! Relative paths in a config file are resolved against the file's directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ingest::{resolve_encodings, CodeListLayout, RegistryColumns, UsageLayout, DEFAULT_ENCODINGS};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Named input and output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// K-CODE label map (JSON)
    pub label_map: PathBuf,
    /// Drugs master registry (CSV)
    pub registry: PathBuf,
    /// Dataset code-list workbook
    pub code_list: PathBuf,
    /// Pharmacy usage-log workbook
    pub usage_log: PathBuf,
    /// Curated final selection (JSON)
    pub selected_drugs: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            label_map: PathBuf::from("data/kcode_label_map.json"),
            registry: PathBuf::from("data/drugs_master.csv"),
            code_list: PathBuf::from("data/single_list.xlsx"),
            usage_log: PathBuf::from("data/actual_list.xlsx"),
            selected_drugs: PathBuf::from("artifacts/top_100_metadata_final.json"),
            output_dir: PathBuf::from("artifacts"),
        }
    }
}

impl PathConfig {
    fn resolve_against(&mut self, base: &Path) {
        for path in [
            &mut self.label_map,
            &mut self.registry,
            &mut self.code_list,
            &mut self.usage_log,
            &mut self.selected_drugs,
            &mut self.output_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Storage service settings for the upload smoke test.
///
/// Credentials are never read from the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub url: Option<String>,
    pub bucket: String,
    pub table: String,
    /// Top-level folder for capture objects
    pub category: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            url: None,
            bucket: "pill-photos".to_string(),
            table: "capture_real_photos".to_string(),
            category: "CS_1_single".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrepConfig {
    pub paths: PathConfig,
    pub registry_columns: RegistryColumns,
    pub code_list: CodeListLayout,
    pub usage: UsageLayout,
    /// Encoding labels tried in order when decoding text sources
    pub encodings: Vec<String>,
    /// Size of the top-N sheet
    pub top_n: usize,
    pub storage: StorageSettings,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            paths: PathConfig::default(),
            registry_columns: RegistryColumns::default(),
            code_list: CodeListLayout::default(),
            usage: UsageLayout::default(),
            encodings: DEFAULT_ENCODINGS.iter().map(|e| e.to_string()).collect(),
            top_n: 200,
            storage: StorageSettings::default(),
        }
    }
}

impl PrepConfig {
    /// Parse TOML text. Paths are left as written.
    pub fn from_toml_str(text: &str, origin: &Path) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, resolving relative paths against its directory.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&text, path)?;
        if let Some(base) = path.parent() {
            config.paths.resolve_against(base);
        }
        Ok(config)
    }

    /// Load `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".into()));
        }
        if self.encodings.is_empty() {
            return Err(ConfigError::Invalid("encodings must not be empty".into()));
        }
        resolve_encodings(&self.encodings).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.registry_columns.kcode.is_empty() || self.registry_columns.edi_code.is_empty() {
            return Err(ConfigError::Invalid(
                "registry_columns.kcode and registry_columns.edi_code need at least one alias"
                    .into(),
            ));
        }
        Ok(())
    }
}
