//! CLI argument definitions.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};

use crate::logging::{LogConfig, LogFormat};

#[derive(Parser)]
#[command(
    name = "pill-prep",
    version,
    about = "Pill dataset preparation - K-CODE/EDI mapping, drug selection and load scripts",
    long_about = "Prepare the pill photo dataset.\n\n\
                  Maps internal K-CODEs to EDI billing codes, ranks dataset drugs by\n\
                  pharmacy usage, generates the backend load script and smoke-tests\n\
                  photo uploads."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file (defaults are used when omitted).
    #[arg(
        long = "config",
        short = 'c',
        value_name = "FILE",
        env = "PILL_PREP_CONFIG",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Prefix pretty and compact log lines with a timestamp.
    #[arg(long = "log-timestamps", global = true)]
    pub log_timestamps: bool,
}

impl Cli {
    /// Logging configuration from the flags. Explicit verbosity flags win
    /// over `RUST_LOG`.
    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            level_filter: self.verbosity.tracing_level_filter(),
            use_env_filter: !self.verbosity.is_present(),
            with_timestamps: self.log_timestamps,
            format: match self.log_format {
                LogFormatArg::Pretty => LogFormat::Pretty,
                LogFormatArg::Compact => LogFormat::Compact,
                LogFormatArg::Json => LogFormat::Json,
            },
            log_file: self.log_file.clone(),
            with_ansi: self.log_file.is_none() && io::stderr().is_terminal(),
            ..LogConfig::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Map label-map K-CODEs to EDI codes and write mapping reports.
    Map(MapArgs),

    /// Rank dataset drugs by usage and write the selection workbook.
    Select(SelectArgs),

    /// Generate the SQL load script and capture checklist.
    LoadScript(LoadScriptArgs),

    /// Upload a generated test image and metadata row, then read it back.
    UploadTest(UploadTestArgs),
}

#[derive(Parser)]
pub struct MapArgs {
    /// Output directory (default: paths.output_dir from config).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SelectArgs {
    /// Output directory (default: paths.output_dir from config).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Rows on the Top_N sheet (default: top_n from config).
    #[arg(long = "top", value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub top: Option<u32>,
}

#[derive(Parser)]
pub struct LoadScriptArgs {
    /// Curated selection JSON (default: paths.selected_drugs from config).
    #[arg(long = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// SQL output path (default: <output_dir>/supabase_load_drugs.sql).
    #[arg(long = "sql-out", value_name = "FILE")]
    pub sql_out: Option<PathBuf>,

    /// Checklist output path (default: <output_dir>/capture_checklist.csv).
    #[arg(long = "checklist-out", value_name = "FILE")]
    pub checklist_out: Option<PathBuf>,

    /// Execute the script against an in-memory SQLite table before writing.
    #[arg(long = "verify")]
    pub verify: bool,
}

#[derive(Parser)]
pub struct UploadTestArgs {
    /// Project URL (default: storage.url from config).
    #[arg(long = "url", value_name = "URL", env = "SUPABASE_URL")]
    pub url: Option<String>,

    /// Anonymous API key.
    #[arg(long = "anon-key", value_name = "KEY", env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub anon_key: String,

    /// K-CODE to file the test capture under.
    #[arg(long = "kcode", value_name = "CODE", default_value = "K-030864")]
    pub kcode: String,

    /// Directory for the generated image (default: system temp dir).
    #[arg(long = "local-dir", value_name = "DIR")]
    pub local_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
