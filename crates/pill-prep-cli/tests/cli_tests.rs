//! Argument parsing and command runs against on-disk fixtures.

use std::fs;

use clap::Parser;
use pill_prep_cli::cli::{Cli, Command, LogFormatArg};
use pill_prep_cli::commands::{load_config, run_load_script, run_map, smoke_test_plan};
use pill_prep_cli::logging::LogFormat;
use pill_prep_cli::summary::reconcile_table;
use pill_prep_core::export::{CHECKLIST_CSV, LOAD_SCRIPT_SQL, MAPPING_JSON, SUMMARY_CSV};
use tempfile::TempDir;
use tracing::level_filters::LevelFilter;

const LABEL_MAP: &str = r#"{
  "K-000001": {"name_kr": "Alpha", "edi_codes": ["E1"]},
  "K-2": "Beta",
  "K-000003": "Gamma"
}"#;

const REGISTRY: &str = "K-CODE,EDI_CODE,DRUG_NAME\nK000002,E2,Beta registry\n";

const SELECTION: &str = r#"{
  "total_drugs": 2,
  "drugs": [
    {"kcode": "K-000001", "edi_code": "E1", "drug_name": "Alpha", "usage_count": 7, "shootable": "Y"},
    {"kcode": "K-000002", "drug_name": "O'Beta"}
  ]
}"#;

/// Temp dir holding a config file with relative data paths.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    fs::write(dir.path().join("data/labels.json"), LABEL_MAP).unwrap();
    fs::write(dir.path().join("data/master.csv"), REGISTRY).unwrap();
    fs::write(dir.path().join("data/selected.json"), SELECTION).unwrap();
    fs::write(
        dir.path().join("prep.toml"),
        r#"
top_n = 50

[paths]
label_map = "data/labels.json"
registry = "data/master.csv"
selected_drugs = "data/selected.json"
output_dir = "out"

[storage]
bucket = "staging-photos"
"#,
    )
    .unwrap();
    dir
}

#[test]
fn test_parse_select_with_global_flags() {
    let cli = Cli::try_parse_from([
        "pill-prep",
        "select",
        "--top",
        "100",
        "-c",
        "prep.toml",
        "--log-format",
        "json",
    ])
    .unwrap();

    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("prep.toml")));
    assert!(matches!(cli.log_format, LogFormatArg::Json));
    match cli.command {
        Command::Select(args) => assert_eq!(args.top, Some(100)),
        _ => panic!("expected select"),
    }
}

#[test]
fn test_log_config_from_flags() {
    let cli = Cli::try_parse_from([
        "pill-prep",
        "map",
        "-v",
        "--log-format",
        "compact",
        "--log-timestamps",
    ])
    .unwrap();
    let config = cli.log_config();

    assert!(config.with_timestamps);
    assert!(!config.use_env_filter);
    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level_filter, LevelFilter::DEBUG);

    let quiet = Cli::try_parse_from(["pill-prep", "map"]).unwrap().log_config();
    assert!(!quiet.with_timestamps);
    assert!(quiet.use_env_filter);
}

#[test]
fn test_parse_rejects_zero_top() {
    assert!(Cli::try_parse_from(["pill-prep", "select", "--top", "0"]).is_err());
}

#[test]
fn test_parse_load_script_flags() {
    let cli = Cli::try_parse_from([
        "pill-prep",
        "load-script",
        "--input",
        "final.json",
        "--verify",
    ])
    .unwrap();
    match cli.command {
        Command::LoadScript(args) => {
            assert!(args.verify);
            assert_eq!(args.input.unwrap().to_str(), Some("final.json"));
            assert!(args.sql_out.is_none());
        }
        _ => panic!("expected load-script"),
    }
}

#[test]
fn test_parse_upload_test_defaults() {
    let cli = Cli::try_parse_from([
        "pill-prep",
        "upload-test",
        "--url",
        "https://example.supabase.co",
        "--anon-key",
        "key",
    ])
    .unwrap();
    match cli.command {
        Command::UploadTest(args) => {
            assert_eq!(args.kcode, "K-030864");
            assert_eq!(args.anon_key, "key");
        }
        _ => panic!("expected upload-test"),
    }
}

#[test]
fn test_map_command_uses_config_paths() {
    let dir = workspace();
    let config = load_config(Some(&dir.path().join("prep.toml"))).unwrap();
    assert_eq!(config.top_n, 50);

    let cli = Cli::try_parse_from(["pill-prep", "map"]).unwrap();
    let Command::Map(args) = cli.command else {
        panic!("expected map");
    };
    let run = run_map(&config, &args).unwrap();

    let report = &run.reconciliation.report;
    assert_eq!(report.total, 3);
    assert_eq!(report.mapped, 2);
    assert_eq!(report.unmapped_codes.len(), 1);

    let out = dir.path().join("out");
    assert!(out.join(MAPPING_JSON).exists());
    assert!(out.join(SUMMARY_CSV).exists());

    let rendered = reconcile_table(report).to_string();
    assert!(rendered.contains("66.67%"));
}

#[test]
fn test_load_script_command_default_outputs() {
    let dir = workspace();
    let config = load_config(Some(&dir.path().join("prep.toml"))).unwrap();

    let cli = Cli::try_parse_from(["pill-prep", "load-script", "--verify"]).unwrap();
    let Command::LoadScript(args) = cli.command else {
        panic!("expected load-script");
    };
    let run = run_load_script(&config, &args).unwrap();

    assert_eq!(run.verified_rows, Some(2));
    assert_eq!(run.sql_path, dir.path().join("out").join(LOAD_SCRIPT_SQL));
    assert_eq!(run.checklist_path, dir.path().join("out").join(CHECKLIST_CSV));

    let sql = fs::read_to_string(&run.sql_path).unwrap();
    assert!(sql.contains("'O''Beta'"));
}

#[test]
fn test_load_script_missing_input_reports_path() {
    let dir = TempDir::new().unwrap();
    let config = load_config(None).unwrap();

    let missing = dir.path().join("nope.json");
    let cli = Cli::try_parse_from([
        "pill-prep",
        "load-script",
        "--input",
        missing.to_str().unwrap(),
    ])
    .unwrap();
    let Command::LoadScript(args) = cli.command else {
        panic!("expected load-script");
    };

    let error = run_load_script(&config, &args).unwrap_err();
    assert!(format!("{error:#}").contains("nope.json"));
}

#[test]
fn test_smoke_test_plan_from_config() {
    let dir = workspace();
    let config = load_config(Some(&dir.path().join("prep.toml"))).unwrap();

    let cli = Cli::try_parse_from([
        "pill-prep",
        "upload-test",
        "--url",
        "https://example.supabase.co",
        "--anon-key",
        "key",
        "--kcode",
        " K-000123 ",
        "--local-dir",
        "/tmp/pill_capture",
    ])
    .unwrap();
    let Command::UploadTest(args) = cli.command else {
        panic!("expected upload-test");
    };

    let plan = smoke_test_plan(&config, &args);
    assert_eq!(plan.kcode, "K-000123");
    assert_eq!(plan.bucket, "staging-photos");
    assert_eq!(plan.table, "capture_real_photos");
    assert_eq!(plan.local_dir.to_str(), Some("/tmp/pill_capture"));
    assert!(plan.object_path().to_string().starts_with("CS_1_single/K-000123/"));
}
