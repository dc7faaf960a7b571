//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pill_prep_core::export::{CHECKLIST_CSV, LOAD_SCRIPT_SQL};
use pill_prep_core::pipeline::{
    build_mapping, prepare_selection, write_load_script, LoadScriptRun, MappingRun, SelectionRun,
};
use pill_prep_core::PrepConfig;
use pill_prep_storage::{run_smoke_test, SmokeTestPlan, SmokeTestReport, SupabaseClient};
use tracing::info;

use crate::cli::{LoadScriptArgs, MapArgs, SelectArgs, UploadTestArgs};

/// Load configuration from `path`, or defaults when absent.
pub fn load_config(path: Option<&Path>) -> Result<PrepConfig> {
    let config = PrepConfig::load_or_default(path).context("failed to load configuration")?;
    match path {
        Some(path) => info!(path = %path.display(), "Loaded configuration"),
        None => info!("Using default configuration"),
    }
    Ok(config)
}

fn resolve_output_dir(config: &PrepConfig, flag: Option<&PathBuf>) -> PathBuf {
    flag.cloned()
        .unwrap_or_else(|| config.paths.output_dir.clone())
}

pub fn run_map(config: &PrepConfig, args: &MapArgs) -> Result<MappingRun> {
    let output_dir = resolve_output_dir(config, args.output_dir.as_ref());
    build_mapping(config, &output_dir).context("K-CODE mapping failed")
}

pub fn run_select(config: &PrepConfig, args: &SelectArgs) -> Result<(SelectionRun, usize)> {
    let output_dir = resolve_output_dir(config, args.output_dir.as_ref());
    let top_n = args.top.map_or(config.top_n, |n| n as usize);
    let run = prepare_selection(config, &output_dir, top_n).context("drug selection failed")?;
    Ok((run, top_n))
}

pub fn run_load_script(config: &PrepConfig, args: &LoadScriptArgs) -> Result<LoadScriptRun> {
    let input = args
        .input
        .clone()
        .unwrap_or_else(|| config.paths.selected_drugs.clone());
    let sql_out = args
        .sql_out
        .clone()
        .unwrap_or_else(|| config.paths.output_dir.join(LOAD_SCRIPT_SQL));
    let checklist_out = args
        .checklist_out
        .clone()
        .unwrap_or_else(|| config.paths.output_dir.join(CHECKLIST_CSV));

    write_load_script(&input, &sql_out, &checklist_out, args.verify)
        .context("load script generation failed")
}

/// Smoke-test plan from config and flags.
pub fn smoke_test_plan(config: &PrepConfig, args: &UploadTestArgs) -> SmokeTestPlan {
    let mut plan = SmokeTestPlan::new(args.kcode.trim());
    plan.bucket = config.storage.bucket.clone();
    plan.table = config.storage.table.clone();
    plan.category = config.storage.category.clone();
    if let Some(dir) = &args.local_dir {
        plan.local_dir = dir.clone();
    }
    plan
}

pub fn run_upload_test(config: &PrepConfig, args: &UploadTestArgs) -> Result<SmokeTestReport> {
    let url = args
        .url
        .clone()
        .or_else(|| config.storage.url.clone())
        .context("storage URL missing: pass --url, set SUPABASE_URL or storage.url")?;
    let client = SupabaseClient::new(&url, &args.anon_key).context("invalid storage client")?;
    info!(url = %client.base_url(), "Connected storage client");

    let plan = smoke_test_plan(config, args);
    run_smoke_test(&client, &plan).context("upload smoke test failed")
}
