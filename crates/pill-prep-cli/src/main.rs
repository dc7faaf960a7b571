//! Pill dataset preparation CLI.

use clap::Parser;
use pill_prep_cli::cli::{Cli, Command};
use pill_prep_cli::commands::{
    load_config, run_load_script, run_map, run_select, run_upload_test,
};
use pill_prep_cli::logging::init_logging;
use pill_prep_cli::summary::{
    print_load_script_summary, print_mapping_summary, print_selection_summary,
    print_smoke_test_summary,
};

fn main() {
    let cli = Cli::parse();
    let log_config = cli.log_config();
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    if let Err(error) = run(cli) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Map(args) => print_mapping_summary(&run_map(&config, &args)?),
        Command::Select(args) => {
            let (run, top_n) = run_select(&config, &args)?;
            print_selection_summary(&run, top_n);
        }
        Command::LoadScript(args) => print_load_script_summary(&run_load_script(&config, &args)?),
        Command::UploadTest(args) => print_smoke_test_summary(&run_upload_test(&config, &args)?),
    }
    Ok(())
}
