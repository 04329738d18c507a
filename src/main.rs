//! `tes` command line.
//!
//! ```text
//! tes run --config tes.toml [--summary run.json]
//! tes verify --config tes.toml [--report verify.json]
//! tes check-config --config tes.toml
//! ```

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use tes_service::config::{load_config, resolve_config_path, RunConfig};
use tes_service::driver::RegimenDriver;
use tes_service::ingest::TuvArchive;
use tes_service::logging::{self, Component, LogLevel};
use tes_service::output::{ensure_results_dir, CsvTableSink};
use tes_service::verify;

#[derive(Parser, Debug)]
#[command(author, version, about = "Solar exposure time (TES) tables from UV archives", long_about = None)]
struct Cli {
    /// Run configuration (defaults to $TES_CONFIG, then ./tes.toml)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Append log entries to this file
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    log_file: Option<PathBuf>,

    /// Show debug messages with timestamps
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute every regimen × cloud × dose table
    Run {
        /// Write a JSON run summary here
        #[arg(long, value_hint = ValueHint::FilePath)]
        summary: Option<PathBuf>,
    },
    /// Check the archive for missing or unreadable measurement files
    Verify {
        /// Write the JSON verification report here
        #[arg(long, value_hint = ValueHint::FilePath)]
        report: Option<PathBuf>,
    },
    /// Validate the configuration and print the derived window
    CheckConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { LogLevel::Debug } else { LogLevel::Info };
    let log_file = cli.log_file.as_ref().map(|p| p.to_string_lossy().into_owned());
    logging::init_logger(level, log_file.as_deref(), cli.verbose);

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logging::error(Component::System, None, &e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config_path = resolve_config_path(cli.config.as_deref());
    let config = load_config(&config_path)?;
    logging::info(
        Component::Config,
        None,
        &format!("Loaded {}", config_path.display()),
    );

    match &cli.command {
        Command::Run { summary } => run(&config, summary.as_deref()),
        Command::Verify { report } => verify_archive(&config, report.as_deref()),
        Command::CheckConfig => {
            print_config(&config);
            Ok(())
        }
    }
}

fn run(config: &RunConfig, summary_path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    ensure_results_dir(&config.results_root)?;

    let archive = TuvArchive::from_config(config);
    let mut sink = CsvTableSink::new(&config.results_root);
    let driver = RegimenDriver::new(config)?;
    let summary = driver.run(&archive, &mut sink)?;

    if let Some(path) = summary_path {
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        logging::info(Component::System, None, &format!("Summary saved to {}", path.display()));
    }
    Ok(())
}

fn verify_archive(config: &RunConfig, report_path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let archive = TuvArchive::from_config(config);
    let report = verify::run_full_verification(config, &archive);
    verify::print_summary(&report);

    if let Some(path) = report_path {
        verify::save_report(&report, path)?;
    }
    Ok(())
}

fn print_config(config: &RunConfig) {
    println!("Window:   {:02}:00-{:02}:00 ({} minutes)", config.start_hour, config.end_hour, config.window_minutes());
    println!("Horizon:  until {:02}:00 ({} minutes)", config.cutoff_hour, config.search_minutes());
    println!("Data:     {} {:?}", config.data_root.display(), config.data_folders);
    println!("Results:  {}", config.results_root.display());
    println!("Missing:  {:?}", config.missing_data);
    for (i, cloud) in config.cloud_conditions.iter().enumerate() {
        println!("Sky {}:    {} ({})", i, cloud.name, cloud.factor);
    }
    for regimen in &config.regimens {
        println!(
            "Regimen:  {} [{}] {} doses → {}_<label>_<sky>.csv",
            regimen.name,
            regimen.band,
            regimen.doses.len(),
            regimen.file_prefix
        );
    }
}
