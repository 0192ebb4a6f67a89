//! copperkit - non-copper clearing from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use copperkit::{
    apply_overrides, init_logging, load_config, run_clearing, CancellationToken, JobFile,
    LogProgress, RunReport, BUILD_DATE, VERSION,
};
use copperkit_core::units::format_length;
use copperkit_core::ToolOrder;
use std::path::PathBuf;
use tracing::info;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")");

#[derive(Parser)]
#[command(name = "copperkit")]
#[command(about = "Non-copper clearing tool paths for PCB milling", long_about = None)]
#[command(version, long_version = LONG_VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a clearing job and write its report
    Run {
        /// Job file (JSON)
        #[arg(long)]
        job: PathBuf,
        /// Config file (.json or .toml); defaults to the user config
        #[arg(long)]
        config: Option<PathBuf>,
        /// Report file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override a setting, e.g. --set ncc.overlap=0.5
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// List the default tool catalog
    Tools {
        /// Config file (.json or .toml); defaults to the user config
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;
    info!("copperkit {} ({})", VERSION, BUILD_DATE);

    match cli.command {
        Commands::Run {
            job,
            config,
            output,
            set,
        } => run_job(job, config, output, &set),
        Commands::Tools { config } => list_tools(config),
    }
}

fn run_job(
    job: PathBuf,
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    overrides: &[String],
) -> Result<()> {
    let mut config = load_config(config.as_deref())?;
    apply_overrides(&mut config, overrides)?;

    let file = JobFile::load(&job)?;
    let (objects, job) = file.build(&config)?;

    let outcome = run_clearing(&job, &objects, &CancellationToken::new(), &LogProgress);
    let report = RunReport::from(&outcome);
    let json = report.to_json().context("Failed to serialize report")?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    if !report.is_done() {
        anyhow::bail!(
            "Clearing {}: {}",
            report.status,
            report.error.as_deref().unwrap_or("no details")
        );
    }
    Ok(())
}

fn list_tools(config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let mut catalog = config.build_catalog()?;
    config.add_default_vshape(&mut catalog)?;

    for tool in catalog.snapshot(ToolOrder::Table) {
        println!(
            "{:<4} {:>12}  {}",
            tool.id.to_string(),
            format_length(tool.diameter, config.catalog.units, catalog.decimals()),
            tool.description_short()
        );
    }
    Ok(())
}
