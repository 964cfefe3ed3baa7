#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Computes the urban risk index for every administrative region and
//! writes the record dataset, the region geometry dataset, and the
//! diagnostics report.

use std::path::PathBuf;

use clap::Parser;
use urban_risk_cli_utils::{IndicatifProgress, init_logger};
use urban_risk_generate::{PIPELINE_STEPS, default_config, load_config, run};

#[derive(Parser)]
#[command(name = "urban_risk_generate", about = "Urban risk index generation tool")]
struct Cli {
    /// Directory holding the input tables and layers
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory the outputs are written to
    #[arg(long, default_value = "data/generated")]
    output_dir: PathBuf,

    /// TOML configuration replacing the embedded default
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };

    let progress = IndicatifProgress::steps_bar(&multi, "Urban risk", PIPELINE_STEPS);
    let output = run(&config, &cli.data_dir, &cli.output_dir, &progress)?;

    for record in &output.records {
        log::info!(
            "{}: {} (waste {}, floods {})",
            record.regiao,
            record.cluster,
            record.lixo,
            record.alagamento
        );
    }

    Ok(())
}
