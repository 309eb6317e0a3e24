//! ADR Charts - LoRaWAN ADR simulation summaries to comparison charts
//!
//! `density` plots one parameter combination of a density sweep; `report`
//! renders the full multi-scenario analysis and its summary table.

mod charts;
mod cli;
mod config;
mod data;
mod density;
mod logging;
mod report;
mod stats;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use config::PlotConfig;
use tracing::debug;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => PlotConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => PlotConfig::default(),
    };
    debug!(?config, "configuration");

    match &cli.command {
        Command::Density(args) => density::run(args, &config),
        Command::Report(args) => report::run(args, &config),
    }
}
