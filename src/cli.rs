use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "adr-charts", author, version, about = "Comparison charts for LoRaWAN ADR simulation summaries")]
pub struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// JSON file overriding the plot configuration
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Compare algorithms against device density for one parameter combination
    Density(DensityArgs),
    /// Render the full analysis over every scenario folder
    Report(ReportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DensityArgs {
    /// Summary CSV to plot
    #[arg(long, default_value = "summaries/summary_scenario1.csv")]
    pub csv: PathBuf,

    /// Mobility speed (km/h)
    #[arg(long, default_value_t = 0.0)]
    pub mobility: f64,

    /// Traffic interval (s)
    #[arg(long, default_value_t = 3600.0)]
    pub interval: f64,

    /// Maximum random loss (dB)
    #[arg(long, default_value_t = 0.0)]
    pub loss: f64,

    /// Output directory for the charts
    #[arg(long, default_value = "plots")]
    pub output: PathBuf,

    /// Print the available parameter values and exit
    #[arg(long)]
    pub list: bool,

    /// Also render grouped bar charts
    #[arg(long)]
    pub bar: bool,

    /// Save the charts without opening them
    #[arg(long)]
    pub no_show: bool,

    /// Render every combination of the configured grids
    #[arg(long)]
    pub all: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Output directory (defaults to the configured one)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Additional repository root searched for result folders
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}
