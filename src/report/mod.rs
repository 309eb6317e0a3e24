//! Full analysis report
//! Discovers every scenario folder, renders the per-scenario and cross-scenario figures and writes the summary table.

mod cross;
mod fixed;
mod scenario;
mod summary;

use crate::charts::{ChartRenderer, Figure, Palette, Series};
use crate::cli::ReportArgs;
use crate::config::PlotConfig;
use crate::data::columns::{format_value, Scenario, ENERGY, NUM_DEVICES, PDR};
use crate::data::discovery::find_all_summary_paths;
use crate::data::{DataLoader, DataProcessor, ProcessorError};
use crate::stats::StatsCalculator;
use anyhow::Context;
use polars::prelude::DataFrame;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

pub use summary::{format_summary, write_summary};

/// A figure and the file name it is saved under.
#[derive(Debug, Clone)]
pub struct NamedFigure {
    pub file_name: String,
    pub figure: Figure,
}

impl NamedFigure {
    pub fn new(file_name: impl Into<String>, figure: Figure) -> Self {
        Self {
            file_name: file_name.into(),
            figure,
        }
    }
}

/// The two metrics every figure pair shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Pdr,
    Energy,
}

impl Metric {
    pub const BOTH: [Metric; 2] = [Metric::Pdr, Metric::Energy];

    pub fn column(&self) -> &'static str {
        match self {
            Metric::Pdr => PDR,
            Metric::Energy => ENERGY,
        }
    }

    /// Lower-case token used in file names.
    pub fn file_tag(&self) -> &'static str {
        match self {
            Metric::Pdr => "pdr",
            Metric::Energy => "energy",
        }
    }
}

/// One series per algorithm: mean of `metric` per `by` value, x mapped by `map_x`.
pub(crate) fn algorithm_series(
    df: &DataFrame,
    algorithms: &[String],
    by: &str,
    metric: &str,
    map_x: impl Fn(f64) -> f64,
) -> Result<Vec<Series>, ProcessorError> {
    algorithms
        .iter()
        .map(|alg| {
            let subset = DataProcessor::filter_alg(df, alg)?;
            let points = DataProcessor::grouped_mean(&subset, by, metric)?
                .into_iter()
                .map(|(x, y)| (map_x(x), y))
                .collect();
            Ok(Series::new(alg.as_str(), points, Palette::Report))
        })
        .collect()
}

/// `"<prefix>: 100,550,1000"`, or `None` when the table has no device counts.
pub(crate) fn devices_footer(df: &DataFrame, prefix: &str) -> Result<Option<String>, ProcessorError> {
    let devices = DataProcessor::unique_sorted(df, NUM_DEVICES)?;
    if devices.is_empty() {
        return Ok(None);
    }
    let list: Vec<String> = devices.iter().map(|d| format_value(*d)).collect();
    Ok(Some(format!("{}: {}", prefix, list.join(","))))
}

/// Renders report figures into one output folder.
pub struct Report<'a> {
    config: &'a PlotConfig,
    output: PathBuf,
    saved: usize,
    failed: usize,
}

impl<'a> Report<'a> {
    pub fn new(config: &'a PlotConfig, output: PathBuf) -> Self {
        Self {
            config,
            output,
            saved: 0,
            failed: 0,
        }
    }

    /// Save every figure; a failed render is logged and the rest still run.
    fn save_all(&mut self, figures: Result<Vec<NamedFigure>, ProcessorError>) {
        let figures = match figures {
            Ok(figures) => figures,
            Err(e) => {
                warn!(error = %e, "could not prepare figure data");
                self.failed += 1;
                return;
            }
        };
        for named in figures {
            let path = self.output.join(&named.file_name);
            match ChartRenderer::render(&named.figure, &path, self.config.pixels_per_inch) {
                Ok(()) => {
                    info!(path = %path.display(), "chart saved");
                    self.saved += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not render chart");
                    self.failed += 1;
                }
            }
        }
    }

    /// Every figure of the report, in a fixed order.
    pub fn render_all(&mut self, scenarios: &[(Scenario, DataFrame)]) {
        let config = self.config;

        for (scenario, df) in scenarios {
            info!(scenario = %scenario, "per-scenario figures");
            self.save_all(scenario::complete_analysis(*scenario, df, config));
            self.save_all(scenario::energy_efficiency(*scenario, df, config));
            self.save_all(scenario::pdr_heatmap(*scenario, df, config));
        }

        info!("metric against parameter figures and histograms");
        for (scenario, df) in scenarios {
            self.save_all(scenario::metric_vs_parameters(*scenario, df, config));
        }
        for (scenario, df) in scenarios {
            self.save_all(scenario::histograms(*scenario, df, config));
        }

        info!("cross-scenario figures");
        self.save_all(cross::scenario_comparison(scenarios, config));

        let find = |wanted: Scenario| {
            scenarios
                .iter()
                .find(|(s, _)| *s == wanted)
                .map(|(_, df)| df)
        };
        if let Some(df) = find(Scenario::Sigma) {
            self.save_all(cross::sigma_impact(df, config));
            self.save_all(cross::mobility0_impact(Scenario::Sigma, df, config));
        }
        if let Some(df) = find(Scenario::TrafficInterval) {
            self.save_all(cross::traffic_interval_analysis(df, config));
            self.save_all(cross::mobility0_impact(Scenario::TrafficInterval, df, config));
        }
        if let Some(df) = find(Scenario::Density) {
            self.save_all(cross::mobility0_impact(Scenario::Density, df, config));
        }

        info!("fixed-parameter figures");
        let combined = match DataProcessor::concat(scenarios.iter().map(|(_, df)| df)) {
            Ok(combined) => Some(combined),
            Err(e) => {
                warn!(error = %e, "could not combine scenarios");
                None
            }
        };
        if let Some(combined) = &combined {
            self.save_all(fixed::density_fixed(combined, config));
            self.save_all(fixed::traffic_fixed(combined, config));
            self.save_all(fixed::sigma_fixed(combined, config));
        }
        if let Some(df) = find(Scenario::Density) {
            self.save_all(fixed::density_scenario(df, config));
        }
        if let Some(df) = find(Scenario::Sigma) {
            self.save_all(fixed::sigma_scenario(df, config));
        }
        if let Some(df) = find(Scenario::TrafficInterval) {
            self.save_all(fixed::traffic_scenario(df, config));
        }
        if let Some(combined) = &combined {
            self.save_all(fixed::mobility_by_density(combined, config));
        }
    }
}

/// Load every CSV found for each scenario. Scenarios without files are skipped.
pub fn load_scenarios(roots: &[PathBuf]) -> Vec<(Scenario, DataFrame)> {
    let mut loaded = Vec::new();
    for scenario in Scenario::ALL {
        let paths = find_all_summary_paths(roots, scenario);
        if paths.is_empty() {
            warn!(
                scenario = %scenario,
                "no file found (checked the working directory, resultsfinal/summaries/{0}/ and resultsfinal2/summaries/{0}/)",
                scenario.name()
            );
            continue;
        }
        let Some(table) = DataLoader::load_scenario(&paths) else {
            warn!(scenario = %scenario, files = paths.len(), "no file could be loaded");
            continue;
        };
        info!(
            scenario = %scenario,
            files = table.loaded.len(),
            rows = table.row_count(),
            "scenario loaded"
        );
        if !table.failed.is_empty() {
            warn!(scenario = %scenario, failed = table.failed.len(), "some files could not be loaded");
        }
        loaded.push((scenario, table.df));
    }
    loaded
}

/// Entry point of the `report` subcommand.
pub fn run(args: &ReportArgs, config: &PlotConfig) -> anyhow::Result<()> {
    if args.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let output = args.output.clone().unwrap_or_else(|| config.output_dir.clone());
    let mut roots = vec![PathBuf::from(".")];
    roots.extend(args.root.clone());

    info!("loading data");
    let scenarios = load_scenarios(&roots);
    if scenarios.is_empty() {
        error!("no data file found");
        anyhow::bail!("no summary CSV found for any scenario");
    }
    info!(scenarios = scenarios.len(), "data loaded");

    fs::create_dir_all(&output).with_context(|| format!("creating {}", output.display()))?;

    let mut report = Report::new(config, output.clone());
    report.render_all(&scenarios);

    info!("summary table");
    let rows = StatsCalculator::summary_rows(&scenarios)?;
    let summary_path = output.join("resume_performances.csv");
    write_summary(&rows, &summary_path)
        .with_context(|| format!("writing {}", summary_path.display()))?;
    info!(path = %summary_path.display(), "summary table saved");

    info!(
        saved = report.saved,
        failed = report.failed,
        output = %output.display(),
        "analysis finished"
    );
    println!("\nPerformance summary:");
    print!("{}", format_summary(&rows));
    println!();
    Ok(())
}
