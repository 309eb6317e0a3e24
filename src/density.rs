//! Density comparison command
//! PDR and energy against device count for one mobility / interval / loss combination.

use crate::charts::{Axis, BarGroup, ChartRenderer, Figure, Panel, PanelContent, Palette, Series};
use crate::cli::DensityArgs;
use crate::config::{DensityConfig, PlotConfig};
use crate::data::columns::{
    format_value, Scenario, ALG, ENERGY, MAX_RANDOM_LOSS, MOBILITY_SPEED, NUM_DEVICES, PDR,
    TRAFFIC_INTERVAL,
};
use crate::data::discovery::find_summary_path;
use crate::data::{DataLoader, DataProcessor, PivotTable, ProcessorError};
use anyhow::Context;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// One point of the mobility × interval × loss grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Combination {
    pub mobility: f64,
    pub interval: f64,
    pub loss: f64,
}

impl Combination {
    /// `mob0_traf3600_loss3.96`
    pub fn file_stem(&self) -> String {
        format!(
            "mob{}_traf{}_loss{}",
            format_value(self.mobility),
            format_value(self.interval),
            format_value(self.loss)
        )
    }

    pub fn title(&self) -> String {
        format!(
            "Mobility={} km/h, Interval={}s, Loss={} dB",
            float_label(self.mobility),
            float_label(self.interval),
            float_label(self.loss)
        )
    }
}

/// Float with at least one decimal, as the command-line values are echoed.
fn float_label(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Rows matching the combination on `MobilitySpeed`, `TrafficInterval` and `MaxRandomLoss`.
pub fn filter_data(df: &DataFrame, combo: Combination) -> Result<DataFrame, ProcessorError> {
    DataProcessor::filter_eq(
        df,
        &[
            (MOBILITY_SPEED, combo.mobility),
            (TRAFFIC_INTERVAL, combo.interval),
            (MAX_RANDOM_LOSS, combo.loss),
        ],
    )
}

fn join_values(values: &[f64]) -> String {
    let items: Vec<String> = values.iter().map(|v| format_value(*v)).collect();
    format!("[{}]", items.join(", "))
}

/// Distinct parameter values and algorithms present in the file.
pub fn available_values(df: &DataFrame) -> Result<String, ProcessorError> {
    let mut out = String::new();
    out.push_str("\n=== Available values ===\n");
    for column in [MOBILITY_SPEED, TRAFFIC_INTERVAL, MAX_RANDOM_LOSS, NUM_DEVICES] {
        let values = DataProcessor::unique_sorted(df, column)?;
        out.push_str(&format!("{}: {}\n", column, join_values(&values)));
    }
    out.push_str(&format!("Algorithms: [{}]\n", DataProcessor::algorithms(df)?.join(", ")));
    out.push_str(&format!("{}\n", "=".repeat(45)));
    Ok(out)
}

/// Render a pivot as a right-aligned text table.
pub fn format_pivot(table: &PivotTable, index_name: &str, decimals: usize) -> String {
    let cells: Vec<Vec<String>> = table
        .values
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| match v {
                    Some(v) => format!("{:.*}", decimals, v),
                    None => "NaN".to_string(),
                })
                .collect()
        })
        .collect();
    let row_labels: Vec<String> = table.row_keys.iter().map(|k| format_value(*k)).collect();

    let first = row_labels
        .iter()
        .map(String::len)
        .chain([index_name.len()])
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = table
        .col_keys
        .iter()
        .enumerate()
        .map(|(c, key)| {
            cells
                .iter()
                .map(|row| row[c].len())
                .chain([key.len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = format!("{:<first$}", index_name);
    for (key, w) in table.col_keys.iter().zip(&widths) {
        out.push_str(&format!("  {:>w$}", key));
    }
    out.push('\n');
    for (label, row) in row_labels.iter().zip(&cells) {
        out.push_str(&format!("{:<first$}", label));
        for (cell, w) in row.iter().zip(&widths) {
            out.push_str(&format!("  {:>w$}", cell));
        }
        out.push('\n');
    }
    out
}

/// PDR (2 decimals) and energy (4 decimals) means per device count and algorithm.
pub fn summary_tables(df: &DataFrame) -> Result<String, ProcessorError> {
    let pdr = DataProcessor::pivot_mean(df, NUM_DEVICES, ALG, PDR)?;
    let energy = DataProcessor::pivot_mean(df, NUM_DEVICES, ALG, ENERGY)?;
    Ok(format!(
        "\n=== Summary ===\n\nPDR (%) by algorithm and device count:\n{}\nAverage energy (mJ) by algorithm and device count:\n{}",
        format_pivot(&pdr, NUM_DEVICES, 2),
        format_pivot(&energy, NUM_DEVICES, 4)
    ))
}

/// `[max(0, min - 5), 102]` over the PDR values of the table.
fn pdr_axis(df: &DataFrame) -> Result<Axis, ProcessorError> {
    let min = DataProcessor::values(df, PDR)?
        .into_iter()
        .fold(f64::INFINITY, f64::min);
    let lo = if min.is_finite() { (min - 5.0).max(0.0) } else { 0.0 };
    Ok(Axis::new("PDR (%)").range(lo, 102.0))
}

/// Two line panels, PDR and energy against device count.
pub fn comparison_figure(
    df: &DataFrame,
    combo: Combination,
    order: &[String],
) -> Result<Figure, ProcessorError> {
    let algorithms = DataProcessor::ordered_algorithms(df, order)?;
    let mut pdr = Vec::with_capacity(algorithms.len());
    let mut energy = Vec::with_capacity(algorithms.len());
    for alg in &algorithms {
        let subset = DataProcessor::filter_alg(df, alg)?;
        pdr.push(Series::new(
            alg.as_str(),
            DataProcessor::grouped_mean(&subset, NUM_DEVICES, PDR)?,
            Palette::Density,
        ));
        energy.push(Series::new(
            alg.as_str(),
            DataProcessor::grouped_mean(&subset, NUM_DEVICES, ENERGY)?,
            Palette::Density,
        ));
    }

    let panels = vec![
        Panel::new(
            "Packet Delivery Rate (PDR)",
            Axis::new("Number of Devices"),
            pdr_axis(df)?,
            PanelContent::Lines(pdr),
        ),
        Panel::new(
            "Energy Consumption",
            Axis::new("Number of Devices"),
            Axis::new("Average Energy (mJ)"),
            PanelContent::Lines(energy),
        ),
    ];
    Ok(Figure::grid(combo.title(), (14.0, 6.0), (1, 2), panels))
}

/// Two grouped bar panels, one bar per algorithm for each device count.
pub fn bar_figure(
    df: &DataFrame,
    combo: Combination,
    order: &[String],
) -> Result<Figure, ProcessorError> {
    let algorithms = DataProcessor::ordered_algorithms(df, order)?;
    let devices = DataProcessor::unique_sorted(df, NUM_DEVICES)?;
    let labels: Vec<String> = devices.iter().map(|d| format_value(*d)).collect();

    let groups = |metric: &str| -> Result<Vec<BarGroup>, ProcessorError> {
        let pivot = DataProcessor::pivot_mean(df, NUM_DEVICES, ALG, metric)?;
        Ok(algorithms
            .iter()
            .map(|alg| {
                let values = devices.iter().map(|d| pivot.get(*d, alg)).collect();
                BarGroup::new(alg.as_str(), values, Palette::Density.style(alg).color)
            })
            .collect())
    };

    let panels = vec![
        Panel::new(
            "Packet Delivery Rate (PDR)",
            Axis::categories("Number of Devices", &labels),
            pdr_axis(df)?,
            PanelContent::Bars(groups(PDR)?),
        ),
        Panel::new(
            "Energy Consumption",
            Axis::categories("Number of Devices", &labels),
            Axis::new("Average Energy (mJ)"),
            PanelContent::Bars(groups(ENERGY)?),
        ),
    ];
    Ok(Figure::grid(combo.title(), (16.0, 6.0), (1, 2), panels))
}

/// Render the line chart, and the bar chart when asked. Returns the saved paths.
fn render_combination(
    df: &DataFrame,
    combo: Combination,
    bar: bool,
    output: &Path,
    density: &DensityConfig,
    pixels_per_inch: f64,
) -> anyhow::Result<Vec<PathBuf>> {
    let mut saved = Vec::new();

    let path = output.join(format!("density_{}.png", combo.file_stem()));
    ChartRenderer::render(&comparison_figure(df, combo, &density.algorithm_order)?, &path, pixels_per_inch)
        .with_context(|| format!("rendering {}", path.display()))?;
    info!(path = %path.display(), "chart saved");
    saved.push(path);

    if bar {
        let path = output.join(format!("density_bar_{}.png", combo.file_stem()));
        ChartRenderer::render(&bar_figure(df, combo, &density.algorithm_order)?, &path, pixels_per_inch)
            .with_context(|| format!("rendering {}", path.display()))?;
        info!(path = %path.display(), "bar chart saved");
        saved.push(path);
    }
    Ok(saved)
}

/// Counts reported by `--all`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub generated: usize,
    pub skipped: usize,
}

/// Every grid combination. Empty ones are skipped, failed renders are logged.
pub fn generate_all(
    df: &DataFrame,
    density: &DensityConfig,
    bar: bool,
    output: &Path,
    pixels_per_inch: f64,
) -> Result<BatchOutcome, ProcessorError> {
    let total = density.mobility_grid.len() * density.interval_grid.len() * density.loss_grid.len();
    info!(combinations = total, "generating every combination");

    let mut outcome = BatchOutcome::default();
    for &mobility in &density.mobility_grid {
        for &interval in &density.interval_grid {
            for &loss in &density.loss_grid {
                let combo = Combination {
                    mobility,
                    interval,
                    loss,
                };
                let filtered = filter_data(df, combo)?;
                if filtered.height() == 0 {
                    info!(mobility, interval, loss, "no data, skipping");
                    outcome.skipped += 1;
                    continue;
                }
                match render_combination(&filtered, combo, bar, output, density, pixels_per_inch) {
                    Ok(_) => outcome.generated += 1,
                    Err(e) => {
                        warn!(mobility, interval, loss, error = %e, "could not render combination");
                        outcome.skipped += 1;
                    }
                }
            }
        }
    }
    Ok(outcome)
}

/// `csv` itself when it exists, otherwise the same file name looked up in
/// the density result folders under `root`.
pub fn resolve_csv(csv: &Path, root: &Path) -> PathBuf {
    if csv.is_file() {
        return csv.to_path_buf();
    }
    let file_name = csv
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| Scenario::Density.default_file());
    match find_summary_path(root, Scenario::Density, &file_name) {
        Some(found) => {
            info!(requested = %csv.display(), found = %found.display(), "using summary from result folders");
            found
        }
        None => csv.to_path_buf(),
    }
}

/// Entry point of the `density` subcommand.
pub fn run(args: &DensityArgs, config: &PlotConfig) -> anyhow::Result<()> {
    let csv = resolve_csv(&args.csv, Path::new("."));
    info!(path = %csv.display(), "loading data");
    let df = DataLoader::load_data(&csv).with_context(|| format!("loading {}", csv.display()))?;

    print!("{}", available_values(&df)?);
    if args.list {
        return Ok(());
    }

    fs::create_dir_all(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;

    if args.all {
        let outcome = generate_all(&df, &config.density, args.bar, &args.output, config.pixels_per_inch)?;
        println!("\n=== Summary ===");
        println!("Charts generated: {}", outcome.generated);
        println!("Combinations skipped (no data): {}", outcome.skipped);
        println!("Output directory: {}", args.output.display());
        return Ok(());
    }

    let combo = Combination {
        mobility: args.mobility,
        interval: args.interval,
        loss: args.loss,
    };
    info!(
        mobility = combo.mobility,
        interval = combo.interval,
        loss = combo.loss,
        "filtering"
    );
    let filtered = filter_data(&df, combo)?;
    if filtered.height() == 0 {
        error!("no data found for this parameter combination");
        eprintln!("Use --list to see the available values.");
        return Ok(());
    }
    info!(rows = filtered.height(), "matching records");

    print!("{}", summary_tables(&filtered)?);
    println!();

    let saved = render_combination(
        &filtered,
        combo,
        args.bar,
        &args.output,
        &config.density,
        config.pixels_per_inch,
    )?;

    if !args.no_show {
        for path in &saved {
            if let Err(e) = open::that(path) {
                warn!(path = %path.display(), error = %e, "could not open chart viewer");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CSV: &str = "\
Algorithm,NumDevices,MobilitySpeed,TrafficInterval,MaxRandomLoss,PDR_Percent,AvgEnergy_mJ
No-ADR,100,0.0,3600,0.0,95.0,1.5
No-ADR,550,0.0,3600,0.0,80.0,1.6
ADR-MAX,100,0.0,3600,0.0,97.0,1.2
ADR-MAX,100,0.0,3600,0.0,93.0,1.4
ADR-AVG,550,0.0,3600,0.0,85.0,1.1
ADR-Lite,100,33.3,72,3.96,60.0,2.0
No-ADR,1000,0.0,3600,7.92,40.0,2.5
";

    fn table() -> (TempDir, DataFrame) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("summary_scenario1.csv");
        fs::write(&path, CSV).unwrap();
        let df = DataLoader::load_data(&path).unwrap();
        (dir, df)
    }

    fn combo(mobility: f64, interval: f64, loss: f64) -> Combination {
        Combination {
            mobility,
            interval,
            loss,
        }
    }

    #[test]
    fn filter_keeps_matching_rows() {
        let (_dir, df) = table();
        assert_eq!(filter_data(&df, combo(0.0, 3600.0, 0.0)).unwrap().height(), 5);
        assert_eq!(filter_data(&df, combo(33.3, 72.0, 3.96)).unwrap().height(), 1);
        assert_eq!(filter_data(&df, combo(60.0, 72.0, 0.0)).unwrap().height(), 0);
    }

    #[test]
    fn file_names_echo_the_parameters() {
        assert_eq!(combo(0.0, 3600.0, 3.96).file_stem(), "mob0_traf3600_loss3.96");
        assert_eq!(combo(33.3, 72.0, 0.0).file_stem(), "mob33.3_traf72_loss0");
    }

    #[test]
    fn listing_shows_every_parameter() {
        let (_dir, df) = table();
        let listing = available_values(&df).unwrap();
        assert!(listing.contains("MobilitySpeed: [0, 33.3]"));
        assert!(listing.contains("TrafficInterval: [72, 3600]"));
        assert!(listing.contains("NumDevices: [100, 550, 1000]"));
        assert!(listing.contains("Algorithms: [No-ADR, ADR-MAX, ADR-AVG, ADR-Lite]"));
    }

    #[test]
    fn summary_table_uses_means_and_nan() {
        let (_dir, df) = table();
        let filtered = filter_data(&df, combo(0.0, 3600.0, 0.0)).unwrap();
        let text = summary_tables(&filtered).unwrap();
        // ADR-MAX at 100 devices averages 97 and 93.
        assert!(text.contains("95.00"));
        assert!(text.contains("1.3000"));
        assert!(text.contains("NaN"));
    }

    #[test]
    fn pivot_layout() {
        let table = PivotTable {
            row_keys: vec![100.0, 550.0],
            col_keys: vec!["ADR-AVG".into(), "No-ADR".into()],
            values: vec![vec![Some(1.0), None], vec![Some(2.5), Some(3.26)]],
        };
        let text = format_pivot(&table, "NumDevices", 1);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "NumDevices  ADR-AVG  No-ADR");
        assert_eq!(lines[1], format!("{:<10}  {:>7}  {:>6}", "100", "1.0", "NaN"));
        assert_eq!(lines[2], format!("{:<10}  {:>7}  {:>6}", "550", "2.5", "3.3"));
    }

    #[test]
    fn comparison_follows_density_order() {
        let (_dir, df) = table();
        let filtered = filter_data(&df, combo(0.0, 3600.0, 0.0)).unwrap();
        let order = DensityConfig::default().algorithm_order;
        let figure = comparison_figure(&filtered, combo(0.0, 3600.0, 0.0), &order).unwrap();
        assert_eq!(figure.size, (14.0, 6.0));
        assert_eq!(figure.panels.len(), 2);

        let PanelContent::Lines(series) = &figure.panels[0].content else {
            panic!("expected lines");
        };
        let labels: Vec<&str> = series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["No-ADR", "ADR-MAX", "ADR-AVG"]);
        assert_eq!(series[1].points, vec![(100.0, 95.0)]);
        assert_eq!(figure.panels[0].y.range, Some((75.0, 102.0)));
    }

    #[test]
    fn bars_align_on_device_counts() {
        let (_dir, df) = table();
        let filtered = filter_data(&df, combo(0.0, 3600.0, 0.0)).unwrap();
        let order = DensityConfig::default().algorithm_order;
        let figure = bar_figure(&filtered, combo(0.0, 3600.0, 0.0), &order).unwrap();
        let PanelContent::Bars(groups) = &figure.panels[1].content else {
            panic!("expected bars");
        };
        let avg = groups.iter().find(|g| g.label == "ADR-AVG").unwrap();
        assert_eq!(avg.values, vec![None, Some(1.1)]);
        assert_eq!(avg.color_at(0), Palette::Density.style("ADR-AVG").color);
    }

    #[test]
    fn empty_grid_is_all_skipped() {
        let (dir, df) = table();
        let grid = DensityConfig {
            mobility_grid: vec![60.0],
            interval_grid: vec![145.0],
            loss_grid: vec![0.0, 7.92],
            ..DensityConfig::default()
        };
        let outcome = generate_all(&df, &grid, true, dir.path(), 100.0).unwrap();
        assert_eq!(
            outcome,
            BatchOutcome {
                generated: 0,
                skipped: 2
            }
        );
    }

    #[test]
    fn missing_csv_is_found_in_result_folders() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("resultsfinal/summaries/density");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("summary_density_run1.csv"), CSV).unwrap();

        let resolved = resolve_csv(Path::new("summary_density_run1.csv"), dir.path());
        assert_eq!(resolved, folder.join("summary_density_run1.csv"));

        let empty = TempDir::new().unwrap();
        let nowhere = resolve_csv(Path::new("other.csv"), empty.path());
        assert_eq!(nowhere, PathBuf::from("other.csv"));
    }
}
