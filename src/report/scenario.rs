//! Figures drawn once per scenario.

use super::{algorithm_series, devices_footer, NamedFigure};
use crate::charts::{
    Axis, BarGroup, Figure, HeatmapData, Palette, Panel, PanelContent, Sample, Series,
};
use crate::config::PlotConfig;
use crate::data::columns::{
    format_value, Scenario, EFFICIENCY, ENERGY, MOBILITY_SPEED, NUM_DEVICES, PDR, SIGMA,
    TRAFFIC_INTERVAL,
};
use crate::data::{DataProcessor, ProcessorError};
use crate::stats::StatsCalculator;
use polars::prelude::DataFrame;
use tracing::warn;

/// Parameters on the x axis of the single-metric figures, in output order.
const X_PARAMETERS: [&str; 4] = [NUM_DEVICES, TRAFFIC_INTERVAL, SIGMA, MOBILITY_SPEED];

fn ordered(df: &DataFrame, config: &PlotConfig) -> Result<Vec<String>, ProcessorError> {
    DataProcessor::ordered_algorithms(df, &config.algorithm_order)
}

/// `analyse_complete_<scenario>.png`: metric curves, trade-off scatter and boxplots.
pub fn complete_analysis(
    scenario: Scenario,
    df: &DataFrame,
    config: &PlotConfig,
) -> Result<Vec<NamedFigure>, ProcessorError> {
    let param = scenario.parameter();
    let algorithms = ordered(df, config)?;

    let pdr = Panel::new(
        "Packet delivery rate",
        Axis::for_parameter(param, param),
        Axis::pdr("packet delivery rate (%)"),
        PanelContent::Lines(algorithm_series(df, &algorithms, param, PDR, |x| x)?),
    );
    let energy = Panel::new(
        "Energy consumption",
        Axis::for_parameter(param, param),
        Axis::new("Average energy (mJ)"),
        PanelContent::Lines(algorithm_series(df, &algorithms, param, ENERGY, |x| x)?),
    );

    let scatter: Vec<Series> = algorithms
        .iter()
        .map(|alg| {
            let subset = DataProcessor::filter_alg(df, alg)?;
            let points = DataProcessor::paired_values(&subset, ENERGY, PDR)?;
            Ok(Series::new(alg.as_str(), points, Palette::Report))
        })
        .collect::<Result<_, ProcessorError>>()?;
    let tradeoff = Panel::new(
        "Packet delivery rate vs energy trade-off",
        Axis::new("Average energy (mJ)"),
        Axis::pdr("packet delivery rate (%)"),
        PanelContent::Scatter(scatter),
    );

    let max_energy = DataProcessor::values(df, ENERGY)?
        .into_iter()
        .fold(f64::NAN, f64::max);
    let max_energy = if max_energy.is_finite() && max_energy != 0.0 {
        max_energy
    } else {
        1.0
    };
    let mut samples = Vec::with_capacity(algorithms.len() * 2);
    for alg in &algorithms {
        let subset = DataProcessor::filter_alg(df, alg)?;
        let color = Palette::Report.style(alg).color;
        samples.push(Sample {
            label: format!("{} (PDR)", alg),
            values: DataProcessor::values(&subset, PDR)?,
            color,
        });
        samples.push(Sample {
            label: format!("{} (Energy)", alg),
            values: DataProcessor::values(&subset, ENERGY)?
                .into_iter()
                .map(|e| e / max_energy * 100.0)
                .collect(),
            color,
        });
    }
    let boxes = Panel::new(
        "Distribution (PDR and normalized energy)",
        Axis::new(""),
        Axis::pdr("Value (%)"),
        PanelContent::Boxes(samples),
    );

    let figure = Figure::grid(
        format!("Performance analysis - Scenario: {}", scenario.name().to_uppercase()),
        (16.0, 12.0),
        (2, 2),
        vec![pdr, energy, tradeoff, boxes],
    );
    Ok(vec![NamedFigure::new(
        format!("analyse_complete_{}.png", scenario.name()),
        figure,
    )])
}

/// `efficacite_energetique_<scenario>.png`: efficiency mean ± std per algorithm.
pub fn energy_efficiency(
    scenario: Scenario,
    df: &DataFrame,
    _config: &PlotConfig,
) -> Result<Vec<NamedFigure>, ProcessorError> {
    let mut algorithms = DataProcessor::algorithms(df)?;
    algorithms.sort();

    let mut means = Vec::with_capacity(algorithms.len());
    let mut stds = Vec::with_capacity(algorithms.len());
    let mut colors = Vec::with_capacity(algorithms.len());
    for alg in &algorithms {
        let subset = DataProcessor::filter_alg(df, alg)?;
        let stats =
            StatsCalculator::compute_descriptive_stats(&DataProcessor::values(&subset, EFFICIENCY)?);
        means.push(Some(stats.mean).filter(|m| m.is_finite()));
        stds.push(Some(stats.std));
        colors.push(Palette::Report.style(alg).color);
    }

    let mut bars = BarGroup::new("Efficiency", means, Palette::Report.style("").color);
    bars.errors = Some(stds);
    bars.colors = colors;
    bars.opacity = 0.8;
    bars.annotate = true;

    let panel = Panel::new(
        format!("Energy efficiency - Scenario: {}", scenario.name().to_uppercase()),
        Axis::categories("Algorithm", &algorithms),
        Axis::new("Energy efficiency (PDR/mJ)"),
        PanelContent::Bars(vec![bars]),
    );
    Ok(vec![NamedFigure::new(
        format!("efficacite_energetique_{}.png", scenario.name()),
        Figure::single((12.0, 6.0), panel),
    )])
}

/// `heatmap_packet_delivery_rate_<scenario>.png`: PDR over the first two varying parameters.
pub fn pdr_heatmap(
    scenario: Scenario,
    df: &DataFrame,
    config: &PlotConfig,
) -> Result<Vec<NamedFigure>, ProcessorError> {
    let params = DataProcessor::varying_parameters(df)?;
    let (param1, param2) = match params.as_slice() {
        [first, second, ..] => (*first, *second),
        _ => {
            warn!(scenario = %scenario, "not enough varying parameters for a heatmap");
            return Ok(Vec::new());
        }
    };

    let panels = config
        .algorithm_order
        .iter()
        .take(4)
        .map(|alg| {
            let subset = DataProcessor::filter_alg(df, alg)?;
            let pivot = DataProcessor::pivot_mean(&subset, param2, param1, PDR)?;
            let data = HeatmapData {
                x_labels: pivot.col_keys,
                y_labels: pivot.row_keys.iter().map(|k| format_value(*k)).collect(),
                values: pivot.values,
                vmin: 0.0,
                vmax: 100.0,
                colorbar_label: "packet delivery rate (%)".to_string(),
            };
            Ok(Panel::new(
                alg.as_str(),
                Axis::new(param1),
                Axis::new(param2),
                PanelContent::Heatmap(data),
            ))
        })
        .collect::<Result<Vec<_>, ProcessorError>>()?;

    let rows = panels.len().div_ceil(2).max(1);
    let figure = Figure::grid(
        format!("Packet delivery rate heatmap - Scenario: {}", scenario.name().to_uppercase()),
        (16.0, 12.0),
        (rows, 2),
        panels,
    );
    Ok(vec![NamedFigure::new(
        format!("heatmap_packet_delivery_rate_{}.png", scenario.name()),
        figure,
    )])
}

/// `<scenario>_<metric>_vs_<x>.png` for both metrics against every parameter.
pub fn metric_vs_parameters(
    scenario: Scenario,
    df: &DataFrame,
    config: &PlotConfig,
) -> Result<Vec<NamedFigure>, ProcessorError> {
    let algorithms = ordered(df, config)?;
    let footer = devices_footer(df, NUM_DEVICES)?;

    let mut figures = Vec::new();
    for metric in [PDR, ENERGY] {
        for x in X_PARAMETERS {
            let y_axis = if metric == PDR {
                Axis::pdr("packet delivery rate (%)")
            } else {
                Axis::new(metric)
            };
            let panel = Panel::new(
                format!("{} vs {} - Scenario: {}", metric, x, scenario.name()),
                Axis::for_parameter(x, x),
                y_axis,
                PanelContent::Lines(algorithm_series(df, &algorithms, x, metric, |v| v)?),
            )
            .with_footer(footer.clone());
            if panel.is_empty() {
                continue;
            }
            figures.push(NamedFigure::new(
                format!("{}_{}_vs_{}.png", scenario.name(), metric, x),
                Figure::single((10.0, 6.0), panel),
            ));
        }
    }
    Ok(figures)
}

/// `hist_<scenario>_<metric>.png`: overlaid per-algorithm histograms.
pub fn histograms(
    scenario: Scenario,
    df: &DataFrame,
    config: &PlotConfig,
) -> Result<Vec<NamedFigure>, ProcessorError> {
    let algorithms = ordered(df, config)?;

    let mut figures = Vec::new();
    for metric in [PDR, ENERGY] {
        let samples = algorithms
            .iter()
            .map(|alg| {
                let subset = DataProcessor::filter_alg(df, alg)?;
                Ok(Sample {
                    label: alg.clone(),
                    values: DataProcessor::values(&subset, metric)?,
                    color: Palette::Report.style(alg).color,
                })
            })
            .collect::<Result<Vec<_>, ProcessorError>>()?
            .into_iter()
            .filter(|s| !s.values.is_empty())
            .collect::<Vec<_>>();
        if samples.is_empty() {
            continue;
        }

        let x_axis = if metric == PDR {
            Axis::pdr("packet delivery rate (%)")
        } else {
            Axis::new(metric)
        };
        let panel = Panel::new(
            format!("Histogram {} - Scenario: {}", metric, scenario.name()),
            x_axis,
            Axis::new("Count"),
            PanelContent::Histogram {
                samples,
                bins: config.histogram_bins,
            },
        );
        figures.push(NamedFigure::new(
            format!("hist_{}_{}.png", scenario.name(), metric),
            Figure::single((10.0, 6.0), panel),
        ));
    }
    Ok(figures)
}
