//! Figures comparing scenarios, and the sigma / traffic / density impact figures.

use super::{algorithm_series, devices_footer, Metric, NamedFigure};
use crate::charts::{Axis, BarGroup, Figure, Palette, Panel, PanelContent};
use crate::config::PlotConfig;
use crate::data::columns::{
    Scenario, EFFICIENCY, ENERGY, MOBILITY_SPEED, NUM_DEVICES, PDR, SIGMA, SUCCESSFUL_PACKETS,
    TRAFFIC_INTERVAL,
};
use crate::data::{DataProcessor, ProcessorError};
use crate::stats::StatsCalculator;
use polars::prelude::DataFrame;
use tracing::warn;

/// `comparaison_scenarios.png`: per algorithm, PDR and energy means of every scenario on twin axes.
pub fn scenario_comparison(
    scenarios: &[(Scenario, DataFrame)],
    config: &PlotConfig,
) -> Result<Vec<NamedFigure>, ProcessorError> {
    let labels: Vec<String> = scenarios.iter().map(|(s, _)| s.title()).collect();

    let panels = config
        .algorithm_order
        .iter()
        .take(4)
        .map(|alg| {
            let mut pdr = Vec::with_capacity(scenarios.len());
            let mut energy = Vec::with_capacity(scenarios.len());
            for (_, df) in scenarios {
                let subset = DataProcessor::filter_alg(df, alg)?;
                let mean = |column| -> Result<Option<f64>, ProcessorError> {
                    let m = StatsCalculator::compute_descriptive_stats(
                        &DataProcessor::values(&subset, column)?,
                    )
                    .mean;
                    Ok(Some(m).filter(|m| m.is_finite()))
                };
                pdr.push(mean(PDR)?);
                energy.push(mean(ENERGY)?);
            }

            let color = Palette::Report.style(alg).color;
            let left = BarGroup::new("packet delivery rate (%)", pdr, color);
            let mut right = BarGroup::new("Energy (mJ)", energy, color);
            right.opacity = 0.4;
            Ok(Panel::new(
                format!("Algorithm: {}", alg),
                Axis::categories("Scenario", &labels),
                Axis::new("packet delivery rate (%)"),
                PanelContent::DualBars {
                    left,
                    right,
                    right_axis: Axis::new("Energy (mJ)"),
                },
            ))
        })
        .collect::<Result<Vec<_>, ProcessorError>>()?;

    let rows = panels.len().div_ceil(2).max(1);
    Ok(vec![NamedFigure::new(
        "comparaison_scenarios.png",
        Figure::grid(
            "Comparison of parameters on packet delivery rate and energy",
            (16.0, 12.0),
            (rows, 2),
            panels,
        ),
    )])
}

/// `impact_sigma.png`: PDR and energy against sigma.
pub fn sigma_impact(df: &DataFrame, config: &PlotConfig) -> Result<Vec<NamedFigure>, ProcessorError> {
    let algorithms = DataProcessor::ordered_algorithms(df, &config.algorithm_order)?;
    let panels = vec![
        Panel::new(
            "packet delivery rate vs Sigma",
            Axis::new("Sigma (dB)"),
            Axis::pdr("packet delivery rate (%)"),
            PanelContent::Lines(algorithm_series(df, &algorithms, SIGMA, PDR, |x| x)?),
        ),
        Panel::new(
            "Energy vs Sigma",
            Axis::new("Sigma (dB)"),
            Axis::new("Average energy (mJ)"),
            PanelContent::Lines(algorithm_series(df, &algorithms, SIGMA, ENERGY, |x| x)?),
        ),
    ];
    Ok(vec![NamedFigure::new(
        "impact_sigma.png",
        Figure::grid(
            "Impact of Sigma (shadow fading standard deviation)",
            (16.0, 6.0),
            (1, 2),
            panels,
        ),
    )])
}

/// `analyse_traffic_interval.png`: four metrics against the traffic interval on a log axis.
pub fn traffic_interval_analysis(
    df: &DataFrame,
    config: &PlotConfig,
) -> Result<Vec<NamedFigure>, ProcessorError> {
    let algorithms = DataProcessor::ordered_algorithms(df, &config.algorithm_order)?;
    let x_label = "Traffic interval (s)";

    let specs = [
        (
            "packet delivery rate vs traffic interval",
            Axis::for_parameter(TRAFFIC_INTERVAL, x_label).log(),
            Axis::pdr("packet delivery rate (%)"),
            PDR,
        ),
        (
            "Energy vs traffic interval",
            Axis::new(x_label).log(),
            Axis::new("Average energy (mJ)"),
            ENERGY,
        ),
        (
            "Successful packets vs traffic interval",
            Axis::new(x_label).log(),
            Axis::new("Successful packets"),
            SUCCESSFUL_PACKETS,
        ),
        (
            "Efficiency vs traffic interval",
            Axis::new(x_label).log(),
            Axis::new("Efficiency (PDR/mJ)"),
            EFFICIENCY,
        ),
    ];

    let panels = specs
        .into_iter()
        .map(|(title, x, y, metric)| {
            let series = algorithm_series(df, &algorithms, TRAFFIC_INTERVAL, metric, |v| v)?;
            Ok(Panel::new(title, x, y, PanelContent::Lines(series)))
        })
        .collect::<Result<Vec<_>, ProcessorError>>()?;

    Ok(vec![NamedFigure::new(
        "analyse_traffic_interval.png",
        Figure::grid("Impact of the traffic interval", (16.0, 12.0), (2, 2), panels),
    )])
}

/// `pdr_<tag>_mob0.png` and `energy_<tag>_mob0.png` for the static-node rows of a scenario.
pub fn mobility0_impact(
    scenario: Scenario,
    df: &DataFrame,
    config: &PlotConfig,
) -> Result<Vec<NamedFigure>, ProcessorError> {
    let (tag, by, x_label, title) = match scenario {
        Scenario::Density => ("density", NUM_DEVICES, NUM_DEVICES, "Density impact"),
        Scenario::TrafficInterval => (
            "traffic",
            TRAFFIC_INTERVAL,
            "Traffic interval (s)",
            "Traffic impact",
        ),
        Scenario::Sigma => ("sigma", SIGMA, "Sigma (dB)", "Sigma impact"),
        Scenario::Mobility => return Ok(Vec::new()),
    };

    let static_nodes = DataProcessor::filter_eq(df, &[(MOBILITY_SPEED, 0.0)])?;
    if static_nodes.height() == 0 {
        warn!(scenario = %scenario, "no rows with MobilitySpeed == 0");
        return Ok(Vec::new());
    }

    let algorithms = DataProcessor::ordered_algorithms(&static_nodes, &config.algorithm_order)?;
    let footer = devices_footer(&static_nodes, "NumDevices present")?;

    Metric::BOTH
        .into_iter()
        .map(|metric| {
            let (y, metric_name) = match metric {
                Metric::Pdr => (Axis::pdr("packet delivery rate (%)"), "packet delivery rate"),
                Metric::Energy => (Axis::new("Average energy (mJ)"), "Energy"),
            };
            let series = algorithm_series(&static_nodes, &algorithms, by, metric.column(), |v| v)?;
            let panel = Panel::new(
                format!("{}: {} vs {} (MobilitySpeed=0)", title, metric_name, by),
                Axis::for_parameter(by, x_label),
                y,
                PanelContent::Lines(series),
            )
            .with_footer(footer.clone());
            Ok(NamedFigure::new(
                format!("{}_{}_mob0.png", metric.file_tag(), tag),
                Figure::single((10.0, 6.0), panel),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_support::assert_renders;
    use crate::report::test_support::{load, HEADER};

    fn sigma_table() -> DataFrame {
        load(&format!(
            "{HEADER}\
ADR-AVG,550,0,3600,1.0,10,90,2
ADR-AVG,550,0,3600,3.96,10,80,4
No-ADR,550,0,3600,3.96,10,70,1
No-ADR,550,60,3600,3.96,10,10,9
"
        ))
    }

    #[test]
    fn comparison_has_one_panel_per_algorithm() {
        let scenarios = vec![(Scenario::Sigma, sigma_table()), (Scenario::TrafficInterval, sigma_table())];
        let figures = scenario_comparison(&scenarios, &PlotConfig::default()).unwrap();
        let figure = &figures[0].figure;
        assert_eq!(figure.panels.len(), 4);
        assert_eq!(figure.panels[0].title, "Algorithm: ADR-AVG");

        let PanelContent::DualBars { left, right, .. } = &figure.panels[0].content else {
            panic!("expected twin bars");
        };
        assert_eq!(left.values, vec![Some(85.0), Some(85.0)]);
        assert_eq!(right.values, vec![Some(3.0), Some(3.0)]);
        assert_eq!(right.opacity, 0.4);

        // ADR-Lite has no rows anywhere.
        let PanelContent::DualBars { left, .. } = &figure.panels[1].content else {
            panic!("expected twin bars");
        };
        assert_eq!(left.values, vec![None, None]);
        assert!(figure.panels[1].is_empty());
    }

    #[test]
    fn static_rows_only() {
        let figures = mobility0_impact(Scenario::Sigma, &sigma_table(), &PlotConfig::default()).unwrap();
        let names: Vec<&str> = figures.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, ["pdr_sigma_mob0.png", "energy_sigma_mob0.png"]);

        let panel = &figures[0].figure.panels[0];
        assert_eq!(panel.footer.as_deref(), Some("NumDevices present: 550"));
        let PanelContent::Lines(series) = &panel.content else {
            panic!("expected lines");
        };
        let no_adr = series.iter().find(|s| s.label == "No-ADR").unwrap();
        assert_eq!(no_adr.points, vec![(3.96, 70.0)]);
    }

    #[test]
    fn no_static_rows_means_no_figures() {
        let df = load(&format!("{HEADER}ADR-AVG,550,33.3,3600,3.96,10,80,4\n"));
        assert!(mobility0_impact(Scenario::Density, &df, &PlotConfig::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn traffic_analysis_uses_log_axes() {
        let figures = traffic_interval_analysis(&sigma_table(), &PlotConfig::default()).unwrap();
        let figure = &figures[0].figure;
        assert_eq!(figure.panels.len(), 4);
        assert!(figure.panels.iter().all(|p| p.x.log));
        assert_eq!(figure.panels[0].x.range, Some((72.0, 3600.0)));
    }

    #[test]
    fn traffic_analysis_renders_on_log_axes() {
        let figures = traffic_interval_analysis(&sigma_table(), &PlotConfig::default()).unwrap();
        assert_renders(&figures[0].figure, &figures[0].file_name);
    }

    #[test]
    fn comparison_renders_with_a_secondary_axis() {
        let scenarios = vec![(Scenario::Sigma, sigma_table()), (Scenario::Density, sigma_table())];
        let figures = scenario_comparison(&scenarios, &PlotConfig::default()).unwrap();
        assert_renders(&figures[0].figure, &figures[0].file_name);
    }

    #[test]
    fn sigma_impact_pair() {
        let figures = sigma_impact(&sigma_table(), &PlotConfig::default()).unwrap();
        assert_eq!(figures[0].file_name, "impact_sigma.png");
        assert_eq!(figures[0].figure.size, (16.0, 6.0));
    }
}
