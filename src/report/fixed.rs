//! Figures drawn with every parameter but one held at a fixed value.

use super::{algorithm_series, Metric, NamedFigure};
use crate::charts::axis::TRAFFIC_TICKS;
use crate::charts::{Axis, Figure, Panel, PanelContent};
use crate::config::PlotConfig;
use crate::data::columns::{format_value, MOBILITY_SPEED, NUM_DEVICES, SIGMA, TRAFFIC_INTERVAL};
use crate::data::{DataProcessor, ProcessorError};
use polars::prelude::DataFrame;
use tracing::{debug, warn};

const SIZE: (f64, f64) = (10.0, 6.0);

/// One PDR / energy figure pair.
struct FixedLayout {
    conditions: Vec<(&'static str, f64)>,
    by: &'static str,
    x: Axis,
    /// Plot `3600 / x` instead of `x`.
    per_hour: bool,
    /// Title text after `"<metric> vs "`.
    subject: String,
    file_prefix: String,
    file_suffix: String,
    y_labels: [&'static str; 2],
}

const SHORT_LABELS: [&str; 2] = ["Packet Delivery Rate (%)", "Energy Consumption (mJ)"];

impl FixedLayout {
    fn file_name(&self, metric: Metric) -> String {
        format!("{}{}{}.png", self.file_prefix, metric.file_tag(), self.file_suffix)
    }

    fn render(&self, df: &DataFrame, config: &PlotConfig) -> Result<Vec<NamedFigure>, ProcessorError> {
        let filtered = DataProcessor::filter_eq(df, &self.conditions)?;
        if filtered.height() == 0 {
            warn!(filter = ?self.conditions, "no rows for fixed-parameter figures");
            return Ok(Vec::new());
        }
        let algorithms = DataProcessor::ordered_algorithms(&filtered, &config.algorithm_order)?;

        let mut figures = Vec::with_capacity(2);
        for (metric, y_label) in Metric::BOTH.into_iter().zip(self.y_labels) {
            let mut series = if self.per_hour {
                algorithm_series(&filtered, &algorithms, self.by, metric.column(), |t| 3600.0 / t)?
            } else {
                algorithm_series(&filtered, &algorithms, self.by, metric.column(), |v| v)?
            };
            series.retain(|s| !s.points.is_empty());
            for s in &mut series {
                s.points.sort_by(|a, b| a.0.total_cmp(&b.0));
            }
            let file_name = self.file_name(metric);
            if series.is_empty() {
                warn!(file = %file_name, "no algorithm has data, figure skipped");
                continue;
            }

            let (name, y) = match metric {
                Metric::Pdr => ("PDR", Axis::pdr(y_label)),
                Metric::Energy => ("Energy", Axis::new(y_label)),
            };
            debug!(file = %file_name, series = series.len(), "fixed-parameter figure");
            let panel = Panel::new(
                format!("{} vs {}", name, self.subject),
                self.x.clone(),
                y,
                PanelContent::Lines(series),
            );
            figures.push(NamedFigure::new(file_name, Figure::single(SIZE, panel)));
        }
        Ok(figures)
    }
}

fn density_layout(config: &PlotConfig, scenario: bool) -> FixedLayout {
    let f = &config.fixed;
    let (m, t, s) = (format_value(f.mobility), format_value(f.interval), format_value(f.sigma));
    let (file_prefix, tag) = if scenario {
        ("density_scenario_", " - Density Scenario")
    } else {
        ("density_", "")
    };
    FixedLayout {
        conditions: vec![(MOBILITY_SPEED, f.mobility), (TRAFFIC_INTERVAL, f.interval), (SIGMA, f.sigma)],
        by: NUM_DEVICES,
        x: Axis::for_parameter(NUM_DEVICES, "Number of Nodes"),
        per_hour: false,
        subject: format!(
            "Node Density{} (MobilitySpeed={}, TrafficInterval={}s, Sigma={})",
            tag, m, t, s
        ),
        file_prefix: file_prefix.to_string(),
        file_suffix: format!("_mobility{}_traffic{}_sigma{}", m, t, s),
        y_labels: SHORT_LABELS,
    }
}

fn sigma_layout(config: &PlotConfig, devices: f64, scenario: bool) -> FixedLayout {
    let f = &config.fixed;
    let (m, n, t) = (format_value(f.mobility), format_value(devices), format_value(f.interval));
    let (file_prefix, tag) = if scenario {
        ("sigma_scenario_", " - Sigma Scenario")
    } else {
        ("sigma_", "")
    };
    FixedLayout {
        conditions: vec![(MOBILITY_SPEED, f.mobility), (NUM_DEVICES, devices), (TRAFFIC_INTERVAL, f.interval)],
        by: SIGMA,
        x: Axis::new("Sigma (dB)"),
        per_hour: false,
        subject: format!(
            "Sigma{} (MobilitySpeed={}, NumDevices={}, TrafficInterval={}s)",
            tag, m, n, t
        ),
        file_prefix: file_prefix.to_string(),
        file_suffix: format!("_mobility{}_density{}_traffic{}", m, n, t),
        y_labels: SHORT_LABELS,
    }
}

/// Density figures over all scenarios combined.
pub fn density_fixed(df: &DataFrame, config: &PlotConfig) -> Result<Vec<NamedFigure>, ProcessorError> {
    density_layout(config, false).render(df, config)
}

/// Density figures of the density scenario alone.
pub fn density_scenario(df: &DataFrame, config: &PlotConfig) -> Result<Vec<NamedFigure>, ProcessorError> {
    density_layout(config, true).render(df, config)
}

/// Sigma figures over all scenarios combined.
pub fn sigma_fixed(df: &DataFrame, config: &PlotConfig) -> Result<Vec<NamedFigure>, ProcessorError> {
    sigma_layout(config, config.fixed.devices, false).render(df, config)
}

/// Sigma figures of the sigma scenario, at the scenario's device count.
pub fn sigma_scenario(df: &DataFrame, config: &PlotConfig) -> Result<Vec<NamedFigure>, ProcessorError> {
    sigma_layout(config, config.fixed.scenario_devices, true).render(df, config)
}

/// Traffic figures over all scenarios combined, x in messages per hour.
pub fn traffic_fixed(df: &DataFrame, config: &PlotConfig) -> Result<Vec<NamedFigure>, ProcessorError> {
    let f = &config.fixed;
    let (m, n, s) = (format_value(f.mobility), format_value(f.devices), format_value(f.sigma));
    FixedLayout {
        conditions: vec![(MOBILITY_SPEED, f.mobility), (NUM_DEVICES, f.devices), (SIGMA, f.sigma)],
        by: TRAFFIC_INTERVAL,
        x: Axis::messages_per_hour("Messages per Hour", &TRAFFIC_TICKS, (1.0, 50.0), ""),
        per_hour: true,
        subject: format!("Messages per Hour (MobilitySpeed={}, NumDevices={}, Sigma={})", m, n, s),
        file_prefix: "traffic_".to_string(),
        file_suffix: format!("_mobility{}_density{}_sigma{}", m, n, s),
        y_labels: SHORT_LABELS,
    }
    .render(df, config)
}

/// Traffic figures of the traffic scenario, with spelled-out tick labels.
pub fn traffic_scenario(df: &DataFrame, config: &PlotConfig) -> Result<Vec<NamedFigure>, ProcessorError> {
    let f = &config.fixed;
    let (m, n, s) = (format_value(f.mobility), format_value(f.scenario_devices), format_value(f.sigma));
    FixedLayout {
        conditions: vec![(MOBILITY_SPEED, f.mobility), (NUM_DEVICES, f.scenario_devices), (SIGMA, f.sigma)],
        by: TRAFFIC_INTERVAL,
        x: Axis::messages_per_hour(
            "Messages per Hour",
            &f.scenario_intervals,
            (1.0, 60.0),
            " messages per hour",
        ),
        per_hour: true,
        subject: format!(
            "Messages per Hour - Traffic Scenario (MobilitySpeed={}, NumDevices={}, Sigma={})",
            m, n, s
        ),
        file_prefix: "traffic_scenario_".to_string(),
        file_suffix: format!("_mobility{}_density{}_sigma{}", m, n, s),
        y_labels: SHORT_LABELS,
    }
    .render(df, config)
}

/// PDR and energy against mobility, one pair per configured device count.
pub fn mobility_by_density(df: &DataFrame, config: &PlotConfig) -> Result<Vec<NamedFigure>, ProcessorError> {
    let f = &config.fixed;
    let (t, s) = (format_value(f.interval), format_value(f.sigma));
    let mut figures = Vec::new();
    for &devices in &f.mobility_devices {
        let n = format_value(devices);
        let layout = FixedLayout {
            conditions: vec![(NUM_DEVICES, devices), (TRAFFIC_INTERVAL, f.interval), (SIGMA, f.sigma)],
            by: MOBILITY_SPEED,
            x: Axis::new("Node mobility (m/s)"),
            per_hour: false,
            subject: format!("Mobility - {} nodes (TrafficInterval={}s, Sigma={})", n, t, s),
            file_prefix: String::new(),
            file_suffix: format!("_mobility_{}nodes_{}s_{}sigma", n, t, s.replace('.', "")),
            y_labels: ["packet delivery rate (%)", "Average energy (mJ)"],
        };
        figures.extend(layout.render(df, config)?);
    }
    Ok(figures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::{load, HEADER};

    fn combined() -> DataFrame {
        load(&format!(
            "{HEADER}\
ADR-AVG,100,0,3600,3.96,10,90,2
ADR-AVG,550,0,3600,3.96,10,80,4
ADR-AVG,550,0,72,3.96,10,40,9
No-ADR,550,0,3600,3.96,10,70,1
No-ADR,550,0,3600,7.92,10,50,1
ADR-AVG,100,60,3600,3.96,10,60,3
"
        ))
    }

    fn names(figures: &[NamedFigure]) -> Vec<&str> {
        figures.iter().map(|f| f.file_name.as_str()).collect()
    }

    #[test]
    fn density_pair_names_and_titles() {
        let figures = density_fixed(&combined(), &PlotConfig::default()).unwrap();
        assert_eq!(
            names(&figures),
            [
                "density_pdr_mobility0_traffic3600_sigma3.96.png",
                "density_energy_mobility0_traffic3600_sigma3.96.png"
            ]
        );
        let panel = &figures[0].figure.panels[0];
        assert_eq!(
            panel.title,
            "PDR vs Node Density (MobilitySpeed=0, TrafficInterval=3600s, Sigma=3.96)"
        );
        let PanelContent::Lines(series) = &panel.content else {
            panic!("expected lines");
        };
        assert_eq!(series[0].label, "ADR-AVG");
        assert_eq!(series[0].points, vec![(100.0, 90.0), (550.0, 80.0)]);
    }

    #[test]
    fn traffic_uses_messages_per_hour() {
        let figures = traffic_fixed(&combined(), &PlotConfig::default()).unwrap();
        assert_eq!(figures[0].file_name, "traffic_pdr_mobility0_density550_sigma3.96.png");
        let panel = &figures[0].figure.panels[0];
        assert_eq!(panel.x.range, Some((1.0, 50.0)));
        let PanelContent::Lines(series) = &panel.content else {
            panic!("expected lines");
        };
        assert_eq!(series[0].points, vec![(1.0, 80.0), (50.0, 40.0)]);
    }

    #[test]
    fn traffic_scenario_labels_ticks() {
        let figures = traffic_scenario(&combined(), &PlotConfig::default()).unwrap();
        // No rows at 1000 devices.
        assert!(figures.is_empty());

        let mut config = PlotConfig::default();
        config.fixed.scenario_devices = 550.0;
        let figures = traffic_scenario(&combined(), &config).unwrap();
        assert_eq!(figures[1].file_name, "traffic_scenario_energy_mobility0_density550_sigma3.96.png");
        let labels = figures[0].figure.panels[0].x.tick_labels.clone().unwrap();
        assert_eq!(labels[0], "50 messages per hour");
    }

    #[test]
    fn sigma_pair_filters_devices() {
        let figures = sigma_fixed(&combined(), &PlotConfig::default()).unwrap();
        assert_eq!(figures[0].file_name, "sigma_pdr_mobility0_density550_traffic3600.png");
        let PanelContent::Lines(series) = &figures[0].figure.panels[0].content else {
            panic!("expected lines");
        };
        let no_adr = series.iter().find(|s| s.label == "No-ADR").unwrap();
        assert_eq!(no_adr.points, vec![(3.96, 70.0), (7.92, 50.0)]);

        let scenario = sigma_scenario(&combined(), &PlotConfig::default()).unwrap();
        assert!(scenario.is_empty());
    }

    #[test]
    fn mobility_pairs_per_device_count() {
        let figures = mobility_by_density(&combined(), &PlotConfig::default()).unwrap();
        assert_eq!(
            names(&figures),
            [
                "pdr_mobility_100nodes_3600s_396sigma.png",
                "energy_mobility_100nodes_3600s_396sigma.png",
                "pdr_mobility_550nodes_3600s_396sigma.png",
                "energy_mobility_550nodes_3600s_396sigma.png"
            ]
        );
        assert_eq!(
            figures[0].figure.panels[0].title,
            "PDR vs Mobility - 100 nodes (TrafficInterval=3600s, Sigma=3.96)"
        );
    }

    #[test]
    fn density_scenario_title_suffix() {
        let figures = density_scenario(&combined(), &PlotConfig::default()).unwrap();
        assert!(figures[1].figure.panels[0].title.starts_with("Energy vs Node Density - Density Scenario"));
        assert!(figures[0].file_name.starts_with("density_scenario_pdr_"));
    }
}
