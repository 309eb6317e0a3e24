//! Figure description consumed by the renderer.

use crate::charts::axis::Axis;
use crate::charts::style::{AlgorithmStyle, Palette};
use plotters::style::RGBColor;

/// One labelled curve or point cloud.
#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub style: AlgorithmStyle,
}

impl Series {
    pub fn new(label: impl Into<String>, points: Vec<(f64, f64)>, palette: Palette) -> Self {
        let label = label.into();
        let style = palette.style(&label);
        Self {
            label,
            points,
            style,
        }
    }
}

/// One bar per category.
#[derive(Debug, Clone)]
pub struct BarGroup {
    pub label: String,
    pub values: Vec<Option<f64>>,
    /// Symmetric error bars, same length as `values`.
    pub errors: Option<Vec<Option<f64>>>,
    /// Per-bar colours. A single entry colours every bar.
    pub colors: Vec<RGBColor>,
    pub opacity: f64,
    /// Print the value above each bar.
    pub annotate: bool,
}

impl BarGroup {
    pub fn new(label: impl Into<String>, values: Vec<Option<f64>>, color: RGBColor) -> Self {
        Self {
            label: label.into(),
            values,
            errors: None,
            colors: vec![color],
            opacity: 0.85,
            annotate: false,
        }
    }

    pub fn color_at(&self, i: usize) -> RGBColor {
        self.colors
            .get(i)
            .or_else(|| self.colors.first())
            .copied()
            .unwrap_or(RGBColor(0x7f, 0x8c, 0x8d))
    }
}

/// Cell values indexed `[row][column]`; the first row is drawn on top.
#[derive(Debug, Clone)]
pub struct HeatmapData {
    pub x_labels: Vec<String>,
    pub y_labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
    pub vmin: f64,
    pub vmax: f64,
    pub colorbar_label: String,
}

#[derive(Debug, Clone)]
pub struct Sample {
    pub label: String,
    pub values: Vec<f64>,
    pub color: RGBColor,
}

#[derive(Debug, Clone)]
pub enum PanelContent {
    Lines(Vec<Series>),
    Scatter(Vec<Series>),
    Bars(Vec<BarGroup>),
    /// Left group against the panel's y axis, right group against `right_axis`.
    DualBars {
        left: BarGroup,
        right: BarGroup,
        right_axis: Axis,
    },
    Heatmap(HeatmapData),
    Boxes(Vec<Sample>),
    Histogram { samples: Vec<Sample>, bins: usize },
}

#[derive(Debug, Clone)]
pub struct Panel {
    pub title: String,
    pub x: Axis,
    pub y: Axis,
    pub content: PanelContent,
    /// Small note in the lower-right corner of the plotting area.
    pub footer: Option<String>,
}

impl Panel {
    pub fn new(title: impl Into<String>, x: Axis, y: Axis, content: PanelContent) -> Self {
        Self {
            title: title.into(),
            x,
            y,
            content,
            footer: None,
        }
    }

    pub fn with_footer(mut self, footer: Option<String>) -> Self {
        self.footer = footer;
        self
    }

    pub fn is_empty(&self) -> bool {
        match &self.content {
            PanelContent::Lines(series) | PanelContent::Scatter(series) => {
                series.iter().all(|s| s.points.is_empty())
            }
            PanelContent::Bars(groups) => groups
                .iter()
                .all(|g| g.values.iter().all(Option::is_none)),
            PanelContent::DualBars { left, right, .. } => left
                .values
                .iter()
                .chain(&right.values)
                .all(Option::is_none),
            PanelContent::Heatmap(data) => data.values.iter().flatten().all(Option::is_none),
            PanelContent::Boxes(samples) | PanelContent::Histogram { samples, .. } => {
                samples.iter().all(|s| s.values.is_empty())
            }
        }
    }
}

/// A grid of panels saved as one PNG.
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: Option<String>,
    /// Width and height in inches.
    pub size: (f64, f64),
    /// Rows and columns.
    pub grid: (usize, usize),
    pub panels: Vec<Panel>,
}

impl Figure {
    pub fn single(size: (f64, f64), panel: Panel) -> Self {
        Self {
            title: None,
            size,
            grid: (1, 1),
            panels: vec![panel],
        }
    }

    pub fn grid(
        title: impl Into<String>,
        size: (f64, f64),
        grid: (usize, usize),
        panels: Vec<Panel>,
    ) -> Self {
        Self {
            title: Some(title.into()),
            size,
            grid,
            panels,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_takes_palette_style() {
        let s = Series::new("ADR-Lite", vec![(1.0, 2.0)], Palette::Report);
        assert_eq!(s.style, Palette::Report.style("ADR-Lite"));
    }

    #[test]
    fn single_colour_applies_to_every_bar() {
        let g = BarGroup::new("PDR", vec![Some(1.0), Some(2.0)], RGBColor(1, 2, 3));
        assert_eq!(g.color_at(1), RGBColor(1, 2, 3));
    }

    #[test]
    fn empty_panels_are_detected() {
        let empty = Panel::new(
            "t",
            Axis::new("x"),
            Axis::new("y"),
            PanelContent::Lines(vec![Series::new("No-ADR", vec![], Palette::Report)]),
        );
        assert!(empty.is_empty());

        let bars = Panel::new(
            "t",
            Axis::new("x"),
            Axis::new("y"),
            PanelContent::Bars(vec![BarGroup::new("a", vec![None, Some(3.0)], RGBColor(0, 0, 0))]),
        );
        assert!(!bars.is_empty());
    }
}
