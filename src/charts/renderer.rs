//! Static Chart Renderer
//! Draws [`Figure`]s to PNG files with plotters' bitmap backend.
//!
//! Every panel is a Cartesian plane over `TickedRange`, an `f64` range whose
//! key points are the resolved ticks, so fixed tick sets, log axes (projected
//! to log10) and categorical axes (category index) share one coordinate type.

use crate::charts::axis::{Axis, ResolvedAxis};
use crate::charts::figure::{BarGroup, Figure, HeatmapData, Panel, PanelContent, Sample, Series};
use crate::charts::style::{rd_yl_gn, AlgorithmStyle, Marker};
use crate::stats::StatsCalculator;
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type Plane = Cartesian2d<TickedRange, TickedRange>;
type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Plane>;

const FONT: &str = "sans-serif";
const EDGE: RGBColor = RGBColor(0x33, 0x33, 0x33);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing error: {0}")]
    Drawing(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{panels} panels do not fit a {rows}x{cols} grid")]
    Layout {
        panels: usize,
        rows: usize,
        cols: usize,
    },
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Drawing(e.to_string())
    }
}

/// `f64` axis whose key points are exactly the ticks that fall inside it.
#[derive(Clone)]
struct TickedRange {
    inner: RangedCoordf64,
    ticks: Vec<f64>,
}

impl TickedRange {
    fn new(lo: f64, hi: f64, ticks: &[f64]) -> Self {
        let (min, max) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let ticks = ticks
            .iter()
            .copied()
            .filter(|t| t.is_finite() && *t >= min - 1e-9 && *t <= max + 1e-9)
            .collect();
        Self {
            inner: (lo..hi).into(),
            ticks,
        }
    }
}

impl From<&ResolvedAxis> for TickedRange {
    fn from(axis: &ResolvedAxis) -> Self {
        Self::new(axis.lo, axis.hi, &axis.ticks)
    }
}

impl Ranged for TickedRange {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.inner.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if hint.max_num_points() == 0 {
            return Vec::new();
        }
        self.ticks.clone()
    }

    fn range(&self) -> Range<f64> {
        self.inner.range()
    }
}

/// Pixel-size helper: sizes are given for 100 px per inch and scaled.
#[derive(Clone, Copy)]
struct Scale(f64);

impl Scale {
    fn px(&self, v: f64) -> u32 {
        (v * self.0).round().max(1.0) as u32
    }

    fn i(&self, v: f64) -> i32 {
        (v * self.0).round().max(1.0) as i32
    }

    fn font(&self, size: f64) -> FontDesc<'static> {
        (FONT, size * self.0).into_font()
    }
}

pub struct ChartRenderer;

impl ChartRenderer {
    /// Render a figure to `path`, creating parent folders as needed.
    pub fn render(figure: &Figure, path: &Path, pixels_per_inch: f64) -> Result<(), RenderError> {
        let (rows, cols) = figure.grid;
        if figure.panels.len() > rows * cols {
            return Err(RenderError::Layout {
                panels: figure.panels.len(),
                rows,
                cols,
            });
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let scale = Scale(pixels_per_inch / 100.0);
        let size = (
            (figure.size.0 * pixels_per_inch).round() as u32,
            (figure.size.1 * pixels_per_inch).round() as u32,
        );

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let body = match &figure.title {
            Some(title) => root.titled(title, scale.font(24.0).style(FontStyle::Bold))?,
            None => root.clone(),
        };
        let cells = body.split_evenly((rows, cols));
        for (panel, area) in figure.panels.iter().zip(cells.iter()) {
            Self::draw_panel(panel, area, scale)?;
        }

        root.present()?;
        debug!(path = %path.display(), width = size.0, height = size.1, "figure rendered");
        Ok(())
    }

    fn draw_panel(panel: &Panel, area: &Area<'_>, scale: Scale) -> Result<(), RenderError> {
        match &panel.content {
            PanelContent::Lines(series) => Self::draw_lines(panel, series, true, area, scale),
            PanelContent::Scatter(series) => Self::draw_lines(panel, series, false, area, scale),
            PanelContent::Bars(groups) => Self::draw_bars(panel, groups, area, scale),
            PanelContent::DualBars {
                left,
                right,
                right_axis,
            } => Self::draw_dual_bars(panel, left, right, right_axis, area, scale),
            PanelContent::Heatmap(data) => Self::draw_heatmap(panel, data, area, scale),
            PanelContent::Boxes(samples) => Self::draw_boxes(panel, samples, area, scale),
            PanelContent::Histogram { samples, bins } => {
                Self::draw_histogram(panel, samples, *bins, area, scale)
            }
        }
    }

    fn build_chart<'a, 'b: 'a>(
        area: &'a Area<'b>,
        caption: &str,
        x: &ResolvedAxis,
        y: &ResolvedAxis,
        scale: Scale,
    ) -> Result<Chart<'a, 'b>, RenderError> {
        let chart = ChartBuilder::on(area)
            .caption(caption, scale.font(15.0).style(FontStyle::Bold))
            .margin(scale.px(12.0))
            .x_label_area_size(scale.px(45.0))
            .y_label_area_size(scale.px(65.0))
            .build_cartesian_2d(TickedRange::from(x), TickedRange::from(y))?;
        Ok(chart)
    }

    fn draw_mesh<'a, 'b: 'a>(
        chart: &mut Chart<'a, 'b>,
        panel: &Panel,
        x: &ResolvedAxis,
        y: &ResolvedAxis,
        scale: Scale,
    ) -> Result<(), RenderError> {
        let x_fmt = |v: &f64| x.label_for(*v);
        let y_fmt = |v: &f64| y.label_for(*v);
        chart
            .configure_mesh()
            .x_desc(panel.x.label.as_str())
            .y_desc(panel.y.label.as_str())
            .x_labels(x.ticks.len().max(2))
            .y_labels(y.ticks.len().max(2))
            .x_label_formatter(&x_fmt)
            .y_label_formatter(&y_fmt)
            .bold_line_style(BLACK.mix(0.12))
            .light_line_style(WHITE.mix(0.0))
            .axis_desc_style(scale.font(13.0))
            .label_style(scale.font(11.0))
            .draw()?;
        Ok(())
    }

    fn draw_legend<'a, 'b: 'a>(chart: &mut Chart<'a, 'b>, scale: Scale) -> Result<(), RenderError> {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK.mix(0.4))
            .label_font(scale.font(11.0))
            .draw()?;
        Ok(())
    }

    /// Text box in the lower-right corner of the plotting area.
    fn draw_footer<'a, 'b: 'a>(
        chart: &Chart<'a, 'b>,
        text: &str,
        scale: Scale,
    ) -> Result<(), RenderError> {
        let plot = chart.plotting_area().strip_coord_spec();
        let (w, h) = plot.dim_in_pixel();
        let style = scale
            .font(10.0)
            .color(&BLACK)
            .pos(Pos::new(HPos::Right, VPos::Bottom));
        let (tw, th) = plot.estimate_text_size(text, &style)?;
        let pad = scale.i(4.0);
        let right = w as i32 - 2 * pad;
        let bottom = h as i32 - 2 * pad;

        plot.draw(&Rectangle::new(
            [
                (right - tw as i32 - pad, bottom - th as i32 - pad),
                (right + pad, bottom + pad),
            ],
            WHITE.mix(0.8).filled(),
        ))?;
        plot.draw(&Rectangle::new(
            [
                (right - tw as i32 - pad, bottom - th as i32 - pad),
                (right + pad, bottom + pad),
            ],
            RGBColor(0x80, 0x80, 0x80),
        ))?;
        plot.draw(&Text::new(text.to_string(), (right, bottom), style))?;
        Ok(())
    }

    fn draw_markers<'a, 'b: 'a>(
        chart: &mut Chart<'a, 'b>,
        points: &[(f64, f64)],
        label: &str,
        style: AlgorithmStyle,
        size: i32,
        opacity: f64,
    ) -> Result<(), RenderError> {
        let fill = style.color.mix(opacity).filled();
        let legend_fill = style.color.filled();
        let color = style.color;
        let d = size + size / 3;

        match style.marker {
            Marker::Circle => {
                chart
                    .draw_series(points.iter().map(|&p| Circle::new(p, size, fill)))?
                    .label(label)
                    .legend(move |(x, y)| {
                        EmptyElement::at((x, y))
                            + PathElement::new(vec![(-12, 0), (12, 0)], color.stroke_width(2))
                            + Circle::new((0, 0), size, legend_fill)
                    });
            }
            Marker::Triangle => {
                chart
                    .draw_series(points.iter().map(|&p| TriangleMarker::new(p, d, fill)))?
                    .label(label)
                    .legend(move |(x, y)| {
                        EmptyElement::at((x, y))
                            + PathElement::new(vec![(-12, 0), (12, 0)], color.stroke_width(2))
                            + TriangleMarker::new((0, 0), d, legend_fill)
                    });
            }
            Marker::Square => {
                chart
                    .draw_series(points.iter().map(|&p| {
                        EmptyElement::at(p) + Rectangle::new([(-size, -size), (size, size)], fill)
                    }))?
                    .label(label)
                    .legend(move |(x, y)| {
                        EmptyElement::at((x, y))
                            + PathElement::new(vec![(-12, 0), (12, 0)], color.stroke_width(2))
                            + Rectangle::new([(-size, -size), (size, size)], legend_fill)
                    });
            }
            Marker::Diamond => {
                chart
                    .draw_series(points.iter().map(|&p| {
                        EmptyElement::at(p)
                            + Polygon::new(vec![(0, -d), (d, 0), (0, d), (-d, 0)], fill)
                    }))?
                    .label(label)
                    .legend(move |(x, y)| {
                        EmptyElement::at((x, y))
                            + PathElement::new(vec![(-12, 0), (12, 0)], color.stroke_width(2))
                            + Polygon::new(vec![(0, -d), (d, 0), (0, d), (-d, 0)], legend_fill)
                    });
            }
        }
        Ok(())
    }

    fn draw_lines(
        panel: &Panel,
        series: &[Series],
        connect: bool,
        area: &Area<'_>,
        scale: Scale,
    ) -> Result<(), RenderError> {
        let xs: Vec<f64> = series.iter().flat_map(|s| s.points.iter().map(|p| p.0)).collect();
        let ys: Vec<f64> = series.iter().flat_map(|s| s.points.iter().map(|p| p.1)).collect();
        let x = panel.x.resolve(&xs);
        let y = panel.y.resolve(&ys);

        let mut chart = Self::build_chart(area, &panel.title, &x, &y, scale)?;
        Self::draw_mesh(&mut chart, panel, &x, &y, scale)?;

        for s in series {
            let points: Vec<(f64, f64)> = s
                .points
                .iter()
                .map(|&(a, b)| (x.project(a), y.project(b)))
                .filter(|(a, b)| a.is_finite() && b.is_finite())
                .collect();
            if points.is_empty() {
                continue;
            }
            if connect {
                chart.draw_series(LineSeries::new(
                    points.clone(),
                    s.style.color.stroke_width(scale.px(2.0)),
                ))?;
                Self::draw_markers(&mut chart, &points, &s.label, s.style, scale.i(5.0), 1.0)?;
            } else {
                Self::draw_markers(&mut chart, &points, &s.label, s.style, scale.i(6.0), 0.6)?;
            }
        }

        if series.iter().any(|s| !s.points.is_empty()) {
            Self::draw_legend(&mut chart, scale)?;
        }
        if let Some(footer) = &panel.footer {
            Self::draw_footer(&chart, footer, scale)?;
        }
        Ok(())
    }

    /// Upper end of an automatic bar axis.
    fn bar_top(groups: &[&BarGroup]) -> f64 {
        let top = groups
            .iter()
            .flat_map(|g| {
                g.values.iter().enumerate().filter_map(move |(i, v)| {
                    let err = g
                        .errors
                        .as_ref()
                        .and_then(|e| e.get(i).copied().flatten())
                        .filter(|e| e.is_finite())
                        .unwrap_or(0.0);
                    v.map(|v| v + err)
                })
            })
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max);
        if top > 0.0 {
            top * 1.15
        } else {
            1.0
        }
    }

    /// Draw one group of bars centred `offset` away from each category.
    fn draw_bar_group<'a, 'b: 'a>(
        chart: &mut Chart<'a, 'b>,
        group: &BarGroup,
        offset: f64,
        width: f64,
        scale: Scale,
    ) -> Result<(), RenderError> {
        let half = width / 2.0;
        let bars: Vec<(f64, f64, RGBColor)> = group
            .values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| {
                v.filter(|v| v.is_finite())
                    .map(|v| (i as f64 + offset, v, group.color_at(i)))
            })
            .collect();

        let opacity = group.opacity;
        let legend_color = group.color_at(0);
        chart
            .draw_series(bars.iter().map(|&(cx, v, c)| {
                Rectangle::new([(cx - half, 0.0), (cx + half, v)], c.mix(opacity).filled())
            }))?
            .label(group.label.as_str())
            .legend(move |(x, y)| {
                Rectangle::new([(x - 6, y - 6), (x + 6, y + 6)], legend_color.mix(opacity).filled())
            });
        chart.draw_series(
            bars.iter()
                .map(|&(cx, v, _)| Rectangle::new([(cx - half, 0.0), (cx + half, v)], EDGE)),
        )?;

        if let Some(errors) = &group.errors {
            let cap = half / 2.0;
            for &(cx, v, _) in &bars {
                let i = (cx - offset).round() as usize;
                let Some(e) = errors.get(i).copied().flatten().filter(|e| e.is_finite()) else {
                    continue;
                };
                chart.draw_series([
                    PathElement::new(vec![(cx, v - e), (cx, v + e)], BLACK.stroke_width(2)),
                    PathElement::new(vec![(cx - cap, v - e), (cx + cap, v - e)], BLACK.stroke_width(2)),
                    PathElement::new(vec![(cx - cap, v + e), (cx + cap, v + e)], BLACK.stroke_width(2)),
                ])?;
            }
        }

        if group.annotate {
            let style = scale
                .font(11.0)
                .style(FontStyle::Bold)
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            chart.draw_series(bars.iter().map(|&(cx, v, _)| {
                let i = (cx - offset).round() as usize;
                let err = group
                    .errors
                    .as_ref()
                    .and_then(|e| e.get(i).copied().flatten());
                let (text, top) = match err {
                    Some(e) if e.is_finite() => (format!("{:.2} ± {:.2}", v, e), v + e),
                    Some(e) => (format!("{:.2} ± {:.2}", v, e), v),
                    None => (format!("{:.2}", v), v),
                };
                Text::new(text, (cx, top), style.clone())
            }))?;
        }
        Ok(())
    }

    fn draw_bars(
        panel: &Panel,
        groups: &[BarGroup],
        area: &Area<'_>,
        scale: Scale,
    ) -> Result<(), RenderError> {
        let refs: Vec<&BarGroup> = groups.iter().collect();
        let x = panel.x.resolve(&[]);
        let y = panel.y.resolve_or((0.0, Self::bar_top(&refs)));

        let mut chart = Self::build_chart(area, &panel.title, &x, &y, scale)?;
        Self::draw_mesh(&mut chart, panel, &x, &y, scale)?;

        let n = groups.len().max(1) as f64;
        let width = 0.8 / n;
        for (g, group) in groups.iter().enumerate() {
            let offset = -0.4 + width * (g as f64 + 0.5);
            Self::draw_bar_group(&mut chart, group, offset, width, scale)?;
        }

        if groups.len() > 1 {
            Self::draw_legend(&mut chart, scale)?;
        }
        if let Some(footer) = &panel.footer {
            Self::draw_footer(&chart, footer, scale)?;
        }
        Ok(())
    }

    fn draw_dual_bars(
        panel: &Panel,
        left: &BarGroup,
        right: &BarGroup,
        right_axis: &Axis,
        area: &Area<'_>,
        scale: Scale,
    ) -> Result<(), RenderError> {
        let x = panel.x.resolve(&[]);
        let y = panel.y.resolve_or((0.0, Self::bar_top(&[left])));
        let y2 = right_axis.resolve_or((0.0, Self::bar_top(&[right])));

        let chart = Self::build_chart(area, &panel.title, &x, &y, scale)?;
        let mut chart = chart.set_secondary_coord(TickedRange::from(&x), TickedRange::from(&y2));
        Self::draw_mesh(&mut *chart, panel, &x, &y, scale)?;

        let y2_fmt = |v: &f64| y2.label_for(*v);
        chart
            .configure_secondary_axes()
            .y_desc(right_axis.label.as_str())
            .y_labels(y2.ticks.len().max(2))
            .y_label_formatter(&y2_fmt)
            .axis_desc_style(scale.font(13.0))
            .label_style(scale.font(11.0))
            .draw()?;

        let width = 0.35;
        Self::draw_bar_group(&mut *chart, left, -width / 2.0, width, scale)?;

        let half = width / 2.0;
        let right_color = right.color_at(0);
        let opacity = right.opacity;
        let bars: Vec<(f64, f64)> = right
            .values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.filter(|v| v.is_finite()).map(|v| (i as f64 + half, v)))
            .collect();
        chart
            .draw_secondary_series(bars.iter().map(|&(cx, v)| {
                Rectangle::new(
                    [(cx - half, 0.0), (cx + half, v)],
                    right_color.mix(opacity).filled(),
                )
            }))?
            .label(right.label.as_str())
            .legend(move |(x, y)| {
                Rectangle::new([(x - 6, y - 6), (x + 6, y + 6)], right_color.mix(opacity).filled())
            });
        chart.draw_secondary_series(
            bars.iter()
                .map(|&(cx, v)| Rectangle::new([(cx - half, 0.0), (cx + half, v)], EDGE)),
        )?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK.mix(0.4))
            .label_font(scale.font(11.0))
            .draw()?;
        Ok(())
    }

    fn draw_heatmap(
        panel: &Panel,
        data: &HeatmapData,
        area: &Area<'_>,
        scale: Scale,
    ) -> Result<(), RenderError> {
        let (w, _) = area.dim_in_pixel();
        let (main, bar) = area.split_horizontally((w as f64 * 0.86) as i32);

        let rows = data.y_labels.len();
        // Row 0 on top.
        let reversed: Vec<String> = data.y_labels.iter().rev().cloned().collect();
        let x = Axis::categories(panel.x.label.as_str(), &data.x_labels).resolve(&[]);
        let y = Axis::categories(panel.y.label.as_str(), &reversed).resolve(&[]);

        let mut chart = Self::build_chart(&main, &panel.title, &x, &y, scale)?;
        chart
            .configure_mesh()
            .x_desc(panel.x.label.as_str())
            .y_desc(panel.y.label.as_str())
            .x_labels(x.ticks.len().max(2))
            .y_labels(y.ticks.len().max(2))
            .x_label_formatter(&|v: &f64| x.label_for(*v))
            .y_label_formatter(&|v: &f64| y.label_for(*v))
            .disable_mesh()
            .axis_desc_style(scale.font(13.0))
            .label_style(scale.font(11.0))
            .draw()?;

        let span = if data.vmax > data.vmin { data.vmax - data.vmin } else { 1.0 };
        let cells: Vec<(f64, f64, f64)> = data
            .values
            .iter()
            .enumerate()
            .flat_map(|(r, row)| {
                row.iter().enumerate().filter_map(move |(c, v)| {
                    v.filter(|v| v.is_finite())
                        .map(|v| (c as f64, (rows - 1 - r) as f64, v))
                })
            })
            .collect();

        chart.draw_series(cells.iter().map(|&(cx, cy, v)| {
            Rectangle::new(
                [(cx - 0.5, cy - 0.5), (cx + 0.5, cy + 0.5)],
                rd_yl_gn((v - data.vmin) / span).filled(),
            )
        }))?;
        chart.draw_series(cells.iter().map(|&(cx, cy, _)| {
            Rectangle::new([(cx - 0.5, cy - 0.5), (cx + 0.5, cy + 0.5)], WHITE.stroke_width(1))
        }))?;

        let text = scale
            .font(11.0)
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(
            cells
                .iter()
                .map(|&(cx, cy, v)| Text::new(format!("{:.1}", v), (cx, cy), text.clone())),
        )?;

        Self::draw_colorbar(&bar, data, scale)
    }

    fn draw_colorbar(area: &Area<'_>, data: &HeatmapData, scale: Scale) -> Result<(), RenderError> {
        let axis = Axis::new(data.colorbar_label.as_str()).resolve_or((data.vmin, data.vmax));
        let mut chart = ChartBuilder::on(area)
            .margin_top(scale.px(40.0))
            .margin_bottom(scale.px(57.0))
            .margin_left(scale.px(4.0))
            .right_y_label_area_size(scale.px(55.0))
            .build_cartesian_2d(TickedRange::new(0.0, 1.0, &[]), TickedRange::from(&axis))?;
        chart
            .configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_desc(data.colorbar_label.as_str())
            .y_labels(axis.ticks.len().max(2))
            .y_label_formatter(&|v: &f64| axis.label_for(*v))
            .axis_desc_style(scale.font(12.0))
            .label_style(scale.font(10.0))
            .draw()?;

        let steps = 100;
        let dv = (axis.hi - axis.lo) / steps as f64;
        chart.draw_series((0..steps).map(|i| {
            let v0 = axis.lo + i as f64 * dv;
            let t = (i as f64 + 0.5) / steps as f64;
            Rectangle::new([(0.0, v0), (1.0, v0 + dv)], rd_yl_gn(t).filled())
        }))?;
        Ok(())
    }

    fn draw_boxes(
        panel: &Panel,
        samples: &[Sample],
        area: &Area<'_>,
        scale: Scale,
    ) -> Result<(), RenderError> {
        let labels: Vec<String> = samples.iter().map(|s| s.label.clone()).collect();
        let x = Axis::categories(panel.x.label.as_str(), &labels).resolve(&[]);
        let all: Vec<f64> = samples.iter().flat_map(|s| s.values.iter().copied()).collect();
        let y = panel.y.resolve(&all);

        let mut chart = Self::build_chart(area, &panel.title, &x, &y, scale)?;
        chart
            .configure_mesh()
            .x_desc(panel.x.label.as_str())
            .y_desc(panel.y.label.as_str())
            .x_labels(x.ticks.len().max(2))
            .y_labels(y.ticks.len().max(2))
            .x_label_formatter(&|v: &f64| x.label_for(*v))
            .y_label_formatter(&|v: &f64| y.label_for(*v))
            .disable_x_mesh()
            .bold_line_style(BLACK.mix(0.12))
            .light_line_style(WHITE.mix(0.0))
            .axis_desc_style(scale.font(13.0))
            .label_style(scale.font(9.0))
            .draw()?;

        let half = 0.3;
        for (i, sample) in samples.iter().enumerate() {
            let Some(b) = StatsCalculator::box_stats(&sample.values) else {
                continue;
            };
            let cx = i as f64;
            let line = BLACK.stroke_width(1);
            chart.draw_series([
                Rectangle::new([(cx - half, b.q1), (cx + half, b.q3)], sample.color.mix(0.6).filled()),
                Rectangle::new([(cx - half, b.q1), (cx + half, b.q3)], line),
            ])?;
            chart.draw_series([
                PathElement::new(vec![(cx - half, b.median), (cx + half, b.median)], RGBColor(0xff, 0x7f, 0x0e).stroke_width(2)),
                PathElement::new(vec![(cx, b.q1), (cx, b.whisker_low)], line),
                PathElement::new(vec![(cx, b.q3), (cx, b.whisker_high)], line),
                PathElement::new(vec![(cx - half / 2.0, b.whisker_low), (cx + half / 2.0, b.whisker_low)], line),
                PathElement::new(vec![(cx - half / 2.0, b.whisker_high), (cx + half / 2.0, b.whisker_high)], line),
            ])?;
            chart.draw_series(
                b.outliers
                    .iter()
                    .map(|&v| Circle::new((cx, v), scale.i(3.0), BLACK.stroke_width(1))),
            )?;
        }
        Ok(())
    }

    fn draw_histogram(
        panel: &Panel,
        samples: &[Sample],
        bins: usize,
        area: &Area<'_>,
        scale: Scale,
    ) -> Result<(), RenderError> {
        let values: Vec<Vec<f64>> = samples.iter().map(|s| s.values.clone()).collect();
        let Some(edges) = StatsCalculator::histogram_edges(&values, bins) else {
            return Ok(());
        };
        let counts: Vec<Vec<usize>> = values
            .iter()
            .map(|v| StatsCalculator::bin_counts(v, &edges))
            .collect();
        let top = counts.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;

        let x = panel.x.resolve(&edges);
        let y = panel.y.resolve_or((0.0, top * 1.1));

        let mut chart = Self::build_chart(area, &panel.title, &x, &y, scale)?;
        Self::draw_mesh(&mut chart, panel, &x, &y, scale)?;

        for (sample, counts) in samples.iter().zip(&counts) {
            if sample.values.is_empty() {
                continue;
            }
            let fill = sample.color.mix(0.5).filled();
            chart
                .draw_series(counts.iter().enumerate().filter(|(_, c)| **c > 0).map(|(i, c)| {
                    Rectangle::new([(edges[i], 0.0), (edges[i + 1], *c as f64)], fill)
                }))?
                .label(sample.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x - 6, y - 6), (x + 6, y + 6)], fill));
        }

        Self::draw_legend(&mut chart, scale)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use tempfile::TempDir;

    /// Render into a fresh temp folder and check a non-empty PNG was written.
    pub fn assert_renders(figure: &Figure, name: &str) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("charts").join(name);
        match ChartRenderer::render(figure, &path, 50.0) {
            Ok(()) => {
                let len = std::fs::metadata(&path).unwrap().len();
                assert!(len > 0, "{} is empty", path.display());
            }
            // Hosts without any system font cannot lay out text.
            Err(e) if e.to_string().to_lowercase().contains("font") => {
                eprintln!("skipping {}: {}", name, e);
            }
            Err(e) => panic!("rendering {} failed: {}", name, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::assert_renders;
    use super::*;
    use crate::charts::style::Palette;
    use crate::data::columns::TRAFFIC_INTERVAL;
    use tempfile::TempDir;

    const ALGORITHMS: [&str; 5] = ["ADR-AVG", "ADR-Lite", "ADR-MAX", "No-ADR", "Custom"];

    fn series() -> Vec<Series> {
        ALGORITHMS
            .iter()
            .enumerate()
            .map(|(i, alg)| {
                let points = [100.0, 550.0, 1000.0]
                    .iter()
                    .map(|d| (*d, 95.0 - i as f64 * 5.0 - d / 100.0))
                    .collect();
                Series::new(*alg, points, Palette::Report)
            })
            .collect()
    }

    fn names() -> Vec<String> {
        ALGORITHMS.iter().map(|a| a.to_string()).collect()
    }

    fn samples() -> Vec<Sample> {
        ALGORITHMS
            .iter()
            .enumerate()
            .map(|(i, alg)| Sample {
                label: alg.to_string(),
                values: vec![70.0, 72.5, 75.0, 76.0, 78.0, 80.0 + i as f64, 40.0],
                color: Palette::Report.style(alg).color,
            })
            .collect()
    }

    fn single(x: Axis, y: Axis, content: PanelContent) -> Figure {
        Figure::single((6.0, 4.0), Panel::new("panel", x, y, content))
    }

    #[test]
    fn bar_top_includes_errors() {
        let mut g = BarGroup::new("e", vec![Some(10.0), None, Some(4.0)], RED);
        g.errors = Some(vec![Some(2.0), None, Some(f64::NAN)]);
        assert!((ChartRenderer::bar_top(&[&g]) - 12.0 * 1.15).abs() < 1e-9);
        let empty = BarGroup::new("e", vec![None], RED);
        assert_eq!(ChartRenderer::bar_top(&[&empty]), 1.0);
    }

    #[test]
    fn key_points_stay_inside_the_range() {
        let range = TickedRange::new(0.0, 10.0, &[-5.0, 0.0, 5.0, 10.0, 15.0, f64::NAN]);
        assert_eq!(range.key_points(8usize), vec![0.0, 5.0, 10.0]);
        assert!(range.key_points(0usize).is_empty());
        assert_eq!(range.range(), 0.0..10.0);
        assert_eq!(range.map(&5.0, (0, 100)), 50);
    }

    #[test]
    fn too_many_panels_is_a_layout_error() {
        let dir = TempDir::new().unwrap();
        let panel = Panel::new("p", Axis::new("x"), Axis::new("y"), PanelContent::Lines(vec![]));
        let figure = Figure {
            title: None,
            size: (2.0, 2.0),
            grid: (1, 1),
            panels: vec![panel.clone(), panel],
        };
        let err = ChartRenderer::render(&figure, &dir.path().join("x.png"), 50.0).unwrap_err();
        assert!(matches!(err, RenderError::Layout { panels: 2, rows: 1, cols: 1 }));
    }

    #[test]
    fn renders_lines_with_every_marker_and_a_footer() {
        let panel = Panel::new(
            "PDR vs devices",
            Axis::new("NumDevices"),
            Axis::pdr("PDR (%)"),
            PanelContent::Lines(series()),
        )
        .with_footer(Some("MobilitySpeed=0".to_string()));
        assert_renders(&Figure::single((6.0, 4.0), panel), "lines.png");
    }

    #[test]
    fn renders_scatter() {
        let figure = single(
            Axis::new("Energy (mJ)"),
            Axis::new("PDR (%)"),
            PanelContent::Scatter(series()),
        );
        assert_renders(&figure, "scatter.png");
    }

    #[test]
    fn renders_annotated_bars_with_errors() {
        let values = vec![Some(90.0), Some(85.0), None, Some(70.0), Some(60.0)];
        let mut pdr = BarGroup::new("PDR", values, BLUE);
        pdr.errors = Some(vec![Some(2.0), None, None, Some(f64::NAN), Some(1.5)]);
        pdr.annotate = true;
        let energy = BarGroup::new("Energy", vec![Some(40.0); 5], RED);
        let figure = single(
            Axis::categories("Algorithm", &names()),
            Axis::new("Value"),
            PanelContent::Bars(vec![pdr, energy]),
        );
        assert_renders(&figure, "bars.png");
    }

    #[test]
    fn renders_bars_on_a_secondary_axis() {
        let left = BarGroup::new("PDR (%)", vec![Some(90.0), Some(80.0), None], BLUE);
        let mut right = BarGroup::new("Energy (mJ)", vec![Some(3.0), None, Some(5.0)], BLUE);
        right.opacity = 0.4;
        let labels = vec!["Density".to_string(), "Sigma".to_string(), "Mobility".to_string()];
        let figure = single(
            Axis::categories("Scenario", &labels),
            Axis::new("PDR (%)"),
            PanelContent::DualBars {
                left,
                right,
                right_axis: Axis::new("Energy (mJ)"),
            },
        );
        assert_renders(&figure, "dual.png");
    }

    #[test]
    fn renders_heatmap_with_missing_cells() {
        let data = HeatmapData {
            x_labels: vec!["100".to_string(), "550".to_string(), "1000".to_string()],
            y_labels: vec!["ADR-AVG".to_string(), "No-ADR".to_string()],
            values: vec![
                vec![Some(95.0), Some(88.5), None],
                vec![Some(70.0), Some(61.2), Some(40.0)],
            ],
            vmin: 40.0,
            vmax: 95.0,
            colorbar_label: "PDR (%)".to_string(),
        };
        let figure = single(
            Axis::new("NumDevices"),
            Axis::new("Algorithm"),
            PanelContent::Heatmap(data),
        );
        assert_renders(&figure, "heatmap.png");
    }

    #[test]
    fn renders_boxes_with_outliers() {
        let mut samples = samples();
        samples.push(Sample {
            label: "empty".to_string(),
            values: vec![],
            color: BLACK,
        });
        let figure = single(
            Axis::new("Algorithm"),
            Axis::new("PDR (%)"),
            PanelContent::Boxes(samples),
        );
        assert_renders(&figure, "boxes.png");
    }

    #[test]
    fn renders_histogram() {
        let figure = single(
            Axis::new("PDR (%)"),
            Axis::new("Count"),
            PanelContent::Histogram {
                samples: samples(),
                bins: 5,
            },
        );
        assert_renders(&figure, "histogram.png");
    }

    #[test]
    fn renders_titled_grid_on_a_log_axis() {
        let log_series: Vec<Series> = ALGORITHMS
            .iter()
            .map(|alg| {
                let points = vec![(72.0, 60.0), (600.0, 80.0), (3600.0, 95.0)];
                Series::new(*alg, points, Palette::Report)
            })
            .collect();
        let log_panel = Panel::new(
            "PDR vs traffic interval",
            Axis::for_parameter(TRAFFIC_INTERVAL, "Traffic interval (s)").log(),
            Axis::pdr("PDR (%)"),
            PanelContent::Lines(log_series),
        );
        let auto_log = Panel::new(
            "Energy vs traffic interval",
            Axis::new("Traffic interval (s)").log(),
            Axis::new("Energy (mJ)"),
            PanelContent::Lines(series()),
        );
        let empty = Panel::new(
            "nothing",
            Axis::new("x"),
            Axis::new("y"),
            PanelContent::Lines(vec![]),
        );
        let panels = vec![log_panel, auto_log, empty];
        let figure = Figure::grid("Traffic", (10.0, 8.0), (2, 2), panels);
        assert_renders(&figure, "traffic.png");
    }
}
