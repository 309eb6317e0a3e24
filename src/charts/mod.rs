//! Charts module - Figure description and PNG rendering

pub mod axis;
pub mod figure;
mod renderer;
pub mod style;

pub use axis::Axis;
pub use figure::{BarGroup, Figure, HeatmapData, Panel, PanelContent, Sample, Series};
pub use renderer::ChartRenderer;
pub use style::Palette;

#[cfg(test)]
pub(crate) use renderer::test_support;
