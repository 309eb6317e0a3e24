//! Algorithm colours and markers.

use plotters::style::RGBColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
    Triangle,
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlgorithmStyle {
    pub color: RGBColor,
    pub marker: Marker,
}

/// Colour scheme of a command. The density comparison uses its own scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Report,
    Density,
}

const GREY: RGBColor = RGBColor(0x7f, 0x8c, 0x8d);

impl Palette {
    pub fn style(&self, alg: &str) -> AlgorithmStyle {
        let (color, marker) = match (self, alg) {
            (Palette::Report, "ADR-AVG") => (RGBColor(0xe7, 0x4c, 0x3c), Marker::Circle),
            (Palette::Report, "ADR-Lite") => (RGBColor(0x34, 0x98, 0xdb), Marker::Square),
            (Palette::Report, "ADR-MAX") => (RGBColor(0x2e, 0xcc, 0x71), Marker::Triangle),
            (Palette::Report, "No-ADR") => (RGBColor(0xf3, 0x9c, 0x12), Marker::Diamond),
            (Palette::Density, "No-ADR") => (RGBColor(0x21, 0x96, 0xf3), Marker::Circle),
            (Palette::Density, "ADR-MAX") => (RGBColor(0x4c, 0xaf, 0x50), Marker::Square),
            (Palette::Density, "ADR-AVG") => (RGBColor(0xff, 0x98, 0x00), Marker::Triangle),
            (Palette::Density, "ADR-Lite") => (RGBColor(0xe9, 0x1e, 0x63), Marker::Diamond),
            _ => (GREY, Marker::Circle),
        };
        AlgorithmStyle { color, marker }
    }
}

/// RdYlGn colour scale, `t` in `[0, 1]`.
pub fn rd_yl_gn(t: f64) -> RGBColor {
    const STOPS: [(f64, (u8, u8, u8)); 5] = [
        (0.0, (0xa5, 0x00, 0x26)),
        (0.25, (0xf4, 0x6d, 0x43)),
        (0.5, (0xff, 0xff, 0xbf)),
        (0.75, (0x66, 0xbd, 0x63)),
        (1.0, (0x00, 0x68, 0x37)),
    ];
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let upper = STOPS.iter().position(|(s, _)| *s >= t).unwrap_or(STOPS.len() - 1).max(1);
    let (s0, c0) = STOPS[upper - 1];
    let (s1, c1) = STOPS[upper];
    let f = (t - s0) / (s1 - s0);
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
    RGBColor(lerp(c0.0, c1.0), lerp(c0.1, c1.1), lerp(c0.2, c1.2))
}
