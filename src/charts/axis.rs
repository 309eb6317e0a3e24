//! Axis ranges, ticks and tick labels.

use crate::data::columns::{format_value, NUM_DEVICES, TRAFFIC_INTERVAL};

/// Tick positions used whenever traffic interval is on an axis.
pub const TRAFFIC_TICKS: [f64; 8] = [72.0, 300.0, 600.0, 900.0, 1200.0, 1800.0, 2400.0, 3600.0];

/// Axis request. Anything left unset is derived from the data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Axis {
    pub label: String,
    pub range: Option<(f64, f64)>,
    pub ticks: Option<Vec<f64>>,
    pub tick_labels: Option<Vec<String>>,
    pub log: bool,
}

/// Axis after data-driven defaults have been applied. Values are in
/// projected space (log10 for log axes).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAxis {
    pub lo: f64,
    pub hi: f64,
    pub ticks: Vec<f64>,
    pub labels: Vec<String>,
    pub log: bool,
}

impl Axis {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn range(mut self, lo: f64, hi: f64) -> Self {
        self.range = Some((lo, hi));
        self
    }

    pub fn ticks(mut self, ticks: Vec<f64>) -> Self {
        self.ticks = Some(ticks);
        self
    }

    pub fn labelled_ticks(mut self, ticks: Vec<f64>, labels: Vec<String>) -> Self {
        self.ticks = Some(ticks);
        self.tick_labels = Some(labels);
        self
    }

    pub fn log(mut self) -> Self {
        self.log = true;
        self
    }

    /// Percentage axis, 0..100 with a tick every 20.
    pub fn pdr(label: impl Into<String>) -> Self {
        Self::new(label)
            .range(0.0, 100.0)
            .ticks(stepped(0.0, 100.0, 20.0))
    }

    /// Apply the fixed conventions of a parameter axis, if it has any.
    pub fn for_parameter(param: &str, label: impl Into<String>) -> Self {
        let axis = Self::new(label);
        match param {
            NUM_DEVICES => axis.range(100.0, 1000.0).ticks(stepped(100.0, 1000.0, 100.0)),
            TRAFFIC_INTERVAL => axis.range(72.0, 3600.0).ticks(TRAFFIC_TICKS.to_vec()),
            _ => axis,
        }
    }

    /// Messages-per-hour axis with ticks at `3600 / interval`.
    pub fn messages_per_hour(
        label: impl Into<String>,
        intervals: &[f64],
        range: (f64, f64),
        suffix: &str,
    ) -> Self {
        let ticks: Vec<f64> = intervals
            .iter()
            .map(|t| (3600.0 / t).trunc())
            .collect();
        let labels = ticks
            .iter()
            .map(|m| format!("{}{}", format_value(*m), suffix))
            .collect();
        Self::new(label)
            .range(range.0, range.1)
            .labelled_ticks(ticks, labels)
    }

    /// Categorical axis: one slot per name, centred on `0, 1, ..`.
    pub fn categories(label: impl Into<String>, names: &[String]) -> Self {
        let n = names.len().max(1) as f64;
        Self::new(label).range(-0.5, n - 0.5).labelled_ticks(
            (0..names.len()).map(|i| i as f64).collect(),
            names.to_vec(),
        )
    }

    /// Resolve against data values, padding an automatic range by 5%.
    pub fn resolve(&self, values: &[f64]) -> ResolvedAxis {
        let (lo, hi) = self.range.unwrap_or_else(|| padded_range(values, self.log));
        self.finish(lo, hi)
    }

    /// Resolve with an explicit fallback range.
    pub fn resolve_or(&self, fallback: (f64, f64)) -> ResolvedAxis {
        let (lo, hi) = self.range.unwrap_or(fallback);
        self.finish(lo, hi)
    }

    fn finish(&self, lo: f64, hi: f64) -> ResolvedAxis {
        let (lo, hi) = if self.log {
            (lo.max(f64::MIN_POSITIVE), hi.max(f64::MIN_POSITIVE))
        } else {
            (lo, hi)
        };
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 1.0, lo + 1.0) };

        let ticks = match &self.ticks {
            Some(ticks) => ticks.clone(),
            None if self.log => decade_ticks(lo, hi),
            None => auto_ticks(lo, hi),
        };
        let labels = match &self.tick_labels {
            Some(labels) => labels.clone(),
            None => ticks.iter().map(|t| tick_label(*t)).collect(),
        };

        let project = |v: f64| if self.log { v.log10() } else { v };
        ResolvedAxis {
            lo: project(lo),
            hi: project(hi),
            ticks: ticks.iter().map(|t| project(*t)).collect(),
            labels,
            log: self.log,
        }
    }
}

impl ResolvedAxis {
    /// Map a data value into axis space.
    pub fn project(&self, v: f64) -> f64 {
        if self.log {
            v.log10()
        } else {
            v
        }
    }

    /// Label of a projected tick position.
    pub fn label_for(&self, v: f64) -> String {
        self.ticks
            .iter()
            .position(|t| (t - v).abs() < 1e-9)
            .and_then(|i| self.labels.get(i).cloned())
            .unwrap_or_else(|| tick_label(if self.log { 10f64.powf(v) } else { v }))
    }
}

/// `lo, lo + step, ..` up to and including `hi`.
pub fn stepped(lo: f64, hi: f64, step: f64) -> Vec<f64> {
    let count = ((hi - lo) / step + 1e-9).floor() as usize;
    (0..=count).map(|k| lo + k as f64 * step).collect()
}

/// Round a raw step to 1, 2 or 5 times a power of ten.
pub fn nice_step(range: f64, target_steps: usize) -> f64 {
    let raw_step = range / target_steps as f64;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let normalized = raw_step / magnitude;

    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };

    nice * magnitude
}

fn auto_ticks(lo: f64, hi: f64) -> Vec<f64> {
    let step = nice_step(hi - lo, 6);
    let first = (lo / step).ceil() as i64;
    let last = (hi / step + 1e-9).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

fn decade_ticks(lo: f64, hi: f64) -> Vec<f64> {
    let first = lo.log10().ceil() as i32;
    let last = hi.log10().floor() as i32;
    let mut ticks: Vec<f64> = (first..=last).map(|k| 10f64.powi(k)).collect();
    if ticks.len() < 2 {
        ticks = vec![lo, hi];
    }
    ticks
}

fn padded_range(values: &[f64], log: bool) -> (f64, f64) {
    let finite = values.iter().copied().filter(|v| v.is_finite() && (!log || *v > 0.0));
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if min > max {
        return if log { (1.0, 10.0) } else { (0.0, 1.0) };
    }
    if log {
        return (min / 1.1, max * 1.1);
    }
    let pad = if max > min { (max - min) * 0.05 } else { min.abs().max(1.0) * 0.05 };
    (min - pad, max + pad)
}

/// Short tick text: integers without decimals, others with at most three.
pub fn tick_label(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        return format_value(v.round() + 0.0);
    }
    let text = format!("{:.3}", v);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
