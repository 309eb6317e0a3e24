//! Statistics Calculator Module
//! Descriptive statistics, boxplot figures and per-algorithm summary rows.

use crate::data::columns::{Scenario, EFFICIENCY, ENERGY, PDR};
use crate::data::{DataProcessor, ProcessorError};
use polars::prelude::*;
use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Descriptive statistics of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptive {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (ddof 1), NaN for fewer than two values.
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub p05: f64,
    pub q1: f64,
    pub q3: f64,
    pub p95: f64,
}

impl Default for Descriptive {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            median: f64::NAN,
            p05: f64::NAN,
            q1: f64::NAN,
            q3: f64::NAN,
            p95: f64::NAN,
        }
    }
}

/// Figures needed to draw one box of a boxplot.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Lowest value within `q1 - 1.5 * IQR`.
    pub whisker_low: f64,
    /// Highest value within `q3 + 1.5 * IQR`.
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// One line of `resume_performances.csv`.
#[derive(Debug, Clone)]
pub struct SummaryRow {
    pub scenario: String,
    pub algorithm: String,
    pub pdr_mean: f64,
    pub pdr_std: f64,
    pub energy_mean: f64,
    pub energy_std: f64,
    pub efficiency: f64,
}

impl SummaryRow {
    pub const HEADER: [&'static str; 7] = [
        "Scenario",
        "Algorithm",
        "PDR_mean",
        "PDR_std",
        "Energy_mean_mJ",
        "Energy_std",
        "Efficiency",
    ];

    /// Cells with numbers rounded to two decimals.
    pub fn cells(&self) -> [String; 7] {
        [
            self.scenario.clone(),
            self.algorithm.clone(),
            format!("{:.2}", self.pdr_mean),
            format!("{:.2}", self.pdr_std),
            format!("{:.2}", self.energy_mean),
            format!("{:.2}", self.energy_std),
            format!("{:.2}", self.efficiency),
        ]
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> Descriptive {
        let n = values.len();
        if n == 0 {
            return Descriptive::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Descriptive {
            count: n,
            mean: values.iter().mean(),
            std: values.iter().std_dev(),
            min: sorted[0],
            max: sorted[n - 1],
            median: Self::percentile(&sorted, 50.0),
            p05: Self::percentile(&sorted, 5.0),
            q1: Self::percentile(&sorted, 25.0),
            q3: Self::percentile(&sorted, 75.0),
            p95: Self::percentile(&sorted, 95.0),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Quartiles, Tukey whiskers and outliers. `None` for an empty sample.
    pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let q1 = Self::percentile(&sorted, 25.0);
        let median = Self::percentile(&sorted, 50.0);
        let q3 = Self::percentile(&sorted, 75.0);
        let iqr = q3 - q1;
        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;

        let inside = sorted.iter().copied().filter(|v| *v >= low_fence && *v <= high_fence);
        let whisker_low = inside.clone().fold(f64::INFINITY, f64::min);
        let whisker_high = inside.fold(f64::NEG_INFINITY, f64::max);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < low_fence || *v > high_fence)
            .collect();

        Some(BoxStats {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }

    /// `bins + 1` equal-width edges spanning every sample, shared so that
    /// overlaid histograms line up. `None` when all samples are empty.
    pub fn histogram_edges(samples: &[Vec<f64>], bins: usize) -> Option<Vec<f64>> {
        let all = samples.iter().flatten().copied().filter(|v| v.is_finite());
        let (lo, hi) = all.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if lo > hi || bins == 0 {
            return None;
        }
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
        let width = (hi - lo) / bins as f64;
        Some((0..=bins).map(|i| lo + i as f64 * width).collect())
    }

    /// Count values per bin; the last bin includes its right edge.
    pub fn bin_counts(values: &[f64], edges: &[f64]) -> Vec<usize> {
        let bins = edges.len().saturating_sub(1);
        let mut counts = vec![0; bins];
        if bins == 0 {
            return counts;
        }
        let lo = edges[0];
        let hi = edges[bins];
        let width = (hi - lo) / bins as f64;
        for v in values.iter().copied().filter(|v| *v >= lo && *v <= hi) {
            let idx = (((v - lo) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }
        counts
    }

    /// Summary rows for one scenario, algorithms in order of first appearance.
    pub fn scenario_summary(
        scenario: Scenario,
        df: &DataFrame,
    ) -> Result<Vec<SummaryRow>, ProcessorError> {
        DataProcessor::algorithms(df)?
            .into_iter()
            .map(|alg| {
                let subset = DataProcessor::filter_alg(df, &alg)?;
                let pdr = Self::compute_descriptive_stats(&DataProcessor::values(&subset, PDR)?);
                let energy =
                    Self::compute_descriptive_stats(&DataProcessor::values(&subset, ENERGY)?);
                let efficiency =
                    Self::compute_descriptive_stats(&DataProcessor::values(&subset, EFFICIENCY)?);
                Ok(SummaryRow {
                    scenario: scenario.name().to_string(),
                    algorithm: alg,
                    pdr_mean: pdr.mean,
                    pdr_std: pdr.std,
                    energy_mean: energy.mean,
                    energy_std: energy.std,
                    efficiency: efficiency.mean,
                })
            })
            .collect()
    }

    /// Summary rows for every scenario, computed in parallel.
    /// Output keeps the order of `scenarios`.
    pub fn summary_rows(
        scenarios: &[(Scenario, DataFrame)],
    ) -> Result<Vec<SummaryRow>, ProcessorError> {
        let per_scenario: Vec<Vec<SummaryRow>> = scenarios
            .par_iter()
            .map(|(scenario, df)| Self::scenario_summary(*scenario, df))
            .collect::<Result<_, _>>()?;
        Ok(per_scenario.into_iter().flatten().collect())
    }
}
