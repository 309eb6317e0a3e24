//! Plot configuration
//! Output locations, algorithm order and the fixed parameter values used by the curated figures.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Parameter values held constant by the fixed-parameter figures.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FixedParams {
    #[serde(default = "FixedParams::default_mobility")]
    pub mobility: f64,
    #[serde(default = "FixedParams::default_devices")]
    pub devices: f64,
    /// Device count of the sigma and traffic scenario figures.
    #[serde(default = "FixedParams::default_scenario_devices")]
    pub scenario_devices: f64,
    #[serde(default = "FixedParams::default_interval")]
    pub interval: f64,
    #[serde(default = "FixedParams::default_sigma")]
    pub sigma: f64,
    /// One pair of mobility figures per device count.
    #[serde(default = "FixedParams::default_mobility_devices")]
    pub mobility_devices: Vec<f64>,
    /// Intervals shown as ticks on the traffic scenario's messages-per-hour axis.
    #[serde(default = "FixedParams::default_scenario_intervals")]
    pub scenario_intervals: Vec<f64>,
}

impl FixedParams {
    fn default_mobility() -> f64 {
        0.0
    }
    fn default_devices() -> f64 {
        550.0
    }
    fn default_scenario_devices() -> f64 {
        1000.0
    }
    fn default_interval() -> f64 {
        3600.0
    }
    fn default_sigma() -> f64 {
        3.96
    }
    fn default_mobility_devices() -> Vec<f64> {
        vec![100.0, 550.0, 1000.0]
    }
    fn default_scenario_intervals() -> Vec<f64> {
        vec![72.0, 360.0, 1800.0, 3600.0]
    }
}

impl Default for FixedParams {
    fn default() -> Self {
        Self {
            mobility: Self::default_mobility(),
            devices: Self::default_devices(),
            scenario_devices: Self::default_scenario_devices(),
            interval: Self::default_interval(),
            sigma: Self::default_sigma(),
            mobility_devices: Self::default_mobility_devices(),
            scenario_intervals: Self::default_scenario_intervals(),
        }
    }
}

/// Settings of the `density` command.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DensityConfig {
    #[serde(default = "DensityConfig::default_algorithm_order")]
    pub algorithm_order: Vec<String>,
    #[serde(default = "DensityConfig::default_mobility_grid")]
    pub mobility_grid: Vec<f64>,
    #[serde(default = "DensityConfig::default_interval_grid")]
    pub interval_grid: Vec<f64>,
    #[serde(default = "DensityConfig::default_loss_grid")]
    pub loss_grid: Vec<f64>,
}

impl DensityConfig {
    fn default_algorithm_order() -> Vec<String> {
        ["No-ADR", "ADR-MAX", "ADR-AVG", "ADR-Lite"]
            .into_iter()
            .map(String::from)
            .collect()
    }
    fn default_mobility_grid() -> Vec<f64> {
        vec![0.0, 33.3, 60.0]
    }
    fn default_interval_grid() -> Vec<f64> {
        vec![72.0, 145.0, 3600.0]
    }
    fn default_loss_grid() -> Vec<f64> {
        vec![0.0, 3.96, 7.92]
    }
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            algorithm_order: Self::default_algorithm_order(),
            mobility_grid: Self::default_mobility_grid(),
            interval_grid: Self::default_interval_grid(),
            loss_grid: Self::default_loss_grid(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlotConfig {
    #[serde(default = "PlotConfig::default_output_dir")]
    pub output_dir: PathBuf,
    /// Bitmap pixels per figure inch.
    #[serde(default = "PlotConfig::default_pixels_per_inch")]
    pub pixels_per_inch: f64,
    /// Legend order of the report figures.
    #[serde(default = "PlotConfig::default_algorithm_order")]
    pub algorithm_order: Vec<String>,
    #[serde(default = "PlotConfig::default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default)]
    pub fixed: FixedParams,
    #[serde(default)]
    pub density: DensityConfig,
}

impl PlotConfig {
    fn default_output_dir() -> PathBuf {
        PathBuf::from("output")
    }
    fn default_pixels_per_inch() -> f64 {
        100.0
    }
    fn default_algorithm_order() -> Vec<String> {
        crate::data::columns::ALGORITHMS
            .into_iter()
            .map(String::from)
            .collect()
    }
    fn default_histogram_bins() -> usize {
        20
    }

    /// Read a JSON file; keys left out keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output_dir: Self::default_output_dir(),
            pixels_per_inch: Self::default_pixels_per_inch(),
            algorithm_order: Self::default_algorithm_order(),
            histogram_bins: Self::default_histogram_bins(),
            fixed: FixedParams::default(),
            density: DensityConfig::default(),
        }
    }
}
