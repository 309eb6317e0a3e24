//! CSV Data Loader Module
//! Reads simulator summaries with Polars and normalizes them to the canonical schema.

use crate::data::columns::{
    ALG, ALGORITHMS, ALG_CANDIDATES, EFFICIENCY, ENERGY, MAX_RANDOM_LOSS, NUMERIC_COLUMNS, PDR,
    SIGMA, UNKNOWN_ALG,
};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Result of loading every file found for one scenario.
#[derive(Debug)]
pub struct LoadedTable {
    pub df: DataFrame,
    pub loaded: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl LoadedTable {
    pub fn row_count(&self) -> usize {
        self.df.height()
    }
}

/// Handles CSV file loading with Polars.
pub struct DataLoader;

impl DataLoader {
    /// Load a summary CSV and normalize it.
    ///
    /// Column names are trimmed and spaces become underscores, the algorithm
    /// label is resolved into `alg`, and the result is projected onto the
    /// canonical numeric schema (missing columns become all-null).
    pub fn load_data(path: &Path) -> Result<DataFrame, LoaderError> {
        let mut df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()
            .and_then(|lazy| lazy.collect())
            .map_err(|source| LoaderError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

        Self::normalize_columns(&mut df)?;

        let labels = Self::resolve_algorithms(&df, path)?;
        let table = Self::canonicalize(&df, labels)?;
        debug!(path = %path.display(), rows = table.height(), "loaded summary");
        Ok(table)
    }

    /// Load and stack every path. Files that fail are recorded and skipped.
    pub fn load_scenario(paths: &[PathBuf]) -> Option<LoadedTable> {
        let mut stacked: Option<DataFrame> = None;
        let mut loaded = Vec::new();
        let mut failed = Vec::new();

        for path in paths {
            let part = match Self::load_data(path) {
                Ok(df) => df,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable summary");
                    failed.push((path.clone(), e.to_string()));
                    continue;
                }
            };

            match stacked.as_mut() {
                None => stacked = Some(part),
                Some(df) => {
                    if let Err(e) = df.vstack_mut(&part) {
                        warn!(path = %path.display(), error = %e, "could not append summary");
                        failed.push((path.clone(), e.to_string()));
                        continue;
                    }
                }
            }
            loaded.push(path.clone());
        }

        stacked.map(|df| LoadedTable { df, loaded, failed })
    }

    /// Trim a column name and replace inner spaces with underscores.
    pub fn normalize_column_name(name: &str) -> String {
        name.trim().replace(' ', "_")
    }

    fn normalize_columns(df: &mut DataFrame) -> Result<(), LoaderError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for name in &names {
            let normalized = Self::normalize_column_name(name);
            if normalized != *name {
                df.rename(name, normalized.into())?;
            }
        }
        Ok(())
    }

    /// Map spelling variants onto the labels used by the charts.
    pub fn canonical_label(raw: &str) -> String {
        match raw.trim() {
            "" => UNKNOWN_ALG.to_string(),
            "ADR_AVG" => "ADR-AVG".to_string(),
            "ADR_MAX" => "ADR-MAX".to_string(),
            "ADR_Lite" => "ADR-Lite".to_string(),
            "No_ADR" => "No-ADR".to_string(),
            other => other.to_string(),
        }
    }

    /// Guess the algorithm from tokens in a file name.
    pub fn algorithm_from_file_name(file_name: &str) -> Option<String> {
        const EXACT: [&str; 7] = [
            "ADR-AVG", "ADR-Lite", "ADR-MAX", "No-ADR", "ADR_AVG", "ADR_MAX", "No_ADR",
        ];
        if let Some(token) = EXACT.iter().find(|t| file_name.contains(*t)) {
            return Some(Self::canonical_label(token));
        }

        let lower = file_name.to_lowercase();
        let found = if lower.contains("adr-lite") {
            ALGORITHMS[1]
        } else if lower.contains("adr-avg") || lower.contains("adr_avg") {
            ALGORITHMS[0]
        } else if lower.contains("adr-max") || lower.contains("adr_max") {
            ALGORITHMS[2]
        } else if lower.contains("no-adr") || lower.contains("no_adr") {
            ALGORITHMS[3]
        } else {
            return None;
        };
        Some(found.to_string())
    }

    fn resolve_algorithms(df: &DataFrame, path: &Path) -> Result<Vec<String>, LoaderError> {
        let source = std::iter::once(ALG)
            .chain(ALG_CANDIDATES)
            .find_map(|name| df.column(name).ok());

        if let Some(column) = source {
            let as_text = column.cast(&DataType::String)?;
            let labels = as_text
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|v| Self::canonical_label(v.unwrap_or_default()))
                .collect();
            return Ok(labels);
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let label = Self::algorithm_from_file_name(&file_name)
            .unwrap_or_else(|| UNKNOWN_ALG.to_string());
        Ok(vec![label; df.height()])
    }

    /// Numeric values of a column with coerce semantics: anything that does
    /// not parse, and NaN, becomes `None`. Text cells are trimmed first, so
    /// `", 100"` reads as 100.
    fn coerced_values(column: &Column) -> Result<Vec<Option<f64>>, LoaderError> {
        if column.dtype() == &DataType::String {
            let values = column
                .as_materialized_series()
                .str()?
                .into_iter()
                .map(|v| {
                    v.and_then(|s| s.trim().parse::<f64>().ok())
                        .filter(|x| !x.is_nan())
                })
                .collect();
            return Ok(values);
        }

        let cast = column.cast(&DataType::Float64)?;
        let values = cast
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        Ok(values)
    }

    fn canonicalize(df: &DataFrame, labels: Vec<String>) -> Result<DataFrame, LoaderError> {
        let height = df.height();
        let has = |name: &str| df.column(name).is_ok();

        let mut columns = Vec::with_capacity(NUMERIC_COLUMNS.len() + 2);
        columns.push(Column::new(ALG.into(), labels));

        let mut pdr = vec![None; height];
        let mut energy = vec![None; height];

        for name in NUMERIC_COLUMNS {
            // Sigma and MaxRandomLoss name the same knob; fill one from the other.
            let source = match name {
                SIGMA if !has(SIGMA) => MAX_RANDOM_LOSS,
                MAX_RANDOM_LOSS if !has(MAX_RANDOM_LOSS) => SIGMA,
                other => other,
            };
            let values = match df.column(source) {
                Ok(column) => Self::coerced_values(column)?,
                Err(_) => vec![None; height],
            };
            match name {
                PDR => pdr = values.clone(),
                ENERGY => energy = values.clone(),
                _ => {}
            }
            columns.push(Column::new(name.into(), values));
        }

        let efficiency: Vec<Option<f64>> = pdr
            .iter()
            .zip(&energy)
            .map(|(p, e)| match (p, e) {
                (Some(p), Some(e)) if *e != 0.0 => Some(p / e).filter(|v| v.is_finite()),
                _ => None,
            })
            .collect();
        columns.push(Column::new(EFFICIENCY.into(), efficiency));

        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::columns::{MOBILITY_SPEED, NUM_DEVICES};
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    fn strings(df: &DataFrame, name: &str) -> Vec<String> {
        df.column(name)
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect()
    }

    fn numbers(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    #[test]
    fn column_name_normalization_is_idempotent() {
        let once = DataLoader::normalize_column_name("  PDR Percent ");
        assert_eq!(once, "PDR_Percent");
        assert_eq!(DataLoader::normalize_column_name(&once), once);
        assert_eq!(DataLoader::normalize_column_name("Avg Energy mJ"), "Avg_Energy_mJ");
    }

    #[test]
    fn algorithm_from_exact_file_token() {
        assert_eq!(
            DataLoader::algorithm_from_file_name("summary_scen1_dev100_ADR-Lite_run1.csv"),
            Some("ADR-Lite".to_string())
        );
        assert_eq!(
            DataLoader::algorithm_from_file_name("summary_ADR_MAX_run2.csv"),
            Some("ADR-MAX".to_string())
        );
    }

    #[test]
    fn algorithm_from_lowercase_file_token() {
        assert_eq!(
            DataLoader::algorithm_from_file_name("run_no-adr_3.csv"),
            Some("No-ADR".to_string())
        );
        assert_eq!(
            DataLoader::algorithm_from_file_name("adr_avg.csv"),
            Some("ADR-AVG".to_string())
        );
        assert_eq!(DataLoader::algorithm_from_file_name("summary_run1.csv"), None);
    }

    #[test]
    fn algorithm_column_variants_are_copied() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "whatever.csv",
            "Algorithm , NumDevices,PDR Percent,AvgEnergy_mJ\nADR-MAX,100,90.5,2.0\nNo-ADR,200,80,4\n",
        );
        let df = DataLoader::load_data(&path).unwrap();
        assert_eq!(strings(&df, ALG), vec!["ADR-MAX", "No-ADR"]);
        assert_eq!(numbers(&df, NUM_DEVICES), vec![Some(100.0), Some(200.0)]);
        assert_eq!(numbers(&df, PDR), vec![Some(90.5), Some(80.0)]);
        assert_eq!(numbers(&df, EFFICIENCY), vec![Some(45.25), Some(20.0)]);
    }

    #[test]
    fn missing_algorithm_falls_back_to_unknown() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "summary_density_run1.csv", "NumDevices,PDR_Percent\n100,50\n");
        let df = DataLoader::load_data(&path).unwrap();
        assert_eq!(strings(&df, ALG), vec![UNKNOWN_ALG]);
    }

    #[test]
    fn algorithm_taken_from_file_name() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "summary_scen1_dev100_mob0.0_traf3600_sig3.96_ADR-AVG_run1.csv",
            "NumDevices,MobilitySpeed,TrafficInterval,MaxRandomLoss,RunNumber,TotalPackets,SuccessfulPackets,PDR_Percent,AvgEnergy_mJ\n\
             100,0.0,3600,3.96,1,100,95,95.00,1.5\n",
        );
        let df = DataLoader::load_data(&path).unwrap();
        assert_eq!(strings(&df, ALG), vec!["ADR-AVG"]);
        // Sigma is filled from MaxRandomLoss.
        assert_eq!(numbers(&df, SIGMA), vec![Some(3.96)]);
        assert_eq!(numbers(&df, MAX_RANDOM_LOSS), vec![Some(3.96)]);
    }

    #[test]
    fn unparsable_numbers_become_null() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "x.csv",
            "alg,MobilitySpeed,PDR_Percent\nADR-AVG,abc,10\nADR-AVG,5,20\n",
        );
        let df = DataLoader::load_data(&path).unwrap();
        assert_eq!(numbers(&df, MOBILITY_SPEED), vec![None, Some(5.0)]);
        // Absent columns are materialized as nulls.
        assert_eq!(numbers(&df, ENERGY), vec![None, None]);
        assert_eq!(numbers(&df, EFFICIENCY), vec![None, None]);
    }

    #[test]
    fn padded_cells_are_trimmed_before_parsing() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "padded.csv",
            "alg, NumDevices, PDR Percent, AvgEnergy_mJ\nADR-AVG, 100, 90.5, 2.0\nNo-ADR, 550, 80, 4\n",
        );
        let df = DataLoader::load_data(&path).unwrap();
        assert_eq!(numbers(&df, NUM_DEVICES), vec![Some(100.0), Some(550.0)]);
        assert_eq!(numbers(&df, PDR), vec![Some(90.5), Some(80.0)]);
        assert_eq!(numbers(&df, ENERGY), vec![Some(2.0), Some(4.0)]);
        assert_eq!(strings(&df, ALG), vec!["ADR-AVG", "No-ADR"]);
    }

    #[test]
    fn blank_algorithm_cells_become_unknown() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(
            &dir,
            "labels.csv",
            "Algorithm,NumDevices\nADR-AVG,100\n,200\n   ,300\n",
        );
        let df = DataLoader::load_data(&path).unwrap();
        assert_eq!(strings(&df, ALG), vec!["ADR-AVG", UNKNOWN_ALG, UNKNOWN_ALG]);
        assert_eq!(UNKNOWN_ALG, "Unknown");
    }

    #[test]
    fn load_scenario_stacks_and_skips_failures() {
        let dir = TempDir::new().unwrap();
        let a = write_csv(&dir, "a_ADR-AVG.csv", "NumDevices,PDR_Percent\n100,50\n200,60\n");
        let b = write_csv(&dir, "b_No-ADR.csv", "NumDevices,AvgEnergy_mJ\n100,3.5\n");
        let missing = dir.path().join("missing.csv");

        let table = DataLoader::load_scenario(&[a.clone(), missing.clone(), b.clone()]).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.loaded, vec![a, b]);
        assert_eq!(table.failed.len(), 1);
        assert_eq!(table.failed[0].0, missing);
        assert_eq!(strings(&table.df, ALG), vec!["ADR-AVG", "ADR-AVG", "No-ADR"]);
    }

    #[test]
    fn load_scenario_with_nothing_readable() {
        let dir = TempDir::new().unwrap();
        assert!(DataLoader::load_scenario(&[dir.path().join("nope.csv")]).is_none());
        assert!(DataLoader::load_scenario(&[]).is_none());
    }
}
