//! Data Processor Module
//! Filtering, grouping and pivoting of canonical summary tables.

use crate::data::columns::{format_value, ALG, PARAMETERS};
use polars::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

/// Tolerance for equality filters on parameter columns.
pub const FILTER_EPSILON: f64 = 1e-9;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("No tables to concatenate")]
    NothingToConcat,
}

/// Mean values laid out as `rows × columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub row_keys: Vec<f64>,
    pub col_keys: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty() || self.col_keys.is_empty()
    }

    pub fn get(&self, row: f64, col: &str) -> Option<f64> {
        let r = self.row_keys.iter().position(|k| *k == row)?;
        let c = self.col_keys.iter().position(|k| k == col)?;
        self.values[r][c]
    }
}

/// Handles data filtering and aggregation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Keep rows where every `(column, value)` pair matches.
    pub fn filter_eq(df: &DataFrame, conditions: &[(&str, f64)]) -> Result<DataFrame, ProcessorError> {
        let predicate = conditions
            .iter()
            .fold(lit(true), |acc, &(column, value)| {
                acc.and(
                    col(column)
                        .gt_eq(lit(value - FILTER_EPSILON))
                        .and(col(column).lt_eq(lit(value + FILTER_EPSILON))),
                )
            });

        let filtered = df.clone().lazy().filter(predicate).collect()?;
        Ok(filtered)
    }

    /// Rows of one algorithm.
    pub fn filter_alg(df: &DataFrame, alg: &str) -> Result<DataFrame, ProcessorError> {
        let filtered = df
            .clone()
            .lazy()
            .filter(col(ALG).eq(lit(alg)))
            .collect()?;
        Ok(filtered)
    }

    /// Mean of `metric` per distinct `by` value, ascending by key.
    /// Rows with a null key or null metric are ignored.
    pub fn grouped_mean(
        df: &DataFrame,
        by: &str,
        metric: &str,
    ) -> Result<Vec<(f64, f64)>, ProcessorError> {
        let grouped = df
            .clone()
            .lazy()
            .filter(col(by).is_not_null().and(col(metric).is_not_null()))
            .group_by([col(by)])
            .agg([col(metric).mean()])
            .collect()?;

        let keys = grouped.column(by)?.f64()?;
        let means = grouped.column(metric)?.f64()?;

        let mut points: Vec<(f64, f64)> = keys
            .into_iter()
            .zip(means.into_iter())
            .filter_map(|(k, m)| Some((k?, m?)))
            .collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(points)
    }

    /// Non-null values of a numeric column.
    pub fn values(df: &DataFrame, column: &str) -> Result<Vec<f64>, ProcessorError> {
        let values = df.column(column)?.f64()?.into_iter().flatten().collect();
        Ok(values)
    }

    /// `(x, y)` pairs of rows where both columns are non-null.
    pub fn paired_values(
        df: &DataFrame,
        x: &str,
        y: &str,
    ) -> Result<Vec<(f64, f64)>, ProcessorError> {
        let xs = df.column(x)?.f64()?;
        let ys = df.column(y)?.f64()?;
        let pairs = xs
            .into_iter()
            .zip(ys.into_iter())
            .filter_map(|(a, b)| Some((a?, b?)))
            .collect();
        Ok(pairs)
    }

    /// Distinct non-null values of a numeric column, ascending.
    pub fn unique_sorted(df: &DataFrame, column: &str) -> Result<Vec<f64>, ProcessorError> {
        let mut values = Self::values(df, column)?;
        values.sort_by(|a, b| a.total_cmp(b));
        values.dedup();
        Ok(values)
    }

    /// Algorithm labels in order of first appearance.
    pub fn algorithms(df: &DataFrame) -> Result<Vec<String>, ProcessorError> {
        let labels = df.column(ALG)?.as_materialized_series().str()?.clone();
        let mut seen: Vec<String> = Vec::new();
        for label in labels.into_iter().flatten() {
            if !seen.iter().any(|s| s == label) {
                seen.push(label.to_string());
            }
        }
        Ok(seen)
    }

    /// Labels from `preferred` that occur in `df`, followed by any others
    /// in order of first appearance.
    pub fn ordered_algorithms(
        df: &DataFrame,
        preferred: &[String],
    ) -> Result<Vec<String>, ProcessorError> {
        let present = Self::algorithms(df)?;
        let mut ordered: Vec<String> = preferred
            .iter()
            .filter(|p| present.contains(p))
            .cloned()
            .collect();
        ordered.extend(present.into_iter().filter(|p| !preferred.contains(p)));
        Ok(ordered)
    }

    /// Parameters with more than one distinct value, in canonical order.
    pub fn varying_parameters(df: &DataFrame) -> Result<Vec<&'static str>, ProcessorError> {
        let mut varying = Vec::new();
        for param in PARAMETERS {
            if Self::unique_sorted(df, param)?.len() > 1 {
                varying.push(param);
            }
        }
        Ok(varying)
    }

    /// Mean of `metric` for each `(index, columns)` pair.
    ///
    /// `columns` may be the algorithm column or a numeric parameter; numeric
    /// keys are rendered with [`format_value`].
    pub fn pivot_mean(
        df: &DataFrame,
        index: &str,
        columns: &str,
        metric: &str,
    ) -> Result<PivotTable, ProcessorError> {
        let row_keys = Self::unique_sorted(df, index)?;

        let col_subsets: Vec<(String, DataFrame)> = if columns == ALG {
            let mut algs = Self::algorithms(df)?;
            algs.sort();
            algs.into_iter()
                .map(|alg| Self::filter_alg(df, &alg).map(|sub| (alg, sub)))
                .collect::<Result<_, _>>()?
        } else {
            Self::unique_sorted(df, columns)?
                .into_iter()
                .map(|v| Self::filter_eq(df, &[(columns, v)]).map(|sub| (format_value(v), sub)))
                .collect::<Result<_, _>>()?
        };

        let mut values = vec![vec![None; col_subsets.len()]; row_keys.len()];
        let mut col_keys = Vec::with_capacity(col_subsets.len());

        for (c, (key, subset)) in col_subsets.iter().enumerate() {
            col_keys.push(key.clone());
            let means: HashMap<u64, f64> = Self::grouped_mean(subset, index, metric)?
                .into_iter()
                .map(|(k, m)| (k.to_bits(), m))
                .collect();
            for (r, row) in row_keys.iter().enumerate() {
                values[r][c] = means.get(&row.to_bits()).copied();
            }
        }

        Ok(PivotTable {
            row_keys,
            col_keys,
            values,
        })
    }

    /// Stack canonical tables.
    pub fn concat<'a, I>(frames: I) -> Result<DataFrame, ProcessorError>
    where
        I: IntoIterator<Item = &'a DataFrame>,
    {
        let mut iter = frames.into_iter();
        let mut stacked = iter.next().ok_or(ProcessorError::NothingToConcat)?.clone();
        for df in iter {
            stacked.vstack_mut(df)?;
        }
        Ok(stacked)
    }
}
