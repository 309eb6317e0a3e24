//! Stats module - Descriptive statistics and summary tables

mod calculator;

pub use calculator::{StatsCalculator, SummaryRow};
