//! `resume_performances.csv` and its console rendering.

use crate::stats::SummaryRow;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

fn summary_frame(rows: &[SummaryRow]) -> PolarsResult<DataFrame> {
    let cells: Vec<[String; 7]> = rows.iter().map(SummaryRow::cells).collect();
    let columns = SummaryRow::HEADER
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values: Vec<&str> = cells.iter().map(|row| row[i].as_str()).collect();
            Column::new((*name).into(), values)
        })
        .collect();
    DataFrame::new(columns)
}

/// Write the rows with two-decimal numbers.
pub fn write_summary(rows: &[SummaryRow], path: &Path) -> PolarsResult<()> {
    let mut df = summary_frame(rows)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)
}

/// Right-aligned text table with the same cells as the CSV.
pub fn format_summary(rows: &[SummaryRow]) -> String {
    let cells: Vec<[String; 7]> = rows.iter().map(SummaryRow::cells).collect();
    let widths: Vec<usize> = SummaryRow::HEADER
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |row: &[&str]| -> String {
        row.iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:>w$}", cell, w = *w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut out = line(&SummaryRow::HEADER);
    out.push('\n');
    for row in &cells {
        let refs: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&line(&refs));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn rows() -> Vec<SummaryRow> {
        vec![
            SummaryRow {
                scenario: "density".to_string(),
                algorithm: "ADR-AVG".to_string(),
                pdr_mean: 85.0,
                pdr_std: 7.071,
                energy_mean: 3.0,
                energy_std: 1.4142,
                efficiency: 32.5,
            },
            SummaryRow {
                scenario: "density".to_string(),
                algorithm: "No-ADR".to_string(),
                pdr_mean: 70.0,
                pdr_std: f64::NAN,
                energy_mean: 1.0,
                energy_std: f64::NAN,
                efficiency: 70.0,
            },
        ]
    }

    #[test]
    fn csv_has_header_and_rounded_cells() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("resume_performances.csv");
        write_summary(&rows(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Scenario,Algorithm,PDR_mean,PDR_std,Energy_mean_mJ,Energy_std,Efficiency"
        );
        assert_eq!(lines[1], "density,ADR-AVG,85.00,7.07,3.00,1.41,32.50");
        assert_eq!(lines[2], "density,No-ADR,70.00,NaN,1.00,NaN,70.00");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn table_columns_line_up() {
        let table = format_summary(&rows());
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
        assert!(lines[0].starts_with("Scenario"));
        assert!(lines[2].ends_with("70.00"));
    }

    #[test]
    fn empty_rows_still_have_a_header() {
        assert_eq!(format_summary(&[]).lines().count(), 1);
    }
}
