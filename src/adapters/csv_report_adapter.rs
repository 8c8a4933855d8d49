//! CSV report files: the ranked table, one file per matched synergy combo and the
//! skipped-instrument list.

use crate::domain::error::ScreenerError;
use crate::domain::ranker::ResultTable;
use crate::domain::scan::ScanReport;
use crate::domain::strategy::StrategyFamily;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const RECOMMENDATIONS_FILE: &str = "recommendations.csv";
pub const SKIPPED_FILE: &str = "skipped.csv";

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct SkippedRow<'a> {
    code: &'a str,
    reason: String,
}

#[derive(Debug, Serialize)]
struct SynergyIndexRow<'a> {
    name: &'a str,
    strategies: String,
    description: &'a str,
    matches: usize,
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn synergy_file(name: &str) -> String {
        let safe: String = name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        format!("synergy_{}.csv", safe)
    }

    pub fn family_file(family: StrategyFamily) -> String {
        format!("family_{}.csv", family)
    }
}

fn csv_error(path: &Path, e: csv::Error) -> ScreenerError {
    ScreenerError::Io(std::io::Error::other(format!(
        "failed to write {}: {}",
        path.display(),
        e
    )))
}

fn write_table(path: &Path, table: &ResultTable) -> Result<(), ScreenerError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    wtr.write_record(&table.columns)
        .map_err(|e| csv_error(path, e))?;
    for row in &table.rows {
        wtr.write_record(row).map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ScreenerError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    for row in rows {
        wtr.serialize(row).map_err(|e| csv_error(path, e))?;
    }
    wtr.flush()?;
    Ok(())
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, report: &ScanReport) -> Result<(), ScreenerError> {
        fs::create_dir_all(&self.output_dir)?;

        write_table(&self.output_dir.join(RECOMMENDATIONS_FILE), &report.table())?;

        let index: Vec<SynergyIndexRow> = report
            .synergies
            .iter()
            .map(|m| SynergyIndexRow {
                name: &m.combo.name,
                strategies: m
                    .combo
                    .members
                    .iter()
                    .map(|id| id.number().to_string())
                    .collect::<Vec<_>>()
                    .join("+"),
                description: &m.combo.description,
                matches: m.recommendations.len(),
            })
            .collect();
        write_rows(&self.output_dir.join("synergies.csv"), &index)?;

        for (family, table) in report.family_tables() {
            write_table(&self.output_dir.join(Self::family_file(family)), &table)?;
        }

        for m in &report.synergies {
            let path = self.output_dir.join(Self::synergy_file(&m.combo.name));
            write_table(&path, &report.synergy_table(m))?;
        }

        let skipped: Vec<SkippedRow> = report
            .skipped
            .iter()
            .map(|s| SkippedRow {
                code: &s.code,
                reason: s.reason.to_string(),
            })
            .collect();
        write_rows(&self.output_dir.join(SKIPPED_FILE), &skipped)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synergy_file_names_are_sanitised() {
        assert_eq!(
            CsvReportAdapter::synergy_file("golden_cross_volume"),
            "synergy_golden_cross_volume.csv"
        );
        assert_eq!(CsvReportAdapter::synergy_file("a/b c"), "synergy_a_b_c.csv");
        assert_eq!(
            CsvReportAdapter::family_file(StrategyFamily::Pullback),
            "family_pullback.csv"
        );
    }

    #[test]
    fn writes_table_with_header() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        let table = ResultTable {
            columns: vec!["Code".into(), "Name".into()],
            rows: vec![vec!["005930".into(), "삼성전자".into()]],
        };
        write_table(&path, &table).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Code,Name\n005930,삼성전자\n");
    }
}
