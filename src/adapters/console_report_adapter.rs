//! Plain-text report written to stdout.

use crate::domain::display::{display_width, pad_to};
use crate::domain::error::ScreenerError;
use crate::domain::ranker::ResultTable;
use crate::domain::scan::ScanReport;
use crate::ports::report_port::ReportPort;
use std::fmt::Write as _;
use std::io::Write;

pub struct ConsoleReportAdapter {
    /// Also list skipped instruments with their reasons.
    pub show_skipped: bool,
}

impl ConsoleReportAdapter {
    pub fn new(show_skipped: bool) -> Self {
        Self { show_skipped }
    }
}

/// Render `table` with columns padded to their widest cell.
pub fn render_table(table: &ResultTable) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| display_width(c)).collect();
    for row in &table.rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(display_width(cell));
        }
    }

    let render_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| pad_to(cell, w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&render_row(table.columns.as_slice()));
    out.push('\n');
    let rule_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule_width));
    out.push('\n');
    for row in &table.rows {
        out.push_str(&render_row(row.as_slice()));
        out.push('\n');
    }
    out
}

pub fn render_report(report: &ScanReport, show_skipped: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Scan {} ({}): {} scanned, {} recommended, {} skipped{}",
        report.as_of,
        report.strategy_set,
        report.scanned,
        report.recommendations.len(),
        report.skipped.len(),
        if report.cancelled { ", cancelled" } else { "" }
    );
    out.push('\n');

    if report.recommendations.is_empty() {
        out.push_str("No instrument satisfied any strategy.\n");
    } else {
        out.push_str(&render_table(&report.table()));
        for (family, table) in report.family_tables() {
            if table.rows.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n[{} strategies]", family);
            out.push_str(&render_table(&table));
        }
    }

    for m in &report.synergies {
        if m.recommendations.is_empty() {
            continue;
        }
        let members: Vec<String> = m.combo.members.iter().map(|id| id.number().to_string()).collect();
        let _ = writeln!(
            out,
            "\n[{}] strategies {}: {}",
            m.combo.name,
            members.join("+"),
            m.combo.description
        );
        out.push_str(&render_table(&report.synergy_table(m)));
    }

    if show_skipped && !report.skipped.is_empty() {
        out.push_str("\nSkipped:\n");
        for s in &report.skipped {
            let _ = writeln!(out, "  {}: {}", s.code, s.reason);
        }
    }
    out
}

impl ReportPort for ConsoleReportAdapter {
    fn write(&self, report: &ScanReport) -> Result<(), ScreenerError> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(render_report(report, self.show_skipped).as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_columns_align() {
        let table = ResultTable {
            columns: vec!["Code".into(), "Name".into()],
            rows: vec![
                vec!["005930".into(), "삼성전자".into()],
                vec!["A".into(), "B".into()],
            ],
        };
        let text = render_table(&table);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Code    Name");
        assert_eq!(lines[2], "005930  삼성전자");
        assert_eq!(lines[3], "A       B");
    }

    #[test]
    fn empty_table_still_has_header() {
        let table = ResultTable {
            columns: vec!["Code".into()],
            rows: vec![],
        };
        assert_eq!(render_table(&table), "Code\n----\n");
    }
}
