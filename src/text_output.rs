//! Human-readable table output

use crate::pipeline::PipelineReport;
use crate::report::{columns, Column};

const MISSING: &str = "-";

/// Render the report as an aligned table with a totals line
pub fn render(report: &PipelineReport) -> String {
    let mut out = String::new();

    if report.records.is_empty() {
        out.push_str("No accounting records.\n");
        return out;
    }

    let cols = columns(&report.records);
    let rows: Vec<Vec<String>> = report
        .records
        .iter()
        .map(|r| {
            cols.iter()
                .map(|c| c.cell(r).unwrap_or_else(|| MISSING.to_string()))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = cols
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(c.header().len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    out.push_str(&format_line(cols.iter().map(|c| c.header()), &widths, &cols));
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("  "));
    out.push('\n');
    for row in &rows {
        out.push_str(&format_line(row.iter().map(String::as_str), &widths, &cols));
        out.push('\n');
    }

    let total_jobs: u64 = report.records.iter().filter_map(|r| r.n_jobs).sum();
    out.push_str(&format!(
        "\n{} records, {} jobs, equivalents over {} days\n",
        report.records.len(),
        total_jobs,
        report.equivalence_days
    ));

    out
}

fn format_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize], cols: &[Column]) -> String {
    cells
        .zip(widths)
        .zip(cols)
        .map(|((cell, w), col)| match col {
            Column::Key(_) => format!("{:<w$}", cell, w = *w),
            _ => format!("{:>w$}", cell, w = *w),
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Diagnostic lines for hosts lacking a scale factor
pub fn missing_scale_summary(report: &PipelineReport) -> Option<String> {
    if report.missing_scale_hosts.is_empty() {
        return None;
    }
    let hosts: Vec<&str> = report.missing_scale_hosts.iter().map(String::as_str).collect();
    Some(format!(
        "Missing scale factor for {} host(s): {}",
        hosts.len(),
        hosts.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::add_derived_metrics;
    use crate::record::{KeyField, Record};
    use std::collections::BTreeSet;

    fn report(records: Vec<Record>) -> PipelineReport {
        PipelineReport {
            records: add_derived_metrics(records, 31).unwrap(),
            missing_scale_hosts: BTreeSet::new(),
            equivalence_days: 31,
        }
    }

    #[test]
    fn test_render_table() {
        let text = render(&report(vec![
            Record::new()
                .with_key(KeyField::Tier, "NDGF-T1")
                .with_key(KeyField::VoName, "atlas")
                .with_measures(Some(12), Some(150.0), Some(300.0))
                .with_scaled(Some(262.5), Some(525.0)),
            Record::new()
                .with_key(KeyField::Tier, "T2")
                .with_key(KeyField::VoName, "alice")
                .with_measures(Some(3), Some(1.0), Some(0.0)),
        ]));

        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("tier     vo_name  n_jobs"));
        assert!(lines[1].starts_with("-------  -------"));
        assert!(lines[2].starts_with("NDGF-T1  atlas"));
        assert!(lines[2].contains("262.5"));
        assert!(lines[3].contains("undefined"));
        assert!(text.contains("2 records, 15 jobs, equivalents over 31 days"));
    }

    #[test]
    fn test_render_single_record_layout() {
        let text = render(&report(vec![Record::new()
            .with_key(KeyField::VoName, "atlas")
            .with_measures(Some(2), Some(10.0), None)]));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2].split_whitespace().take(4).collect::<Vec<_>>(), ["atlas", "2", "10", "-"]);
        assert_eq!(lines[3], "");
        assert!(text.ends_with("1 records, 2 jobs, equivalents over 31 days\n"));
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render(&report(Vec::new())), "No accounting records.\n");
    }

    #[test]
    fn test_missing_scale_summary() {
        let mut r = report(Vec::new());
        assert!(missing_scale_summary(&r).is_none());
        r.missing_scale_hosts = BTreeSet::from(["a".to_string(), "b".to_string()]);
        assert_eq!(
            missing_scale_summary(&r).unwrap(),
            "Missing scale factor for 2 host(s): a, b"
        );
    }
}
