//! Column layout shared by the tabular report formats

use crate::record::{KeyField, Record, KEY_FIELDS};

/// A report column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Key(KeyField),
    NJobs,
    CpuTime,
    WallTime,
    Ksi2kCpuTime,
    Ksi2kWallTime,
    Efficiency,
    CpuEquivalents,
    WallEquivalents,
    Ksi2kCpuEquivalents,
    Ksi2kWallEquivalents,
}

const MEASURE_COLUMNS: [Column; 5] = [
    Column::NJobs,
    Column::CpuTime,
    Column::WallTime,
    Column::Ksi2kCpuTime,
    Column::Ksi2kWallTime,
];

const DERIVED_COLUMNS: [Column; 5] = [
    Column::Efficiency,
    Column::CpuEquivalents,
    Column::WallEquivalents,
    Column::Ksi2kCpuEquivalents,
    Column::Ksi2kWallEquivalents,
];

impl Column {
    pub fn header(self) -> &'static str {
        match self {
            Column::Key(k) => k.name(),
            Column::NJobs => "n_jobs",
            Column::CpuTime => "cpu_time",
            Column::WallTime => "wall_time",
            Column::Ksi2kCpuTime => "ksi2k_cpu_time",
            Column::Ksi2kWallTime => "ksi2k_wall_time",
            Column::Efficiency => "efficiency",
            Column::CpuEquivalents => "cpu_equivalents",
            Column::WallEquivalents => "wall_equivalents",
            Column::Ksi2kCpuEquivalents => "ksi2k_cpu_equivalents",
            Column::Ksi2kWallEquivalents => "ksi2k_wall_equivalents",
        }
    }

    /// Rendered cell, `None` for a missing value or an absent field
    pub fn cell(self, record: &Record) -> Option<String> {
        let equivalents = record.derived.map(|d| d.equivalents);
        match self {
            Column::Key(k) => record
                .get(k)
                .filter(|v| !v.is_null())
                .map(|v| v.to_string()),
            Column::NJobs => record.n_jobs.map(|n| n.to_string()),
            Column::CpuTime => record.cpu_time.map(format_time),
            Column::WallTime => record.wall_time.map(format_time),
            Column::Ksi2kCpuTime => record.ksi2k_cpu_time.map(format_time),
            Column::Ksi2kWallTime => record.ksi2k_wall_time.map(format_time),
            Column::Efficiency => record.derived.map(|d| d.efficiency.to_string()),
            Column::CpuEquivalents => equivalents.and_then(|e| e.cpu).map(|n| n.to_string()),
            Column::WallEquivalents => equivalents.and_then(|e| e.wall).map(|n| n.to_string()),
            Column::Ksi2kCpuEquivalents => {
                equivalents.and_then(|e| e.ksi2k_cpu).map(|n| n.to_string())
            }
            Column::Ksi2kWallEquivalents => {
                equivalents.and_then(|e| e.ksi2k_wall).map(|n| n.to_string())
            }
        }
    }
}

/// Times are printed with up to two decimals, trailing zeros trimmed
pub fn format_time(t: f64) -> String {
    let s = format!("{:.2}", t);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Columns for a record set: key fields present on any record, the measures,
/// and derived metrics when computed
pub fn columns(records: &[Record]) -> Vec<Column> {
    let mut cols: Vec<Column> = KEY_FIELDS
        .iter()
        .filter(|f| records.iter().any(|r| r.has_key(**f)))
        .map(|f| Column::Key(*f))
        .collect();
    cols.extend(MEASURE_COLUMNS);
    if records.iter().any(|r| r.derived.is_some()) {
        cols.extend(DERIVED_COLUMNS);
    }
    cols
}
