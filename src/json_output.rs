//! JSON output format for accounting records

use crate::pipeline::PipelineReport;
use crate::record::{Efficiency, Equivalents, KeyValue, Record};
use serde::Serialize;
use std::collections::BTreeMap;

/// A single output record
#[derive(Debug, Clone, Serialize)]
pub struct JsonRecord {
    /// Present key fields; collapsed fields are left out, SQL nulls kept
    #[serde(flatten)]
    pub keys: BTreeMap<&'static str, KeyValue>,
    pub n_jobs: Option<u64>,
    pub cpu_time: Option<f64>,
    pub wall_time: Option<f64>,
    pub ksi2k_cpu_time: Option<f64>,
    pub ksi2k_wall_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<Efficiency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equivalents: Option<Equivalents>,
}

impl From<&Record> for JsonRecord {
    fn from(record: &Record) -> Self {
        Self {
            keys: record
                .key_fields()
                .map(|(f, v)| (f.name(), v.clone()))
                .collect(),
            n_jobs: record.n_jobs,
            cpu_time: record.cpu_time,
            wall_time: record.wall_time,
            ksi2k_cpu_time: record.ksi2k_cpu_time,
            ksi2k_wall_time: record.ksi2k_wall_time,
            efficiency: record.derived.map(|d| d.efficiency),
            equivalents: record.derived.map(|d| d.equivalents),
        }
    }
}

/// Complete JSON report
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub equivalence_days: u32,
    pub missing_scale_factors: Vec<String>,
    pub records: Vec<JsonRecord>,
}

impl JsonOutput {
    pub fn new(report: &PipelineReport) -> Self {
        Self {
            equivalence_days: report.equivalence_days,
            missing_scale_factors: report.missing_scale_hosts.iter().cloned().collect(),
            records: report.records.iter().map(JsonRecord::from).collect(),
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
