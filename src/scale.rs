//! Normalized (KSI2K) time gap filling
//!
//! Sites that did not publish a benchmark value leave the scaled CPU and wall
//! times empty. Those gaps are filled with the raw time multiplied by a
//! default factor.

use crate::record::Record;
use std::collections::BTreeSet;

/// Hosts with at least one record lacking a normalized time.
///
/// Records without a host key (already collapsed) are skipped.
pub fn find_missing_scale_factors(records: &[Record]) -> BTreeSet<String> {
    records
        .iter()
        .filter(|r| r.missing_scaled_time())
        .filter_map(|r| r.host().map(str::to_string))
        .collect()
}

/// Fill missing normalized times with `raw * scale_factor`.
///
/// Populated values are left as they are. A missing raw time keeps the
/// normalized time missing.
pub fn add_missing_scale_values(records: Vec<Record>, scale_factor: f64) -> Vec<Record> {
    records
        .into_iter()
        .map(|r| fill_scaled(r, scale_factor))
        .collect()
}

fn fill_scaled(mut record: Record, scale_factor: f64) -> Record {
    if record.ksi2k_cpu_time.is_none() {
        record.ksi2k_cpu_time = record.cpu_time.map(|t| t * scale_factor);
    }
    if record.ksi2k_wall_time.is_none() {
        record.ksi2k_wall_time = record.wall_time.map(|t| t * scale_factor);
    }
    record
}
