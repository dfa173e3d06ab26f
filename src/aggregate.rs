//! Record aggregation: merging and field collapse
//!
//! Sums use null propagation: if any contributing record lacks a measure the
//! merged measure is missing too, so incomplete scaling coverage stays
//! visible downstream.

use crate::error::{PipelineError, Result};
use crate::record::{Field, Record, RecordKey};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::ops::Add;

fn sum_field<T: Add<Output = T>>(acc: Option<T>, value: Option<T>) -> Option<T> {
    Some(acc? + value?)
}

/// Add the measures of `other` into `acc`
fn absorb(acc: &mut Record, other: &Record) {
    acc.n_jobs = sum_field(acc.n_jobs, other.n_jobs);
    acc.cpu_time = sum_field(acc.cpu_time, other.cpu_time);
    acc.ksi2k_cpu_time = sum_field(acc.ksi2k_cpu_time, other.ksi2k_cpu_time);
    acc.wall_time = sum_field(acc.wall_time, other.wall_time);
    acc.ksi2k_wall_time = sum_field(acc.ksi2k_wall_time, other.ksi2k_wall_time);
}

/// Merge records assumed identical on their key fields.
///
/// The result carries the key fields of the first record and the summed
/// measures. Derived metrics are dropped since they no longer hold for the sum.
pub fn merge_records(records: &[Record]) -> Result<Record> {
    let (first, rest) = records.split_first().ok_or(PipelineError::EmptyMerge)?;

    let mut merged = first.clone();
    merged.derived = None;
    for record in rest {
        absorb(&mut merged, record);
    }

    Ok(merged)
}

/// Group records by key and merge each group.
///
/// Groups come out in ascending key order.
pub fn merge_by_key<I>(records: I) -> Vec<Record>
where
    I: IntoIterator<Item = Record>,
{
    let mut merged: BTreeMap<RecordKey, Record> = BTreeMap::new();
    for mut record in records {
        match merged.entry(record.key()) {
            Entry::Occupied(mut slot) => absorb(slot.get_mut(), &record),
            Entry::Vacant(slot) => {
                record.derived = None;
                slot.insert(record);
            }
        }
    }

    merged.into_values().collect()
}

/// Remove key fields from every record and sum records sharing the reduced key.
///
/// Fails before producing anything if a field is not a key field.
pub fn collapse_fields(records: &[Record], collapse: &[Field]) -> Result<Vec<Record>> {
    let keys = collapse
        .iter()
        .map(|f| f.as_key())
        .collect::<Result<Vec<_>>>()?;

    let reduced = records.iter().map(|rec| {
        let mut r = rec.clone();
        for field in &keys {
            r.remove_key(*field);
        }
        r
    });

    Ok(merge_by_key(reduced))
}

/// Combine several record sets, merging records that share a full key
pub fn merge_record_sets<I>(sets: I) -> Vec<Record>
where
    I: IntoIterator<Item = Vec<Record>>,
{
    merge_by_key(sets.into_iter().flatten())
}
