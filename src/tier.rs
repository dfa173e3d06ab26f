//! Host to tier assignment and proportional tier splitting
//!
//! Some hosts deliver resources to both a Tier-1 and a Tier-2 pledge. For
//! records matching a share rule the measures are divided between the default
//! (Tier-1) tier and the host's own tier. Assignment replaces the `host` key
//! with `tier`, so fragments from different hosts fold together afterwards.

use crate::aggregate::merge_by_key;
use crate::record::{KeyField, KeyValue, Record};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records with this many jobs or fewer are never split
pub const SPLIT_MIN_JOBS: u64 = 10;

/// Predicate over records, used to select share rules
pub trait RecordMatcher {
    fn matches(&self, record: &Record) -> bool;
}

/// Partial record: every listed field must be present with the given value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMatcher {
    fields: BTreeMap<KeyField, KeyValue>,
}

impl FieldMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: KeyField, value: impl Into<KeyValue>) -> Self {
        self.fields.insert(field, value.into());
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (KeyField, &KeyValue)> {
        self.fields.iter().map(|(f, v)| (*f, v))
    }
}

impl RecordMatcher for FieldMatcher {
    fn matches(&self, record: &Record) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| record.get(*field) == Some(expected))
    }
}

/// A matcher with the share of matching records that goes to the host's tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareRule {
    #[serde(rename = "match")]
    pub matcher: FieldMatcher,
    pub ratio: f64,
}

impl ShareRule {
    pub fn new(matcher: FieldMatcher, ratio: f64) -> Self {
        Self { matcher, ratio }
    }
}

/// Assigns tiers to host-level records and applies share rules
#[derive(Debug, Clone)]
pub struct TierSplitter {
    host_tiers: BTreeMap<String, String>,
    rules: Vec<ShareRule>,
    default_tier: String,
    unmapped_tier: String,
}

impl TierSplitter {
    /// Unmapped hosts fall back to `default_tier` unless
    /// [`with_unmapped_tier`](Self::with_unmapped_tier) says otherwise.
    pub fn new(
        host_tiers: BTreeMap<String, String>,
        rules: Vec<ShareRule>,
        default_tier: impl Into<String>,
    ) -> Self {
        let default_tier = default_tier.into();
        Self {
            host_tiers,
            rules,
            unmapped_tier: default_tier.clone(),
            default_tier,
        }
    }

    pub fn with_unmapped_tier(mut self, tier: impl Into<String>) -> Self {
        self.unmapped_tier = tier.into();
        self
    }

    /// Tier for a record's host, warning when no mapping exists
    pub fn host_tier(&self, record: &Record) -> &str {
        let host = record.host();
        match host.and_then(|h| self.host_tiers.get(h)) {
            Some(tier) => tier,
            None => {
                tracing::warn!(
                    host = host.unwrap_or("<none>"),
                    fallback = %self.unmapped_tier,
                    "No tier mapping for host, using fallback tier"
                );
                &self.unmapped_tier
            }
        }
    }

    /// First share rule matching the record
    pub fn share_ratio(&self, record: &Record) -> Option<f64> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(record))
            .map(|rule| rule.ratio)
    }

    /// Tier-assigned fragments of one record, before re-merging.
    ///
    /// Yields one fragment, or two when a split applies.
    pub fn split_record(&self, record: &Record) -> Vec<Record> {
        let tier = self.host_tier(record);

        let ratio = match (self.share_ratio(record), record.n_jobs) {
            (Some(ratio), Some(n_jobs)) if n_jobs > SPLIT_MIN_JOBS => ratio,
            _ => return vec![scale_to_tier(record, tier, 1.0)],
        };

        if ratio <= 0.0 {
            vec![scale_to_tier(record, &self.default_tier, 1.0)]
        } else if ratio >= 1.0 {
            vec![scale_to_tier(record, tier, 1.0)]
        } else {
            tracing::debug!(
                host = record.host().unwrap_or("<none>"),
                ratio,
                tier_1 = %self.default_tier,
                tier_2 = tier,
                "Splitting record between tiers"
            );
            vec![
                scale_to_tier(record, &self.default_tier, 1.0 - ratio),
                scale_to_tier(record, tier, ratio),
            ]
        }
    }

    /// Assign tiers to all records, splitting where rules apply, and merge
    /// fragments that end up with the same key.
    pub fn split(&self, records: &[Record]) -> Vec<Record> {
        let fragments: Vec<Record> = records.iter().flat_map(|r| self.split_record(r)).collect();
        let fragment_count = fragments.len();
        let merged = merge_by_key(fragments);

        tracing::debug!(
            input = records.len(),
            fragments = fragment_count,
            output = merged.len(),
            "Tier split complete"
        );
        merged
    }
}

/// Copy of `record` assigned to `tier` with all measures multiplied by `factor`.
///
/// The job count is truncated toward zero after multiplication.
pub fn scale_to_tier(record: &Record, tier: &str, factor: f64) -> Record {
    let mut r = record.clone();
    r.remove_key(KeyField::Host);
    r.set_key(KeyField::Tier, tier);
    r.n_jobs = record.n_jobs.map(|n| (n as f64 * factor) as u64);
    r.cpu_time = record.cpu_time.map(|t| t * factor);
    r.wall_time = record.wall_time.map(|t| t * factor);
    r.ksi2k_cpu_time = record.ksi2k_cpu_time.map(|t| t * factor);
    r.ksi2k_wall_time = record.ksi2k_wall_time.map(|t| t * factor);
    r.derived = None;
    r
}
