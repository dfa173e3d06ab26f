//! Record transformation pipeline
//!
//! Runs the stages in order: load rows, fill missing normalized times,
//! collapse key fields, split across tiers, re-merge and attach derived
//! metrics. Each stage consumes the previous stage's records and returns new
//! ones.

use crate::aggregate::{collapse_fields, merge_by_key};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::loader::{rows_to_records, RawRow};
use crate::metrics::add_derived_metrics;
use crate::query::ReportPeriod;
use crate::record::{Field, Record};
use crate::scale::{add_missing_scale_values, find_missing_scale_factors};
use crate::tier::TierSplitter;
use std::collections::BTreeSet;

/// Pipeline output handed to a report formatter
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub records: Vec<Record>,
    /// Hosts that needed the default scale factor
    pub missing_scale_hosts: BTreeSet<String>,
    /// Period length used for equivalents
    pub equivalence_days: u32,
}

/// Configured pipeline, reusable across batches
#[derive(Debug, Clone)]
pub struct Pipeline {
    scale_factor: f64,
    collapse: Vec<Field>,
    splitter: Option<TierSplitter>,
    equivalence_days: Option<u32>,
    period: Option<ReportPeriod>,
}

impl Pipeline {
    /// Build from a configuration, validating it first
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            scale_factor: config.scale_factor,
            collapse: config.collapse_fields()?,
            splitter: config.tiers.as_ref().map(|t| t.splitter()),
            equivalence_days: config.equivalence_days,
            period: None,
        })
    }

    /// Reporting period used to derive the equivalence period length when
    /// none is configured
    pub fn with_period(mut self, period: ReportPeriod) -> Self {
        self.period = Some(period);
        self
    }

    /// Load rows and run every stage
    pub fn run(&self, rows: Vec<RawRow>) -> Result<PipelineReport> {
        let records = rows_to_records(rows);
        tracing::info!(records = records.len(), "Loaded accounting rows");
        self.run_records(records)
    }

    /// Run every stage on already loaded records
    pub fn run_records(&self, records: Vec<Record>) -> Result<PipelineReport> {
        // Collapse may drop year or month, so read the period first
        let months: BTreeSet<(Option<i64>, Option<i64>)> =
            records.iter().map(|r| (r.year(), r.month())).collect();

        let missing_scale_hosts = find_missing_scale_factors(&records);
        for host in &missing_scale_hosts {
            tracing::warn!(
                host = host.as_str(),
                factor = self.scale_factor,
                "Missing scale factor, using default"
            );
        }
        let records = add_missing_scale_values(records, self.scale_factor);

        let records = collapse_fields(&records, &self.collapse)?;
        tracing::info!(
            records = records.len(),
            collapsed = ?self.collapse.iter().map(|f| f.name()).collect::<Vec<_>>(),
            "Aggregated records"
        );

        let records = match &self.splitter {
            Some(splitter) => {
                let split = splitter.split(&records);
                tracing::info!(records = split.len(), "Assigned tiers");
                split
            }
            None => records,
        };
        let records = merge_by_key(records);

        let days = self.resolve_days(&months)?;
        let records = add_derived_metrics(records, days)?;
        tracing::info!(records = records.len(), days, "Computed derived metrics");

        Ok(PipelineReport {
            records,
            missing_scale_hosts,
            equivalence_days: days,
        })
    }

    /// Configured days, else the report period, else the single month in the data
    fn resolve_days(&self, months: &BTreeSet<(Option<i64>, Option<i64>)>) -> Result<u32> {
        if let Some(days) = self.equivalence_days {
            return Ok(days);
        }
        if let Some(period) = self.period {
            return Ok(period.days());
        }

        match months.iter().collect::<Vec<_>>().as_slice() {
            [(Some(year), Some(month))] => {
                let year = i32::try_from(*year)
                    .map_err(|_| PipelineError::InvalidReportPeriod(year.to_string()))?;
                let month = u32::try_from(*month)
                    .map_err(|_| PipelineError::InvalidReportPeriod(month.to_string()))?;
                Ok(ReportPeriod::new(year, month)?.days())
            }
            [] => Ok(1),
            _ => Err(PipelineError::PeriodUnknown(
                "records do not share a single year and month; set equivalence_days".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TierConfig;
    use crate::record::{Efficiency, KeyField};
    use crate::tier::{FieldMatcher, ShareRule};
    use std::collections::BTreeMap;

    fn row(host: &str, user: &str, n_jobs: u64, cpu: f64, wall: f64) -> RawRow {
        (
            Some(2011),
            Some(3),
            Some(host.to_string()),
            Some("atlas".to_string()),
            None,
            None,
            Some(user.to_string()),
            Some(n_jobs),
            Some(cpu),
            Some(wall),
            None,
            None,
        )
    }

    #[test]
    fn test_end_to_end_merge() {
        let pipeline = Pipeline::new(&PipelineConfig::default()).unwrap();
        let report = pipeline
            .run(vec![
                row("site-A", "u1", 5, 100.0, 200.0),
                row("site-A", "u1", 7, 50.0, 100.0),
            ])
            .unwrap();

        assert_eq!(report.records.len(), 1);
        let r = &report.records[0];
        assert_eq!(r.n_jobs, Some(12));
        assert_eq!(r.cpu_time, Some(150.0));
        assert_eq!(r.wall_time, Some(300.0));
        assert_eq!(r.ksi2k_cpu_time, Some(262.5));
        assert_eq!(r.ksi2k_wall_time, Some(525.0));
        assert_eq!(
            report.missing_scale_hosts.into_iter().collect::<Vec<_>>(),
            vec!["site-A".to_string()]
        );
        assert_eq!(report.equivalence_days, 31);
        assert_eq!(r.derived.unwrap().efficiency, Efficiency::Percent(50));
    }

    #[test]
    fn test_collapse_then_tier_split() {
        let config = PipelineConfig {
            collapse: vec!["user".to_string()],
            equivalence_days: Some(30),
            tiers: Some(TierConfig {
                default_tier: "T1".to_string(),
                unmapped_tier: None,
                hosts: BTreeMap::from([("ce1".to_string(), "T2".to_string())]),
                share: vec![ShareRule::new(
                    FieldMatcher::new().with(KeyField::Host, "ce1"),
                    0.5,
                )],
            }),
            ..PipelineConfig::default()
        };

        let report = Pipeline::new(&config)
            .unwrap()
            .run(vec![
                row("ce1", "u1", 8, 800.0, 1000.0),
                row("ce1", "u2", 12, 1200.0, 1000.0),
                row("ce9", "u1", 3, 300.0, 300.0),
            ])
            .unwrap();

        assert_eq!(report.records.len(), 2);
        let t1 = &report.records[0];
        assert_eq!(t1.tier(), Some("T1"));
        assert_eq!(t1.n_jobs, Some(13));
        assert_eq!(t1.cpu_time, Some(1300.0));
        let t2 = &report.records[1];
        assert_eq!(t2.tier(), Some("T2"));
        assert_eq!(t2.n_jobs, Some(10));
        assert!(report.records.iter().all(|r| !r.has_key(KeyField::Host)));
        assert_eq!(report.equivalence_days, 30);
    }

    #[test]
    fn test_days_from_period() {
        let pipeline = Pipeline::new(&PipelineConfig::default())
            .unwrap()
            .with_period(ReportPeriod::new(2011, 2).unwrap());
        let report = pipeline.run(vec![row("a", "u", 1, 1.0, 1.0)]).unwrap();
        assert_eq!(report.equivalence_days, 28);
    }

    #[test]
    fn test_days_unknown_for_mixed_months() {
        let mut other = row("a", "u", 1, 1.0, 1.0);
        other.1 = Some(4);
        let err = Pipeline::new(&PipelineConfig::default())
            .unwrap()
            .run(vec![row("a", "u", 1, 1.0, 1.0), other])
            .unwrap_err();
        assert!(matches!(err, PipelineError::PeriodUnknown(_)));
    }

    #[test]
    fn test_days_from_data_before_month_collapse() {
        let config = PipelineConfig {
            collapse: vec!["month".to_string()],
            ..PipelineConfig::default()
        };
        let report = Pipeline::new(&config)
            .unwrap()
            .run(vec![row("a", "u", 1, 1.0, 1.0), row("b", "u", 2, 1.0, 1.0)])
            .unwrap();

        assert_eq!(report.equivalence_days, 31);
        assert!(report.records.iter().all(|r| r.month().is_none()));
    }

    #[test]
    fn test_empty_batch() {
        let report = Pipeline::new(&PipelineConfig::default())
            .unwrap()
            .run(Vec::new())
            .unwrap();
        assert!(report.records.is_empty());
        assert!(report.missing_scale_hosts.is_empty());
    }
}
