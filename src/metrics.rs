//! Efficiency and machine-equivalent metrics
//!
//! Computed last, from aggregated sums. Equivalents divide a time measure by
//! the number of hours in the reporting period.

use crate::error::{PipelineError, Result};
use crate::record::{DerivedMetrics, Efficiency, Equivalents, Record};

/// CPU time over wall time as an integer percentage
pub fn efficiency(record: &Record) -> Efficiency {
    match (record.cpu_time, record.wall_time) {
        (Some(cpu), Some(wall)) if wall >= 1.0 => {
            Efficiency::Percent((100.0 * cpu / wall).floor() as u64)
        }
        _ => Efficiency::Undefined,
    }
}

/// Full-time machines implied by each measure over `days` days
pub fn equivalents(record: &Record, days: u32) -> Result<Equivalents> {
    if days == 0 {
        return Err(PipelineError::InvalidPeriod(0));
    }
    let divisor = 24.0 * f64::from(days);
    let equiv = |v: Option<f64>| v.map(|t| (t / divisor).floor() as u64);

    Ok(Equivalents {
        cpu: equiv(record.cpu_time),
        wall: equiv(record.wall_time),
        ksi2k_cpu: equiv(record.ksi2k_cpu_time),
        ksi2k_wall: equiv(record.ksi2k_wall_time),
    })
}

/// Attach efficiency and equivalents to every record
pub fn add_derived_metrics(records: Vec<Record>, days: u32) -> Result<Vec<Record>> {
    records
        .into_iter()
        .map(|mut r| {
            r.derived = Some(DerivedMetrics {
                efficiency: efficiency(&r),
                equivalents: equivalents(&r, days)?,
            });
            Ok(r)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(cpu: Option<f64>, wall: Option<f64>) -> Record {
        Record::new().with_measures(Some(1), cpu, wall)
    }

    #[test]
    fn test_efficiency_floor() {
        assert_eq!(
            efficiency(&rec(Some(150.0), Some(300.0))),
            Efficiency::Percent(50)
        );
        assert_eq!(efficiency(&rec(Some(2.0), Some(3.0))), Efficiency::Percent(66));
    }

    #[test]
    fn test_efficiency_can_exceed_hundred() {
        assert_eq!(efficiency(&rec(Some(8.0), Some(4.0))), Efficiency::Percent(200));
    }

    #[test]
    fn test_efficiency_undefined_for_tiny_wall_time() {
        assert_eq!(efficiency(&rec(Some(5.0), Some(0.0))), Efficiency::Undefined);
        assert_eq!(efficiency(&rec(Some(5.0), Some(0.5))), Efficiency::Undefined);
        assert_eq!(efficiency(&rec(Some(5.0), None)), Efficiency::Undefined);
        assert_eq!(efficiency(&rec(None, Some(10.0))), Efficiency::Undefined);
    }

    #[test]
    fn test_efficiency_at_wall_time_one() {
        assert_eq!(efficiency(&rec(Some(1.0), Some(1.0))), Efficiency::Percent(100));
    }

    #[test]
    fn test_equivalents() {
        // 30 days = 720 hours
        let r = rec(Some(1500.0), Some(7200.0)).with_scaled(Some(2625.0), None);
        let eq = equivalents(&r, 30).unwrap();

        assert_eq!(eq.cpu, Some(2));
        assert_eq!(eq.wall, Some(10));
        assert_eq!(eq.ksi2k_cpu, Some(3));
        assert_eq!(eq.ksi2k_wall, None);
    }

    #[test]
    fn test_equivalents_zero_days_rejected() {
        assert_eq!(
            equivalents(&rec(Some(1.0), Some(1.0)), 0),
            Err(PipelineError::InvalidPeriod(0))
        );
    }

    #[test]
    fn test_add_derived_metrics() {
        let out = add_derived_metrics(vec![rec(Some(720.0), Some(1440.0))], 1).unwrap();
        let derived = out[0].derived.unwrap();
        assert_eq!(derived.efficiency, Efficiency::Percent(50));
        assert_eq!(derived.equivalents.cpu, Some(30));
        assert_eq!(derived.equivalents.wall, Some(60));
    }
}
