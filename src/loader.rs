//! Conversion of accounting query rows into records

use crate::record::{KeyField, Record};

/// One row of the WLCG accounting query, in column order:
/// `(year, month, host, vo_name, vo_group, vo_role, user,
///   n_jobs, cputime, walltime, cputime_scaled, walltime_scaled)`
pub type RawRow = (
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<u64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

/// Number of columns in a [`RawRow`]
pub const ROW_ARITY: usize = 12;

/// Convert a single row into a record
pub fn row_to_record(row: RawRow) -> Record {
    let (
        year,
        month,
        host,
        vo_name,
        vo_group,
        vo_role,
        user,
        n_jobs,
        cputime,
        walltime,
        cputime_scaled,
        walltime_scaled,
    ) = row;

    Record::new()
        .with_key(KeyField::Year, year)
        .with_key(KeyField::Month, month)
        .with_key(KeyField::Host, host)
        .with_key(KeyField::VoName, vo_name)
        .with_key(KeyField::VoGroup, vo_group)
        .with_key(KeyField::VoRole, vo_role)
        .with_key(KeyField::User, user)
        .with_measures(n_jobs, cputime, walltime)
        .with_scaled(cputime_scaled, walltime_scaled)
}

/// Convert rows into records, preserving order
pub fn rows_to_records<I>(rows: I) -> Vec<Record>
where
    I: IntoIterator<Item = RawRow>,
{
    rows.into_iter().map(row_to_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::KeyValue;

    fn row(host: &str, n_jobs: Option<u64>, scaled: Option<f64>) -> RawRow {
        (
            Some(2011),
            Some(3),
            Some(host.to_string()),
            Some("atlas".to_string()),
            None,
            None,
            Some("u1".to_string()),
            n_jobs,
            Some(100.0),
            Some(200.0),
            scaled,
            None,
        )
    }

    #[test]
    fn test_row_fields_map_to_record() {
        let rec = row_to_record(row("site-A", Some(5), Some(175.0)));

        assert_eq!(rec.year(), Some(2011));
        assert_eq!(rec.month(), Some(3));
        assert_eq!(rec.host(), Some("site-A"));
        assert_eq!(rec.vo_name(), Some("atlas"));
        assert_eq!(rec.get(KeyField::VoGroup), Some(&KeyValue::Null));
        assert_eq!(rec.user(), Some("u1"));
        assert_eq!(rec.n_jobs, Some(5));
        assert_eq!(rec.cpu_time, Some(100.0));
        assert_eq!(rec.wall_time, Some(200.0));
        assert_eq!(rec.ksi2k_cpu_time, Some(175.0));
        assert_eq!(rec.ksi2k_wall_time, None);
        assert!(!rec.has_key(KeyField::Tier));
        assert!(rec.derived.is_none());
    }

    #[test]
    fn test_null_numbers_stay_missing() {
        let rec = row_to_record(row("site-A", None, None));
        assert_eq!(rec.n_jobs, None);
        assert_eq!(rec.ksi2k_cpu_time, None);
    }

    #[test]
    fn test_order_and_length_preserved() {
        let records = rows_to_records(vec![
            row("a", Some(1), None),
            row("b", Some(2), None),
            row("c", Some(3), None),
        ]);

        let hosts: Vec<_> = records.iter().map(|r| r.host().unwrap()).collect();
        assert_eq!(hosts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(rows_to_records(Vec::new()).is_empty());
    }
}
