//! Accounting database query and reporting periods
//!
//! The query selects what is relevant for WLCG from the aggregated usage
//! table, repairs known VO identity issues and groups the data by
//! year/month/host/VO/user. Its output columns match [`crate::loader::RawRow`].
//! The rows still need scaling, tier mapping and aggregation afterwards.

use crate::error::{PipelineError, Result};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Parameterized accounting query; the two `%s` placeholders take the period
/// start and end.
pub const WLCG_QUERY: &str = r#"
SELECT
    extract(YEAR FROM execution_time)::integer AS year,
    extract(MONTH FROM execution_time)::integer AS month,
    machine_name,
    CASE WHEN vo_name IS NULL THEN
         CASE WHEN user_identity = '/C=SI/O=SiGNET/O=IJS/OU=F9/CN=Andrej Filipcic' THEN 'atlas'
              WHEN user_identity = 'aliprod' OR user_identity LIKE '/C=ch/O=AliEn/OU=ALICE/CN%%' THEN 'alice'
         END
         ELSE CASE WHEN vo_name = 'atlas.cern.ch' THEN 'atlas'
              ELSE vo_name
              END
    END AS vo_name,
    vo_group,
    vo_role,
    CASE WHEN user_identity LIKE '/C=ch/O=AliEn/OU=ALICE/CN%%' THEN 'aliprod'
         ELSE user_identity
    END AS user_identity,
    sum(n_jobs)   AS n_jobs,
    sum(cputime) AS cputime,
    sum(walltime) AS walltime,
    sum(cputime_scaled) as cputime_scaled,
    sum(walltime_scaled) as walltime_scaled
FROM
    uraggregated
WHERE
    execution_time >= %s AND
    execution_time <= %s AND
    ( vo_name   IN ('atlas', 'alice', 'cms') OR
      vo_issuer IN ('/DC=ch/DC=cern/OU=computers/CN=voms.cern.ch', '/DC=ch/DC=cern/OU=computers/CN=lcg-voms.cern.ch') OR
      user_identity IN ('aliprod', '/C=SI/O=SiGNET/O=IJS/OU=F9/CN=Andrej Filipcic') OR
      user_identity LIKE '/C=ch/O=AliEn/OU=ALICE/CN%%'
    )
GROUP BY
    year, month, machine_name, user_identity, vo_name, vo_group, vo_role
ORDER BY
    year, month, machine_name, user_identity, vo_name, vo_group, vo_role
;
"#;

/// A calendar month being reported on
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReportPeriod {
    start: NaiveDate,
}

impl ReportPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(|start| Self { start })
            .ok_or_else(|| PipelineError::InvalidReportPeriod(format!("{}-{:02}", year, month)))
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    /// First day of the month
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the month
    pub fn end(&self) -> NaiveDate {
        self.next_start().pred_opt().unwrap_or(self.start)
    }

    /// Number of days in the month
    pub fn days(&self) -> u32 {
        (self.next_start() - self.start).num_days() as u32
    }

    fn next_start(&self) -> NaiveDate {
        let (year, month) = if self.month() == 12 {
            (self.year() + 1, 1)
        } else {
            (self.year(), self.month() + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(self.start)
    }

    /// The accounting query with this period's bounds filled in
    pub fn render_query(&self) -> String {
        let start = format!("'{}'", self.start().format("%Y-%m-%d"));
        let end = format!("'{}'", self.end().format("%Y-%m-%d"));
        WLCG_QUERY
            .replacen("%s", &start, 1)
            .replacen("%s", &end, 1)
            .replace("%%", "%")
    }
}

impl FromStr for ReportPeriod {
    type Err = PipelineError;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || PipelineError::InvalidReportPeriod(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year(), self.month())
    }
}
