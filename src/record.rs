//! Canonical accounting record and field vocabulary
//!
//! A [`Record`] carries the usage of one aggregation unit for a reporting
//! period. Key fields live in an ordered map so that a collapsed field is
//! simply absent, while a field the accounting database delivered as NULL is
//! present with [`KeyValue::Null`].

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default factor for turning raw CPU/wall time into KSI2K normalized time
pub const DEFAULT_SCALE_FACTOR: f64 = 1.75;

/// Fields identifying an aggregation unit, in canonical declared order.
///
/// The derived `Ord` follows declaration order, which is what key extraction
/// relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyField {
    Year,
    Month,
    Tier,
    Host,
    VoName,
    VoGroup,
    VoRole,
    User,
}

/// All key fields in canonical order
pub const KEY_FIELDS: [KeyField; 8] = [
    KeyField::Year,
    KeyField::Month,
    KeyField::Tier,
    KeyField::Host,
    KeyField::VoName,
    KeyField::VoGroup,
    KeyField::VoRole,
    KeyField::User,
];

impl KeyField {
    pub fn name(self) -> &'static str {
        match self {
            KeyField::Year => "year",
            KeyField::Month => "month",
            KeyField::Tier => "tier",
            KeyField::Host => "host",
            KeyField::VoName => "vo_name",
            KeyField::VoGroup => "vo_group",
            KeyField::VoRole => "vo_role",
            KeyField::User => "user",
        }
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Measure fields summed by merges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureField {
    NJobs,
    CpuTime,
    WallTime,
    Ksi2kCpuTime,
    Ksi2kWallTime,
}

impl MeasureField {
    pub fn name(self) -> &'static str {
        match self {
            MeasureField::NJobs => "n_jobs",
            MeasureField::CpuTime => "cpu_time",
            MeasureField::WallTime => "wall_time",
            MeasureField::Ksi2kCpuTime => "ksi2k_cpu_time",
            MeasureField::Ksi2kWallTime => "ksi2k_wall_time",
        }
    }
}

/// Any named record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Key(KeyField),
    Measure(MeasureField),
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Key(k) => k.name(),
            Field::Measure(m) => m.name(),
        }
    }

    /// Narrow to a key field, failing for measures
    pub fn as_key(self) -> Result<KeyField> {
        match self {
            Field::Key(k) => Ok(k),
            Field::Measure(m) => Err(PipelineError::NotAKeyField(m.name().to_string())),
        }
    }
}

impl From<KeyField> for Field {
    fn from(field: KeyField) -> Self {
        Field::Key(field)
    }
}

impl From<MeasureField> for Field {
    fn from(field: MeasureField) -> Self {
        Field::Measure(field)
    }
}

impl FromStr for Field {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let field = match s.trim() {
            "year" => Field::Key(KeyField::Year),
            "month" => Field::Key(KeyField::Month),
            "tier" => Field::Key(KeyField::Tier),
            "host" => Field::Key(KeyField::Host),
            "vo_name" => Field::Key(KeyField::VoName),
            "vo_group" => Field::Key(KeyField::VoGroup),
            "vo_role" => Field::Key(KeyField::VoRole),
            "user" => Field::Key(KeyField::User),
            "n_jobs" => Field::Measure(MeasureField::NJobs),
            "cpu_time" => Field::Measure(MeasureField::CpuTime),
            "wall_time" => Field::Measure(MeasureField::WallTime),
            "ksi2k_cpu_time" => Field::Measure(MeasureField::Ksi2kCpuTime),
            "ksi2k_wall_time" => Field::Measure(MeasureField::Ksi2kWallTime),
            other => return Err(PipelineError::UnknownField(other.to_string())),
        };
        Ok(field)
    }
}

/// Value of a present key field.
///
/// Ordering puts `Null` first, then integers, then text, giving aggregation
/// output a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyValue {
    Null,
    Int(i64),
    Text(String),
}

impl KeyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            KeyValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, KeyValue::Null)
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Null => Ok(()),
            KeyValue::Int(i) => write!(f, "{}", i),
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        KeyValue::Int(v)
    }
}

impl From<i32> for KeyValue {
    fn from(v: i32) -> Self {
        KeyValue::Int(i64::from(v))
    }
}

impl From<u32> for KeyValue {
    fn from(v: u32) -> Self {
        KeyValue::Int(i64::from(v))
    }
}

impl From<&str> for KeyValue {
    fn from(v: &str) -> Self {
        KeyValue::Text(v.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(v: String) -> Self {
        KeyValue::Text(v)
    }
}

impl<T: Into<KeyValue>> From<Option<T>> for KeyValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(KeyValue::Null, Into::into)
    }
}

/// Projection of a record onto its present key fields, in canonical order
pub type RecordKey = Vec<(KeyField, KeyValue)>;

/// CPU/wall efficiency in percent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Efficiency {
    Percent(u64),
    /// Wall time below one unit, a ratio would be meaningless
    Undefined,
}

impl fmt::Display for Efficiency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Efficiency::Percent(p) => write!(f, "{}", p),
            Efficiency::Undefined => f.write_str("undefined"),
        }
    }
}

impl Serialize for Efficiency {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Efficiency::Percent(p) => serializer.serialize_u64(*p),
            Efficiency::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

/// Full-time machine equivalents over the reporting period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Equivalents {
    pub cpu: Option<u64>,
    pub wall: Option<u64>,
    pub ksi2k_cpu: Option<u64>,
    pub ksi2k_wall: Option<u64>,
}

/// Metrics attached at the end of the pipeline; not part of the key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedMetrics {
    pub efficiency: Efficiency,
    pub equivalents: Equivalents,
}

/// Usage of one aggregation unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    keys: BTreeMap<KeyField, KeyValue>,
    pub n_jobs: Option<u64>,
    pub cpu_time: Option<f64>,
    pub wall_time: Option<f64>,
    pub ksi2k_cpu_time: Option<f64>,
    pub ksi2k_wall_time: Option<f64>,
    pub derived: Option<DerivedMetrics>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style key setter
    pub fn with_key(mut self, field: KeyField, value: impl Into<KeyValue>) -> Self {
        self.set_key(field, value);
        self
    }

    pub fn with_measures(
        mut self,
        n_jobs: Option<u64>,
        cpu_time: Option<f64>,
        wall_time: Option<f64>,
    ) -> Self {
        self.n_jobs = n_jobs;
        self.cpu_time = cpu_time;
        self.wall_time = wall_time;
        self
    }

    pub fn with_scaled(mut self, ksi2k_cpu_time: Option<f64>, ksi2k_wall_time: Option<f64>) -> Self {
        self.ksi2k_cpu_time = ksi2k_cpu_time;
        self.ksi2k_wall_time = ksi2k_wall_time;
        self
    }

    pub fn set_key(&mut self, field: KeyField, value: impl Into<KeyValue>) {
        self.keys.insert(field, value.into());
    }

    /// Drop a key field entirely, returning its previous value
    pub fn remove_key(&mut self, field: KeyField) -> Option<KeyValue> {
        self.keys.remove(&field)
    }

    pub fn get(&self, field: KeyField) -> Option<&KeyValue> {
        self.keys.get(&field)
    }

    pub fn has_key(&self, field: KeyField) -> bool {
        self.keys.contains_key(&field)
    }

    /// Present key fields in canonical order
    pub fn key(&self) -> RecordKey {
        KEY_FIELDS
            .iter()
            .filter_map(|f| self.keys.get(f).map(|v| (*f, v.clone())))
            .collect()
    }

    /// Present key fields without cloning
    pub fn key_fields(&self) -> impl Iterator<Item = (KeyField, &KeyValue)> {
        self.keys.iter().map(|(f, v)| (*f, v))
    }

    pub fn year(&self) -> Option<i64> {
        self.get(KeyField::Year).and_then(KeyValue::as_int)
    }

    pub fn month(&self) -> Option<i64> {
        self.get(KeyField::Month).and_then(KeyValue::as_int)
    }

    pub fn tier(&self) -> Option<&str> {
        self.get(KeyField::Tier).and_then(KeyValue::as_str)
    }

    pub fn host(&self) -> Option<&str> {
        self.get(KeyField::Host).and_then(KeyValue::as_str)
    }

    pub fn vo_name(&self) -> Option<&str> {
        self.get(KeyField::VoName).and_then(KeyValue::as_str)
    }

    pub fn user(&self) -> Option<&str> {
        self.get(KeyField::User).and_then(KeyValue::as_str)
    }

    /// True when either normalized time is missing
    pub fn missing_scaled_time(&self) -> bool {
        self.ksi2k_cpu_time.is_none() || self.ksi2k_wall_time.is_none()
    }
}
