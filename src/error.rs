//! Error types for the record pipeline

use crate::record::KeyField;
use thiserror::Error;

/// Errors raised by pipeline stages and configuration validation.
///
/// All variants are caller or configuration mistakes; none are retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Cannot collapse invalid field {0}: not a key field")]
    NotAKeyField(String),

    #[error("Unknown record field: {0}")]
    UnknownField(String),

    #[error("Cannot merge an empty record list")]
    EmptyMerge,

    #[error("Invalid tier share ratio {ratio} for rule {rule}: must be within [0, 1]")]
    InvalidRatio { rule: usize, ratio: f64 },

    #[error("Invalid scale factor {0}: must be a positive number")]
    InvalidScaleFactor(f64),

    #[error("Invalid equivalence period of {0} days: must be at least 1")]
    InvalidPeriod(i64),

    #[error("Invalid report period: {0}")]
    InvalidReportPeriod(String),

    #[error("Cannot determine equivalence period: {0}")]
    PeriodUnknown(String),

    #[error("Tier share rule {rule} matches on {field}, which is assigned by tier splitting")]
    RuleOnTierField { rule: usize, field: KeyField },
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
