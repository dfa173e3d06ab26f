//! Pipeline configuration loaded from TOML
//!
//! # Example wlcgsgas.toml
//!
//! ```toml
//! scale_factor = 1.75
//! equivalence_days = 31
//! collapse = ["user"]
//!
//! [tiers]
//! default_tier = "NDGF-T1"
//!
//! [tiers.hosts]
//! "ce01.example.org" = "NO-NORGRID-T2"
//!
//! [[tiers.share]]
//! ratio = 0.4
//! match = { host = "ce01.example.org", vo_name = "atlas" }
//! ```

use crate::error::PipelineError;
use crate::record::{Field, KeyField, DEFAULT_SCALE_FACTOR};
use crate::tier::{ShareRule, TierSplitter};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn default_scale_factor() -> f64 {
    DEFAULT_SCALE_FACTOR
}

/// Root configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Factor for filling missing normalized times
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,

    /// Period length for equivalents; inferred from the data when unset
    #[serde(default)]
    pub equivalence_days: Option<u32>,

    /// Key fields removed before tier splitting
    #[serde(default)]
    pub collapse: Vec<String>,

    /// Tier mapping and share rules; tier splitting is skipped without it
    #[serde(default)]
    pub tiers: Option<TierConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scale_factor: default_scale_factor(),
            equivalence_days: None,
            collapse: Vec::new(),
            tiers: None,
        }
    }
}

/// Host to tier mapping with share rules
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    /// Tier receiving the remainder of split records
    pub default_tier: String,

    /// Tier for hosts missing from `hosts`; defaults to `default_tier`
    #[serde(default)]
    pub unmapped_tier: Option<String>,

    #[serde(default)]
    pub hosts: BTreeMap<String, String>,

    /// Evaluated in order, first match wins
    #[serde(default)]
    pub share: Vec<ShareRule>,
}

impl TierConfig {
    pub fn splitter(&self) -> TierSplitter {
        let splitter = TierSplitter::new(
            self.hosts.clone(),
            self.share.clone(),
            self.default_tier.clone(),
        );
        match &self.unmapped_tier {
            Some(tier) => splitter.with_unmapped_tier(tier.clone()),
            None => splitter,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Collapse fields parsed and checked to be key fields
    pub fn collapse_fields(&self) -> std::result::Result<Vec<Field>, PipelineError> {
        self.collapse
            .iter()
            .map(|name| {
                let field: Field = name.parse()?;
                field.as_key()?;
                Ok(field)
            })
            .collect()
    }

    pub fn validate(&self) -> std::result::Result<(), PipelineError> {
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(PipelineError::InvalidScaleFactor(self.scale_factor));
        }

        if self.equivalence_days == Some(0) {
            return Err(PipelineError::InvalidPeriod(0));
        }

        self.collapse_fields()?;

        if let Some(tiers) = &self.tiers {
            for (i, rule) in tiers.share.iter().enumerate() {
                if !(0.0..=1.0).contains(&rule.ratio) {
                    return Err(PipelineError::InvalidRatio {
                        rule: i,
                        ratio: rule.ratio,
                    });
                }
                if let Some((field, _)) = rule.matcher.fields().find(|(f, _)| *f == KeyField::Tier) {
                    return Err(PipelineError::RuleOnTierField { rule: i, field });
                }
            }
        }

        Ok(())
    }
}
