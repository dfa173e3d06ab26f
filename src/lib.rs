//! wlcgsgas - SGAS accounting data to WLCG accounting records
//!
//! This library turns rows from the SGAS accounting database into WLCG
//! accounting records: missing normalized times are filled in, records are
//! aggregated over chosen key fields, assigned and split across tiers, and
//! annotated with efficiency and machine-equivalent metrics.

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod error;
pub mod json_output;
pub mod loader;
pub mod metrics;
pub mod pipeline;
pub mod query;
pub mod record;
pub mod report;
pub mod scale;
pub mod source;
pub mod text_output;
pub mod tier;
