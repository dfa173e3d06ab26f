//! Row files exported from the accounting database
//!
//! Rows are the output of [`crate::query::WLCG_QUERY`], either as a JSON array
//! of 12-element arrays or as CSV with a header row. Empty CSV cells and JSON
//! `null` are SQL nulls.

use crate::loader::{RawRow, ROW_ARITY};
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Row file encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RowFormat {
    Json,
    Csv,
}

impl RowFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(RowFormat::Json),
            "csv" => Some(RowFormat::Csv),
            _ => None,
        }
    }
}

/// Read a row file, inferring the format from the extension when not given
pub fn read_rows(path: &Path, format: Option<RowFormat>) -> Result<Vec<RawRow>> {
    let format = match format.or_else(|| RowFormat::from_path(path)) {
        Some(f) => f,
        None => bail!(
            "Cannot infer row format of {}; use --input-format json|csv",
            path.display()
        ),
    };

    let file = fs::File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let rows = match format {
        RowFormat::Json => parse_json_rows(file),
        RowFormat::Csv => parse_csv_rows(file),
    }
    .with_context(|| format!("Failed to read rows from {}", path.display()))?;

    tracing::debug!(rows = rows.len(), path = %path.display(), "Loaded row file");
    Ok(rows)
}

/// Parse a JSON array of rows
pub fn parse_json_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_reader(reader).context("Expected a JSON array of rows")?;

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let len = value.as_array().map(Vec::len);
            if len != Some(ROW_ARITY) {
                bail!(
                    "Row {}: expected an array of {} columns, got {}",
                    i + 1,
                    ROW_ARITY,
                    len.map_or_else(|| "a non-array".to_string(), |n| n.to_string())
                );
            }
            serde_json::from_value(value).with_context(|| format!("Row {}: invalid column value", i + 1))
        })
        .collect()
}

/// Parse CSV rows; the first line is a header and is skipped
pub fn parse_csv_rows<R: Read>(reader: R) -> Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Row {}: malformed CSV", i + 1))?;
        if record.len() != ROW_ARITY {
            bail!(
                "Row {}: expected {} columns, got {}",
                i + 1,
                ROW_ARITY,
                record.len()
            );
        }
        let row: RawRow = record
            .deserialize(None)
            .with_context(|| format!("Row {}: invalid column value", i + 1))?;
        rows.push(row);
    }
    Ok(rows)
}
