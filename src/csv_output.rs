//! CSV output format for accounting records
//!
//! Columns follow [`crate::report::columns`]; missing values and absent key
//! fields become empty cells.

use crate::record::Record;
use crate::report::{columns, Column};
use anyhow::{Context, Result};

/// CSV output formatter
#[derive(Debug)]
pub struct CsvOutput {
    columns: Vec<Column>,
    records: Vec<Record>,
}

impl CsvOutput {
    /// Create a formatter laid out for `records`
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            columns: columns(&records),
            records,
        }
    }

    fn header(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.header()).collect()
    }

    fn cells(&self, record: &Record) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.cell(record).unwrap_or_default())
            .collect()
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(self.header())?;
        for record in &self.records {
            writer.write_record(self.cells(record))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e.error()))?;
        String::from_utf8(bytes).context("CSV output is not valid UTF-8")
    }
}
