//! Union-of-keys table formatter and CSV rendering
//!
//! Records with heterogeneous keys are reduced to a rectangular table: the
//! declared prefix columns come first in declared order, followed by the
//! sorted union of every other key present in any row. Absent cells are
//! rendered as the empty string, so every row is exactly as wide as the
//! header.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::record::Row;

/// Errors rendering a table
#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to flush CSV output: {0}")]
    Io(#[from] std::io::Error),
}

/// Rectangular table with a header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from rows with possibly different key sets
    pub fn build(prefix: &[&str], rows: &[Row]) -> Self {
        let remaining: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .filter(|key| !prefix.contains(key))
            .collect();

        let header: Vec<String> = prefix
            .iter()
            .copied()
            .chain(remaining)
            .map(str::to_string)
            .collect();

        let rows = rows
            .iter()
            .map(|row| {
                header
                    .iter()
                    .map(|key| row.get(key).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();

        Self { header, rows }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// True when there are no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render header and rows as CSV
    pub fn to_csv(&self) -> Result<Vec<u8>, TableError> {
        let mut buf = Vec::new();
        {
            let mut wtr = csv::Writer::from_writer(&mut buf);
            wtr.write_record(&self.header)?;
            for row in &self.rows {
                wtr.write_record(row)?;
            }
            wtr.flush()?;
        }
        Ok(buf)
    }
}
