#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Tabular inputs of the region risk pipeline.
//!
//! Reads the demand log, occurrence log and HDI table from CSV into typed
//! records, and holds the rule tables (keyword sets, label rewrites) used
//! to select and canonicalize them. The rules are driven by
//! [`urban_risk_models::config`] so they can be tested without any
//! geometry.

pub mod parsing;
pub mod progress;
pub mod records;
pub mod rules;
pub mod table;

pub use records::{ComplaintRecord, HdiRecord, OccurrenceRecord};
pub use table::Table;

/// Errors that can occur while loading a tabular source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error (file read).
    #[error("I/O error reading '{table}': {source}")]
    Io {
        /// Table name (file name).
        table: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV parsing failed.
    #[error("CSV error in '{table}': {source}")]
    Csv {
        /// Table name (file name).
        table: String,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// A column the pipeline needs is not in the header row.
    #[error("Table '{table}' has no column '{column}' (found: {found})")]
    MissingColumn {
        /// Table name.
        table: String,
        /// Expected column.
        column: String,
        /// Comma-separated header row actually found.
        found: String,
    },

    /// The table has no header row.
    #[error("Table '{table}' is empty")]
    Empty {
        /// Table name.
        table: String,
    },
}
