//! Typed records read from the three tabular sources.

use urban_risk_models::config::{ComplaintColumns, HdiColumns, OccurrenceColumns};

use crate::parsing::{parse_count, parse_decimal_comma};
use crate::{SourceError, Table};

/// One service demand entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintRecord {
    /// City name as written in the log.
    pub city: String,
    /// Zone label, which carries the region code.
    pub zone: String,
    /// Free-text demand type.
    pub demand_type: String,
}

impl ComplaintRecord {
    /// Reads every row of the demand log.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingColumn`] if a configured column is
    /// absent.
    pub fn from_table(table: &Table, columns: &ComplaintColumns) -> Result<Vec<Self>, SourceError> {
        let city = table.column(&columns.city)?;
        let zone = table.column(&columns.zone)?;
        let demand_type = table.column(&columns.demand_type)?;

        Ok(table
            .rows()
            .map(|row| Self {
                city: row[city].clone(),
                zone: row[zone].clone(),
                demand_type: row[demand_type].clone(),
            })
            .collect())
    }
}

/// One logged occurrence row (a count per region and type).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccurrenceRecord {
    /// Region label as written in the log.
    pub region: String,
    /// Occurrence type.
    pub kind: String,
    /// Number of occurrences.
    pub count: u64,
}

impl OccurrenceRecord {
    /// Reads the occurrence log. Rows whose count is not a non-negative
    /// whole number are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingColumn`] if a configured column is
    /// absent.
    pub fn from_table(table: &Table, columns: &OccurrenceColumns) -> Result<Vec<Self>, SourceError> {
        let region = table.column(&columns.region)?;
        let kind = table.column(&columns.kind)?;
        let count = table.column(&columns.count)?;

        let mut records = Vec::with_capacity(table.len());
        let mut dropped = 0usize;

        for row in table.rows() {
            let Some(value) = parse_count(&row[count]) else {
                dropped += 1;
                continue;
            };
            records.push(Self {
                region: row[region].clone(),
                kind: row[kind].clone(),
                count: value,
            });
        }

        if dropped > 0 {
            log::warn!(
                "{}: dropped {dropped} rows with an unparseable '{}' value",
                table.name(),
                columns.count
            );
        }

        Ok(records)
    }
}

/// One neighborhood's human development index.
#[derive(Debug, Clone, PartialEq)]
pub struct HdiRecord {
    /// Neighborhood name, trimmed.
    pub neighborhood: String,
    /// HDI value.
    pub hdi: f64,
}

impl HdiRecord {
    /// Reads the HDI table, parsing decimal-comma values. Rows with a
    /// blank name or an unparseable value are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingColumn`] if a configured column is
    /// absent.
    pub fn from_table(table: &Table, columns: &HdiColumns) -> Result<Vec<Self>, SourceError> {
        let name = table.column(&columns.name)?;
        let value = table.column(&columns.value)?;

        let records: Vec<Self> = table
            .rows()
            .filter_map(|row| {
                let neighborhood = row[name].trim();
                if neighborhood.is_empty() {
                    return None;
                }
                Some(Self {
                    neighborhood: neighborhood.to_string(),
                    hdi: parse_decimal_comma(&row[value])?,
                })
            })
            .collect();

        let dropped = table.len() - records.len();
        if dropped > 0 {
            log::debug!("{}: dropped {dropped} rows without a valid HDI", table.name());
        }

        Ok(records)
    }
}
