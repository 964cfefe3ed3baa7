//! Whole-file CSV tables with case-insensitive column lookup.

use std::io::Read;
use std::path::Path;

use crate::SourceError;

/// An in-memory CSV table. Cells are trimmed; short rows are padded with
/// empty cells.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Reads a comma-separated file with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file cannot be opened, is not valid
    /// UTF-8 CSV, or has no header row.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );

        let file = std::fs::File::open(path).map_err(|source| SourceError::Io {
            table: name.clone(),
            source,
        })?;

        let table = Self::from_reader(&name, file)?;
        log::info!("Loaded table {name}: {} rows", table.rows.len());
        Ok(table)
    }

    /// Parses CSV text from any reader.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the input is not valid UTF-8 CSV or has
    /// no header row.
    pub fn from_reader<R: Read>(name: &str, reader: R) -> Result<Self, SourceError> {
        let csv_error = |source: csv::Error| SourceError::Csv {
            table: name.to_string(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_owned())
            .collect();

        if headers.iter().all(String::is_empty) {
            return Err(SourceError::Empty {
                table: name.to_string(),
            });
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(csv_error)?;
            let row = (0..headers.len())
                .map(|i| record.get(i).unwrap_or("").trim().to_owned())
                .collect();
            rows.push(row);
        }

        Ok(Self {
            name: name.to_string(),
            headers,
            rows,
        })
    }

    /// Table name used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column named `column`, compared case-insensitively
    /// after trimming.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::MissingColumn`] if no header matches.
    pub fn column(&self, column: &str) -> Result<usize, SourceError> {
        let wanted = column.trim().to_uppercase();
        self.headers
            .iter()
            .position(|h| h.to_uppercase() == wanted)
            .ok_or_else(|| SourceError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
                found: self.headers.join(", "),
            })
    }

    /// Iterates over data rows.
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_headers_and_cells() {
        let csv = " cidade , zona ,TIPO DA DEMANDA\nFortaleza , SER I,Coleta de lixo\n";
        let table = Table::from_reader("demandas", csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        let zone = table.column("ZONA").unwrap();
        let row = table.rows().next().unwrap();
        assert_eq!(row[zone], "SER I");
        assert_eq!(row[table.column("Cidade").unwrap()], "Fortaleza");
    }

    #[test]
    fn pads_short_rows() {
        let csv = "a,b,c\n1\n";
        let table = Table::from_reader("short", csv.as_bytes()).unwrap();
        let row = table.rows().next().unwrap();
        assert_eq!(row, ["1", "", ""]);
    }

    #[test]
    fn strips_byte_order_mark() {
        let csv = "\u{feff}Bairros,IDH\nCentro,\"0,7\"\n";
        let table = Table::from_reader("idh", csv.as_bytes()).unwrap();
        assert_eq!(table.column("Bairros").unwrap(), 0);
    }

    #[test]
    fn reports_missing_column_with_found_headers() {
        let table = Table::from_reader("t", "x,y\n".as_bytes()).unwrap();
        let err = table.column("z").unwrap_err();
        assert!(err.to_string().contains("x, y"), "{err}");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            Table::from_reader("empty", "".as_bytes()),
            Err(SourceError::Empty { .. })
        ));
    }
}
