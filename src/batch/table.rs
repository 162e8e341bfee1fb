//! Minimal tabular container for batch operations.

use std::path::Path;

use crate::error::{Error, Result};

/// Column-named rows of optional string cells.
///
/// Batch operations take a `Table` in and hand one back with the same row
/// ordering, minus discarded rows, plus any output columns.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Append a row, padded or truncated to the header width.
    pub fn push_row(&mut self, mut cells: Vec<Option<String>>) {
        cells.resize(self.headers.len(), None);
        self.rows.push(cells);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a named column.
    ///
    /// # Errors
    ///
    /// [`Error::MissingColumn`] — the only structural failure batch
    /// operations surface to the caller.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }

    /// Read a comma-separated file with a header row; empty cells become
    /// `None`.
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let mut table = Self::new(headers);
        for result in reader.records() {
            let record = result?;
            table.push_row(
                record
                    .iter()
                    .map(|cell| {
                        let cell = cell.trim();
                        (!cell.is_empty()).then(|| cell.to_string())
                    })
                    .collect(),
            );
        }
        Ok(table)
    }

    /// Write out with empty cells for `None`.
    pub fn write_csv_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn csv_round_trip_preserves_empty_cells() {
        let mut input = tempfile::NamedTempFile::new().unwrap();
        write!(input, "zip,n\n12065,0\n,1\n94043,\n").unwrap();

        let table = Table::from_csv_path(input.path()).unwrap();
        assert_eq!(table.headers(), ["zip", "n"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.cell(0, 0), Some("12065"));
        assert_eq!(table.cell(1, 0), None);
        assert_eq!(table.cell(2, 1), None);

        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.csv");
        table.write_csv_path(&out_path).unwrap();
        let round = Table::from_csv_path(&out_path).unwrap();
        assert_eq!(round.len(), 3);
        assert_eq!(round.cell(1, 0), None);
        assert_eq!(round.cell(2, 0), Some("94043"));
    }

    #[test]
    fn unknown_column_errors() {
        let table = Table::new(vec!["zip".into()]);
        assert!(matches!(
            table.column("state"),
            Err(Error::MissingColumn(_))
        ));
    }

    #[test]
    fn short_rows_are_padded() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        table.push_row(vec![Some("1".into())]);
        assert_eq!(table.cell(0, 1), None);
    }
}
