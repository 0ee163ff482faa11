//! CSV dataset reader with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;

/// Reads a labeled numeric dataset from a CSV file.
///
/// Expected CSV format:
/// - Header row required; column names are not interpreted
/// - `x1,x2,...,xn,label`, every cell a finite float
/// - The last column is the class label
/// - All rows must have the same number of columns as the header
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
pub struct DatasetReader {
    path: PathBuf,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning its rows in file order.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Vec<Vec<f64>>, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so a short row reports InconsistentRowLength, not CsvParse.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.parse_error(e))?;
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        let mut rows = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.parse_error(e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let mut values = Vec::with_capacity(expected_cols);
            for (col_index, raw) in record.iter().enumerate() {
                match raw.parse::<f64>() {
                    Ok(value) if value.is_finite() => values.push(value),
                    _ => {
                        return Err(IoError::NonFiniteValue {
                            path: self.path.clone(),
                            row_index,
                            col_index,
                            raw: raw.to_string(),
                        });
                    }
                }
            }
            rows.push(values);
        }

        if rows.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(n_rows = rows.len(), n_columns = expected_cols, "dataset loaded");

        Ok(rows)
    }

    fn parse_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_valid_rows() {
        let f = write_csv("a,b,label\n1.0,2.0,0\n3.5,4.5,1\n");
        let rows = DatasetReader::new(f.path()).read().unwrap();
        assert_eq!(rows, vec![vec![1.0, 2.0, 0.0], vec![3.5, 4.5, 1.0]]);
    }

    #[test]
    fn row_order_preserved() {
        let f = write_csv("x,label\n9,1\n1,0\n5,1\n");
        let rows = DatasetReader::new(f.path()).read().unwrap();
        let firsts: Vec<f64> = rows.iter().map(|r| r[0]).collect();
        assert_eq!(firsts, vec![9.0, 1.0, 5.0]);
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let f = write_csv("x, label\n 1.25 , 2\n");
        let rows = DatasetReader::new(f.path()).read().unwrap();
        assert_eq!(rows, vec![vec![1.25, 2.0]]);
    }

    #[test]
    fn value_round_trip() {
        let f = write_csv("x,y,label\n1.23456789,9.87654321,0\n");
        let rows = DatasetReader::new(f.path()).read().unwrap();
        assert!((rows[0][0] - 1.23456789).abs() < 1e-12);
        assert!((rows[0][1] - 9.87654321).abs() < 1e-12);
    }

    #[test]
    fn error_file_not_found() {
        let result = DatasetReader::new(Path::new("/nonexistent/data.csv")).read();
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn error_empty_dataset() {
        let f = write_csv("x,label\n");
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(result, Err(IoError::EmptyDataset { .. })));
    }

    #[test]
    fn error_inconsistent_row_length() {
        let f = write_csv("x,y,label\n1,2,0\n1,2\n");
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(IoError::InconsistentRowLength {
                row_index: 1,
                expected: 3,
                got: 2,
                ..
            })
        ));
    }

    #[test]
    fn error_non_finite_nan() {
        let f = write_csv("x,label\nNaN,0\n");
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(IoError::NonFiniteValue {
                row_index: 0,
                col_index: 0,
                ..
            })
        ));
    }

    #[test]
    fn error_non_finite_inf() {
        let f = write_csv("x,label\n1.0,inf\n");
        let result = DatasetReader::new(f.path()).read();
        assert!(matches!(
            result,
            Err(IoError::NonFiniteValue { col_index: 1, .. })
        ));
    }

    #[test]
    fn error_unparseable_cell() {
        let f = write_csv("x,label\nabc,0\n");
        let result = DatasetReader::new(f.path()).read();
        match result {
            Err(IoError::NonFiniteValue { raw, .. }) => assert_eq!(raw, "abc"),
            other => panic!("expected NonFiniteValue, got {other:?}"),
        }
    }
}
