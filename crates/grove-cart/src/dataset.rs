//! Validated labeled training data.

use crate::error::CartError;

/// An ordered set of rows, each holding feature values followed by a class label.
///
/// Row order is significant: split search breaks ties by the first
/// candidate it meets, so rows are never reordered.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    rows: Vec<Vec<f64>>,
    n_features: usize,
}

impl Dataset {
    /// Validate and wrap a row-major dataset whose last column is the label.
    ///
    /// # Errors
    ///
    /// | Variant                               | When                                   |
    /// |---------------------------------------|----------------------------------------|
    /// | [`CartError::EmptyDataset`]           | `rows` is empty                        |
    /// | [`CartError::RowTooShort`]            | a row has fewer than 2 values          |
    /// | [`CartError::InconsistentRowLength`]  | rows differ in length                  |
    /// | [`CartError::NonFiniteValue`]         | any value is NaN or infinite           |
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, CartError> {
        let Some(first) = rows.first() else {
            return Err(CartError::EmptyDataset);
        };
        let width = first.len();
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() < 2 {
                return Err(CartError::RowTooShort {
                    row_index,
                    len: row.len(),
                });
            }
            if row.len() != width {
                return Err(CartError::InconsistentRowLength {
                    expected: width,
                    got: row.len(),
                    row_index,
                });
            }
            if let Some(column) = row.iter().position(|v| !v.is_finite()) {
                return Err(CartError::NonFiniteValue { row_index, column });
            }
        }
        Ok(Self {
            rows,
            n_features: width - 1,
        })
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of feature columns (row length minus the label).
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// All rows, labels included.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// The class label of row `row`.
    #[must_use]
    pub fn label(&self, row: usize) -> f64 {
        self.rows[row][self.n_features]
    }

    /// The value of feature `feature` in row `row`.
    #[must_use]
    pub fn value(&self, row: usize, feature: usize) -> f64 {
        self.rows[row][feature]
    }

    /// Labels of every row, in row order.
    #[must_use]
    pub fn labels(&self) -> Vec<f64> {
        (0..self.n_rows()).map(|i| self.label(i)).collect()
    }

    /// Distinct labels across the whole dataset, in order of first appearance.
    #[must_use]
    pub fn classes(&self) -> Vec<f64> {
        let all: Vec<usize> = (0..self.n_rows()).collect();
        self.classes_of(&all)
    }

    /// Distinct labels among the given rows, in order of first appearance.
    #[must_use]
    pub fn classes_of(&self, rows: &[usize]) -> Vec<f64> {
        let mut classes: Vec<f64> = Vec::new();
        for &r in rows {
            let label = self.label(r);
            if !classes.contains(&label) {
                classes.push(label);
            }
        }
        classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_split_features_from_label() {
        let ds = Dataset::new(vec![vec![1.0, 2.0, 0.0], vec![3.0, 4.0, 1.0]]).unwrap();
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.label(1), 1.0);
        assert_eq!(ds.value(1, 0), 3.0);
        assert_eq!(ds.labels(), vec![0.0, 1.0]);
    }

    #[test]
    fn classes_keep_first_seen_order() {
        let ds = Dataset::new(vec![
            vec![1.0, 2.0],
            vec![1.0, 0.0],
            vec![1.0, 2.0],
            vec![1.0, 1.0],
        ])
        .unwrap();
        assert_eq!(ds.classes(), vec![2.0, 0.0, 1.0]);
        assert_eq!(ds.classes_of(&[3, 1]), vec![1.0, 0.0]);
    }

    #[test]
    fn empty_dataset_error() {
        let err = Dataset::new(vec![]).unwrap_err();
        assert!(matches!(err, CartError::EmptyDataset));
    }

    #[test]
    fn label_only_rows_rejected() {
        let err = Dataset::new(vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, CartError::RowTooShort { row_index: 0, len: 1 }));
    }

    #[test]
    fn inconsistent_row_length_error() {
        let err = Dataset::new(vec![vec![1.0, 2.0, 0.0], vec![3.0, 1.0]]).unwrap_err();
        assert!(matches!(
            err,
            CartError::InconsistentRowLength {
                expected: 3,
                got: 2,
                row_index: 1
            }
        ));
    }

    #[test]
    fn non_finite_value_error() {
        let err = Dataset::new(vec![vec![1.0, 0.0], vec![f64::INFINITY, 1.0]]).unwrap_err();
        assert!(matches!(
            err,
            CartError::NonFiniteValue {
                row_index: 1,
                column: 0
            }
        ));
    }
}
