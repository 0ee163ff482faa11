//! Prediction methods for the Random Forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::config::Aggregation;
use crate::error::CartError;
use crate::forest::RandomForest;
use crate::tree::DecisionTree;
use crate::vote::VoteTally;

/// Ensemble prediction together with the per-label vote counts.
#[derive(Debug, Clone)]
pub struct ForestVote {
    label: f64,
    tally: VoteTally,
}

impl ForestVote {
    /// Return the ensemble label.
    #[must_use]
    pub fn label(&self) -> f64 {
        self.label
    }

    /// Return the votes cast by the individual trees.
    #[must_use]
    pub fn tally(&self) -> &VoteTally {
        &self.tally
    }

    /// Fraction of trees that predicted the ensemble label.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        let total = self.tally.total();
        if total == 0 {
            return 0.0;
        }
        self.tally.count(self.label) as f64 / total as f64
    }
}

impl RandomForest {
    /// Predict the label for a single row.
    ///
    /// Combines the trees' predictions with the forest's [`Aggregation`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::RowTooShortForModel`] when the row does not reach
    /// every feature referenced by any tree.
    pub fn predict(&self, row: &[f64]) -> Result<f64, CartError> {
        Ok(self.predict_votes(row)?.label)
    }

    /// Predict a single row and keep the vote breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::RowTooShortForModel`] when the row is too short.
    pub fn predict_votes(&self, row: &[f64]) -> Result<ForestVote, CartError> {
        let required = self.required_row_len();
        if row.len() < required {
            return Err(CartError::RowTooShortForModel {
                required,
                got: row.len(),
            });
        }

        let tally = VoteTally::from_labels(self.trees.iter().map(|t| t.traverse(row)));
        // Tally is sorted by ascending label and a forest is never empty.
        let label = match self.aggregation {
            Aggregation::MajorityVote => tally.winner(),
            Aggregation::Maximum => tally.as_slice().last().map(|&(label, _)| label),
        }
        .unwrap_or_default();

        Ok(ForestVote { label, tally })
    }

    /// Predict labels for a batch of rows in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::RowTooShortForModel`] if any row is too short.
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, CartError> {
        rows.into_par_iter().map(|row| self.predict(row)).collect()
    }

    /// Minimum row length accepted by [`RandomForest::predict`].
    #[must_use]
    pub fn required_row_len(&self) -> usize {
        self.trees
            .iter()
            .map(DecisionTree::required_row_len)
            .max()
            .unwrap_or(0)
    }

    /// Borrow the trees in build order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Return the number of features this forest was trained on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Return the number of trees in the ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return how tree predictions are combined.
    #[must_use]
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }
}
