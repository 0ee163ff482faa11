use rand::Rng;

use crate::dataset::Dataset;
use crate::gini::gini_index;
use crate::node::{FeatureIndex, Impurity};

/// Chooses which feature columns a single split may consider.
pub trait FeatureSampler {
    /// Return candidate feature indices in ascending order.
    fn candidates(&mut self, n_features: usize) -> Vec<usize>;
}

/// Considers every feature at every split.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllFeatures;

impl FeatureSampler for AllFeatures {
    fn candidates(&mut self, n_features: usize) -> Vec<usize> {
        (0..n_features).collect()
    }
}

/// Draws `size` distinct features uniformly at random for every split.
#[derive(Debug)]
pub struct RandomSubspace<R> {
    size: usize,
    restrict: bool,
    rng: R,
}

impl<R: Rng> RandomSubspace<R> {
    /// Sample a fresh subspace of `size` features per split and search only it.
    pub fn new(size: usize, rng: R) -> Self {
        Self {
            size,
            restrict: true,
            rng,
        }
    }

    /// Draw the subspace as usual but still search every feature.
    ///
    /// Keeps the random stream identical to [`RandomSubspace::new`] while
    /// reproducing a forest whose splits are not actually restricted.
    pub fn unrestricted(size: usize, rng: R) -> Self {
        Self {
            size,
            restrict: false,
            rng,
        }
    }
}

impl<R: Rng> FeatureSampler for RandomSubspace<R> {
    fn candidates(&mut self, n_features: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n_features).collect();
        // Partial Fisher-Yates: shuffle only the first `take` positions.
        let take = self.size.min(n_features);
        for i in 0..take {
            let j = self.rng.gen_range(i..n_features);
            order.swap(i, j);
        }
        if !self.restrict {
            return (0..n_features).collect();
        }
        let mut selected = order[..take].to_vec();
        selected.sort_unstable();
        selected
    }
}

/// Best split found for a set of rows.
#[derive(Debug, Clone)]
pub struct SplitResult {
    /// Feature used for the split.
    pub feature: FeatureIndex,
    /// Rows with a value strictly below this go left.
    pub threshold: f64,
    /// Weighted Gini impurity of the partition.
    pub impurity: Impurity,
    /// Row indices going left, in input order.
    pub left: Vec<usize>,
    /// Row indices going right, in input order.
    pub right: Vec<usize>,
}

/// Partition `rows` on `feature` at `threshold`, preserving row order.
pub(crate) fn partition(
    dataset: &Dataset,
    rows: &[usize],
    feature: usize,
    threshold: f64,
    left: &mut Vec<usize>,
    right: &mut Vec<usize>,
) {
    left.clear();
    right.clear();
    for &r in rows {
        if dataset.value(r, feature) < threshold {
            left.push(r);
        } else {
            right.push(r);
        }
    }
}

/// Exhaustively search `features` for the split of `rows` with the lowest Gini.
///
/// Every row's value at every candidate feature is tried as a threshold.
/// Candidates are visited by ascending feature, then by row order, and a
/// later candidate replaces the best only when its impurity is strictly
/// lower, so the first of several equal candidates wins.
///
/// Returns `None` when `rows` or `features` is empty. A returned split may
/// still leave one side empty.
pub fn find_best_split(
    dataset: &Dataset,
    rows: &[usize],
    classes: &[f64],
    features: &[usize],
) -> Option<SplitResult> {
    if rows.is_empty() || features.is_empty() {
        return None;
    }

    let mut left = Vec::with_capacity(rows.len());
    let mut right = Vec::with_capacity(rows.len());
    let mut best: Option<SplitResult> = None;

    for &feature in features {
        for &candidate in rows {
            let threshold = dataset.value(candidate, feature);
            partition(dataset, rows, feature, threshold, &mut left, &mut right);
            let impurity = gini_index(dataset, &[left.as_slice(), right.as_slice()], classes);

            if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                best = Some(SplitResult {
                    feature: FeatureIndex::new(feature),
                    threshold,
                    impurity,
                    left: left.clone(),
                    right: right.clone(),
                });
            }
        }
    }

    best
}
