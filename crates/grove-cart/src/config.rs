//! Configuration builder for Random Forest training.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::dataset::Dataset;
use crate::error::CartError;
use crate::forest::RandomForest;
use crate::tree::DecisionTreeConfig;

/// How ensemble members are diversified and combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForestMode {
    /// Bootstrap rows per tree, search only the sampled features at each
    /// split, and combine trees by majority vote.
    #[default]
    Bagging,
    /// Train every tree on all rows, draw a feature sample per split without
    /// restricting the search to it, and combine trees by taking the largest
    /// predicted label.
    Reference,
}

impl ForestMode {
    /// Aggregation used by forests trained in this mode.
    #[must_use]
    pub fn aggregation(self) -> Aggregation {
        match self {
            ForestMode::Bagging => Aggregation::MajorityVote,
            ForestMode::Reference => Aggregation::Maximum,
        }
    }
}

/// How per-tree predictions become a single ensemble prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Aggregation {
    /// Most frequent label; ties go to the lowest label.
    MajorityVote,
    /// Numerically largest predicted label.
    Maximum,
}

/// Configuration for Random Forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter      | Default                                 |
/// |----------------|-----------------------------------------|
/// | `max_depth`    | 9                                       |
/// | `min_size`     | 1                                       |
/// | `feature_num`  | `None` (`floor(sqrt(n_features))`, ≥ 1) |
/// | `sample_ratio` | 1.0                                     |
/// | `seed`         | 42                                      |
/// | `mode`         | `Bagging`                               |
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) tree: DecisionTreeConfig,
    pub(crate) feature_num: Option<usize>,
    pub(crate) sample_ratio: f64,
    pub(crate) seed: u64,
    pub(crate) mode: ForestMode,
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, CartError> {
        if n_trees == 0 {
            return Err(CartError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            tree: DecisionTreeConfig::new(),
            feature_num: None,
            sample_ratio: 1.0,
            seed: 42,
            mode: ForestMode::Bagging,
        })
    }

    // --- Setters ---

    /// Set the maximum depth of every tree.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.tree = self.tree.with_max_depth(max_depth);
        self
    }

    /// Set the partition size at or below which a side becomes a leaf.
    #[must_use]
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.tree = self.tree.with_min_size(min_size);
        self
    }

    /// Set the number of features drawn for each split.
    #[must_use]
    pub fn with_feature_num(mut self, feature_num: usize) -> Self {
        self.feature_num = Some(feature_num);
        self
    }

    /// Set the fraction of rows drawn, with replacement, for each tree.
    #[must_use]
    pub fn with_sample_ratio(mut self, sample_ratio: f64) -> Self {
        self.sample_ratio = sample_ratio;
        self
    }

    /// Set the random seed used by [`RandomForestConfig::fit`].
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the forest mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ForestMode) -> Self {
        self.mode = mode;
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the per-tree configuration.
    #[must_use]
    pub fn tree_config(&self) -> &DecisionTreeConfig {
        &self.tree
    }

    /// Return the explicit subspace size, if set.
    #[must_use]
    pub fn feature_num(&self) -> Option<usize> {
        self.feature_num
    }

    /// Return the bootstrap sample ratio.
    #[must_use]
    pub fn sample_ratio(&self) -> f64 {
        self.sample_ratio
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the forest mode.
    #[must_use]
    pub fn mode(&self) -> ForestMode {
        self.mode
    }

    /// Resolve the subspace size for a dataset with `n_features` columns.
    pub(crate) fn resolve_feature_num(&self, n_features: usize) -> Result<usize, CartError> {
        let resolved = self
            .feature_num
            .unwrap_or_else(|| ((n_features as f64).sqrt().floor() as usize).max(1));
        if resolved == 0 || resolved > n_features {
            return Err(CartError::InvalidFeatureCount {
                feature_num: resolved,
                n_features,
            });
        }
        Ok(resolved)
    }

    /// Train a Random Forest with a generator seeded from [`RandomForestConfig::seed`].
    ///
    /// # Errors
    ///
    /// | Variant                               | When                                      |
    /// |---------------------------------------|-------------------------------------------|
    /// | [`CartError::InvalidMaxDepth`]        | `max_depth` is 0                          |
    /// | [`CartError::InvalidMinSize`]         | `min_size` is 0                           |
    /// | [`CartError::InvalidFeatureCount`]    | `feature_num` is outside [1, n_features]  |
    /// | [`CartError::InvalidSampleRatio`]     | `sample_ratio` is not in (0.0, 1.0]       |
    pub fn fit(&self, dataset: &Dataset) -> Result<RandomForest, CartError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.fit_with_rng(dataset, &mut rng)
    }

    /// Train a Random Forest, drawing per-tree seeds from `rng`.
    ///
    /// `rng` is only used on the calling thread; each tree gets its own
    /// generator, so the result does not depend on thread scheduling.
    ///
    /// # Errors
    ///
    /// Same as [`RandomForestConfig::fit`].
    pub fn fit_with_rng<R: Rng>(
        &self,
        dataset: &Dataset,
        rng: &mut R,
    ) -> Result<RandomForest, CartError> {
        crate::forest::train(self, dataset, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_trees_rejected() {
        assert!(matches!(
            RandomForestConfig::new(0),
            Err(CartError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn defaults() {
        let config = RandomForestConfig::new(10).unwrap();
        assert_eq!(config.n_trees(), 10);
        assert_eq!(config.tree_config().max_depth(), 9);
        assert_eq!(config.tree_config().min_size(), 1);
        assert_eq!(config.feature_num(), None);
        assert_eq!(config.sample_ratio(), 1.0);
        assert_eq!(config.seed(), 42);
        assert_eq!(config.mode(), ForestMode::Bagging);
    }

    #[test]
    fn feature_num_defaults_to_floor_sqrt() {
        let config = RandomForestConfig::new(1).unwrap();
        assert_eq!(config.resolve_feature_num(1).unwrap(), 1);
        assert_eq!(config.resolve_feature_num(2).unwrap(), 1);
        assert_eq!(config.resolve_feature_num(9).unwrap(), 3);
        assert_eq!(config.resolve_feature_num(15).unwrap(), 3);
    }

    #[test]
    fn feature_num_out_of_range() {
        let config = RandomForestConfig::new(1).unwrap().with_feature_num(3);
        assert!(matches!(
            config.resolve_feature_num(2),
            Err(CartError::InvalidFeatureCount {
                feature_num: 3,
                n_features: 2
            })
        ));
        let config = RandomForestConfig::new(1).unwrap().with_feature_num(0);
        assert!(config.resolve_feature_num(2).is_err());
    }

    #[test]
    fn modes_pick_aggregation() {
        assert_eq!(ForestMode::Bagging.aggregation(), Aggregation::MajorityVote);
        assert_eq!(ForestMode::Reference.aggregation(), Aggregation::Maximum);
    }
}
