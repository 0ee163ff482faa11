//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{Aggregation, ForestMode, RandomForestConfig};
use crate::dataset::Dataset;
use crate::error::CartError;
use crate::split::RandomSubspace;
use crate::tree::{DecisionTree, grow};

/// A fitted Random Forest ensemble.
///
/// Trees are kept in build order. A forest always holds at least one tree.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ForestParts")]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) aggregation: Aggregation,
}

/// Serialized layout of [`RandomForest`], checked before use.
#[derive(serde::Deserialize)]
struct ForestParts {
    trees: Vec<DecisionTree>,
    n_features: usize,
    aggregation: Aggregation,
}

impl TryFrom<ForestParts> for RandomForest {
    type Error = CartError;

    fn try_from(parts: ForestParts) -> Result<Self, Self::Error> {
        if parts.trees.is_empty() {
            return Err(CartError::CorruptModel {
                reason: "forest has no trees".into(),
            });
        }
        if let Some(tree) = parts.trees.iter().find(|t| t.n_features() > parts.n_features) {
            return Err(CartError::CorruptModel {
                reason: format!(
                    "tree trained on {} features, forest declares {}",
                    tree.n_features(),
                    parts.n_features
                ),
            });
        }
        Ok(Self {
            trees: parts.trees,
            n_features: parts.n_features,
            aggregation: parts.aggregation,
        })
    }
}

impl RandomForest {
    /// Assemble a forest from already trained trees.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidTreeCount`] if `trees` is empty.
    pub fn from_trees(
        trees: Vec<DecisionTree>,
        aggregation: Aggregation,
    ) -> Result<Self, CartError> {
        let n_features = trees
            .iter()
            .map(DecisionTree::n_features)
            .max()
            .ok_or(CartError::InvalidTreeCount { n_trees: 0 })?;
        Ok(Self {
            trees,
            n_features,
            aggregation,
        })
    }
}

/// Number of rows drawn per tree: `round(ratio × n_rows)`, at least 1.
pub(crate) fn draw_count(n_rows: usize, ratio: f64) -> usize {
    ((n_rows as f64 * ratio).round() as usize).max(1)
}

/// Draw `draw_count` row indices uniformly with replacement.
pub(crate) fn bootstrap_sample(n_rows: usize, draw_count: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..draw_count).map(|_| rng.gen_range(0..n_rows)).collect()
}

/// Train the Random Forest ensemble.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_rows = dataset.n_rows()))]
pub(crate) fn train<R: Rng>(
    config: &RandomForestConfig,
    dataset: &Dataset,
    rng: &mut R,
) -> Result<RandomForest, CartError> {
    // --- Validate config ---
    config.tree.validate()?;
    let n_features = dataset.n_features();
    let feature_num = config.resolve_feature_num(n_features)?;
    if !(config.sample_ratio > 0.0 && config.sample_ratio <= 1.0) {
        return Err(CartError::InvalidSampleRatio {
            ratio: config.sample_ratio,
        });
    }

    let n_rows = dataset.n_rows();
    let draw_count = draw_count(n_rows, config.sample_ratio);

    info!(
        n_trees = config.n_trees,
        n_rows,
        n_features,
        feature_num,
        draw_count,
        mode = ?config.mode,
        "training random forest"
    );

    // Per-tree seeds are drawn up front so the build is independent of scheduling.
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| rng.r#gen()).collect();

    let mode = config.mode;
    let tree_config = &config.tree;

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .enumerate()
        .map(|(tree_index, seed)| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let tree = match mode {
                ForestMode::Bagging => {
                    let rows = bootstrap_sample(n_rows, draw_count, &mut rng);
                    let mut sampler = RandomSubspace::new(feature_num, rng);
                    grow(dataset, &rows, tree_config, &mut sampler)
                }
                ForestMode::Reference => {
                    let rows: Vec<usize> = (0..n_rows).collect();
                    let mut sampler = RandomSubspace::unrestricted(feature_num, rng);
                    grow(dataset, &rows, tree_config, &mut sampler)
                }
            };
            debug!(tree_index, n_nodes = tree.n_nodes(), depth = tree.depth(), "tree built");
            tree
        })
        .collect();

    info!(n_trees_trained = trees.len(), "random forest training complete");

    Ok(RandomForest {
        trees,
        n_features,
        aggregation: mode.aggregation(),
    })
}
