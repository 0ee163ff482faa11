use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::{
    CartError,
    dataset::Dataset,
    node::{Node, NodeIndex},
    split::{AllFeatures, FeatureSampler, find_best_split},
    vote::majority,
};

/// Configuration for a single CART decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter   | Default |
/// |-------------|---------|
/// | `max_depth` | 9       |
/// | `min_size`  | 1       |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) max_depth: usize,
    pub(crate) min_size: usize,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: 9,
            min_size: 1,
        }
    }

    /// Set the maximum tree depth.
    ///
    /// The root is depth 0; nodes at depth `max_depth` are always leaves.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the partition size at or below which a side becomes a leaf.
    #[must_use]
    pub fn with_min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    // --- Getters ---

    /// Return the maximum depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the minimum partition size that is still split further.
    #[must_use]
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub(crate) fn validate(&self) -> Result<(), CartError> {
        if self.max_depth < 1 {
            return Err(CartError::InvalidMaxDepth {
                max_depth: self.max_depth,
            });
        }
        if self.min_size < 1 {
            return Err(CartError::InvalidMinSize {
                min_size: self.min_size,
            });
        }
        Ok(())
    }

    /// Train a decision tree on every row of `dataset`.
    ///
    /// The build is deterministic: equal datasets and configs give equal trees.
    ///
    /// # Errors
    ///
    /// | Variant                         | When              |
    /// |---------------------------------|-------------------|
    /// | [`CartError::InvalidMaxDepth`]  | `max_depth` is 0  |
    /// | [`CartError::InvalidMinSize`]   | `min_size` is 0   |
    #[instrument(skip(self, dataset), fields(n_rows = dataset.n_rows()))]
    pub fn fit(&self, dataset: &Dataset) -> Result<DecisionTree, CartError> {
        self.validate()?;
        let rows: Vec<usize> = (0..dataset.n_rows()).collect();
        let tree = grow(dataset, &rows, self, &mut AllFeatures);
        debug!(
            n_nodes = tree.n_nodes(),
            depth = tree.depth(),
            "decision tree built"
        );
        Ok(tree)
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Grow a tree over `rows` (indices into `dataset`, repeats allowed).
///
/// Inputs are assumed validated; `rows` must be non-empty.
pub(crate) fn grow(
    dataset: &Dataset,
    rows: &[usize],
    config: &DecisionTreeConfig,
    sampler: &mut impl FeatureSampler,
) -> DecisionTree {
    debug_assert!(!rows.is_empty(), "cannot grow a tree from zero rows");
    let mut grower = Grower {
        dataset,
        config,
        sampler,
        arena: Vec::new(),
    };
    grower.grow_node(rows, 1);
    DecisionTree::from_arena(grower.arena, dataset.n_features())
}

struct Grower<'a, S> {
    dataset: &'a Dataset,
    config: &'a DecisionTreeConfig,
    sampler: &'a mut S,
    arena: Vec<Node>,
}

impl<S: FeatureSampler> Grower<'_, S> {
    /// Split `rows` and decide both children. `depth` is the depth of those children.
    fn grow_node(&mut self, rows: &[usize], depth: usize) -> NodeIndex {
        let classes = self.dataset.classes_of(rows);
        let features = self.sampler.candidates(self.dataset.n_features());
        let Some(split) = find_best_split(self.dataset, rows, &classes, &features) else {
            return self.push_leaf(rows);
        };

        // Arena pattern: reserve index, build children, then overwrite with the split.
        let node_idx = self.arena.len();
        self.arena.push(Node::Leaf {
            label: 0.0,
            n_samples: rows.len(),
        });

        let (left, right) = if split.left.is_empty() || split.right.is_empty() {
            let label = self.majority_of(rows);
            (
                self.push_labelled_leaf(label, split.left.len()),
                self.push_labelled_leaf(label, split.right.len()),
            )
        } else if depth >= self.config.max_depth {
            (self.push_leaf(&split.left), self.push_leaf(&split.right))
        } else {
            let left = self.grow_child(&split.left, depth);
            let right = self.grow_child(&split.right, depth);
            (left, right)
        };

        self.arena[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            n_samples: rows.len(),
        };
        NodeIndex::new(node_idx)
    }

    fn grow_child(&mut self, rows: &[usize], depth: usize) -> NodeIndex {
        if rows.len() <= self.config.min_size {
            self.push_leaf(rows)
        } else {
            self.grow_node(rows, depth + 1)
        }
    }

    fn majority_of(&self, rows: &[usize]) -> f64 {
        debug_assert!(!rows.is_empty());
        majority(rows.iter().map(|&r| self.dataset.label(r))).unwrap_or_default()
    }

    fn push_leaf(&mut self, rows: &[usize]) -> NodeIndex {
        let label = self.majority_of(rows);
        self.push_labelled_leaf(label, rows.len())
    }

    fn push_labelled_leaf(&mut self, label: f64, n_samples: usize) -> NodeIndex {
        let idx = self.arena.len();
        self.arena.push(Node::Leaf { label, n_samples });
        NodeIndex::new(idx)
    }
}

/// A fitted CART decision tree.
///
/// Stored as an arena-based `Vec<Node>` rooted at index 0, with every child
/// stored after its parent. Immutable once built. Deserialization re-runs
/// the structural checks of [`DecisionTree::from_nodes`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "TreeParts")]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) required_row_len: usize,
}

/// Serialized layout of [`DecisionTree`], checked before use.
#[derive(serde::Deserialize)]
struct TreeParts {
    nodes: Vec<Node>,
    n_features: usize,
    // Recomputed from the nodes.
    #[allow(dead_code)]
    required_row_len: usize,
}

impl TryFrom<TreeParts> for DecisionTree {
    type Error = CartError;

    fn try_from(parts: TreeParts) -> Result<Self, Self::Error> {
        Self::from_nodes(parts.nodes, parts.n_features)
    }
}

impl DecisionTree {
    /// Build a tree from an arena decoded from outside the process.
    ///
    /// The arena must be non-empty, every child index must point past its
    /// parent and inside the arena (which rules out cycles), every feature
    /// must be below `n_features`, and every value must be finite.
    pub(crate) fn from_nodes(nodes: Vec<Node>, n_features: usize) -> Result<Self, CartError> {
        if nodes.is_empty() {
            return Err(CartError::CorruptModel {
                reason: "tree has no nodes".into(),
            });
        }
        let n_nodes = nodes.len();
        for (idx, node) in nodes.iter().enumerate() {
            match node {
                Node::Leaf { label, .. } => {
                    if !label.is_finite() {
                        return Err(CartError::CorruptModel {
                            reason: format!("node {idx}: leaf label {label} is not finite"),
                        });
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    if feature.index() >= n_features {
                        return Err(CartError::CorruptModel {
                            reason: format!(
                                "node {idx}: feature {} out of range for {n_features} features",
                                feature.index()
                            ),
                        });
                    }
                    if !threshold.is_finite() {
                        return Err(CartError::CorruptModel {
                            reason: format!("node {idx}: threshold {threshold} is not finite"),
                        });
                    }
                    for child in [left.index(), right.index()] {
                        if child <= idx || child >= n_nodes {
                            return Err(CartError::CorruptModel {
                                reason: format!(
                                    "node {idx}: child {child} outside ({idx}, {n_nodes})"
                                ),
                            });
                        }
                    }
                }
            }
        }
        Ok(Self::from_arena(nodes, n_features))
    }

    pub(crate) fn from_arena(nodes: Vec<Node>, n_features: usize) -> Self {
        let required_row_len = nodes
            .iter()
            .filter_map(|n| match n {
                Node::Split { feature, .. } => Some(feature.index() + 1),
                Node::Leaf { .. } => None,
            })
            .max()
            .unwrap_or(0);
        Self {
            nodes,
            n_features,
            required_row_len,
        }
    }

    /// Predict the label for a single row.
    ///
    /// Traverses from the root: at each `Split`, goes left when
    /// `row[feature] < threshold`, right otherwise. The row may carry a
    /// trailing label; only its feature columns are read.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::RowTooShortForModel`] when the row does not
    /// reach every feature this tree references.
    pub fn predict(&self, row: &[f64]) -> Result<f64, CartError> {
        if row.len() < self.required_row_len {
            return Err(CartError::RowTooShortForModel {
                required: self.required_row_len,
                got: row.len(),
            });
        }
        Ok(self.traverse(row))
    }

    /// Predict labels for a batch of rows in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::RowTooShortForModel`] if any row is too short.
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, CartError> {
        rows.into_par_iter().map(|row| self.predict(row)).collect()
    }

    /// Walk from the root to a leaf. `row` must hold `required_row_len` values.
    pub(crate) fn traverse(&self, row: &[f64]) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { label, .. } => return *label,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if row[feature.index()] < *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    /// Borrow the node arena; the root is at index 0.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Borrow the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Return the number of feature columns in the training data.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Minimum row length accepted by [`DecisionTree::predict`].
    #[must_use]
    pub fn required_row_len(&self) -> usize {
        self.required_row_len
    }

    /// Return the total number of nodes in the tree (both splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Labels of every leaf, in arena order.
    #[must_use]
    pub fn leaf_labels(&self) -> Vec<f64> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Leaf { label, .. } => Some(*label),
                Node::Split { .. } => None,
            })
            .collect()
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-split tree (root with two leaves) has depth 1.
    /// Uses an iterative BFS approach.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }

        let mut max_depth = 0usize;
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((0usize, 0usize));

        while let Some((node_idx, d)) = queue.pop_front() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }

        max_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FeatureIndex;

    fn demo_dataset() -> Dataset {
        Dataset::new(vec![
            vec![2.771244718, 1.784783929, 0.0],
            vec![1.728571309, 1.169761413, 0.0],
            vec![3.678319846, 2.81281357, 0.0],
            vec![3.961043357, 2.61995032, 0.0],
            vec![2.999208922, 2.209014212, 0.0],
            vec![7.497545867, 3.162953546, 1.0],
            vec![9.00220326, 3.339047188, 1.0],
            vec![7.4445542326, 0.476683375, 1.0],
            vec![10.12493903, 3.234550982, 1.0],
            vec![6.642287351, 3.319983761, 1.0],
        ])
        .unwrap()
    }

    /// Single feature with class bands 0 | 1 | 0.
    fn banded_dataset() -> Dataset {
        Dataset::new(vec![
            vec![1.0, 0.0],
            vec![2.0, 0.0],
            vec![3.0, 1.0],
            vec![4.0, 1.0],
            vec![5.0, 0.0],
            vec![6.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn demo_dataset_predicts_training_labels() {
        let ds = demo_dataset();
        let tree = DecisionTreeConfig::new()
            .with_max_depth(9)
            .with_min_size(1)
            .fit(&ds)
            .unwrap();
        let predictions = tree.predict_batch(ds.rows()).unwrap();
        assert_eq!(
            predictions,
            vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]
        );
    }

    #[test]
    fn separating_root_split() {
        // Best first split: X1 < 6.642287351 separates both classes.
        let tree = DecisionTreeConfig::new().fit(&demo_dataset()).unwrap();
        match tree.root() {
            Node::Split {
                feature, threshold, ..
            } => {
                assert_eq!(feature.index(), 0);
                assert_eq!(*threshold, 6.642287351);
            }
            Node::Leaf { .. } => panic!("root must be a split"),
        }
    }

    #[test]
    fn max_depth_one_gives_single_split() {
        let tree = DecisionTreeConfig::new()
            .with_max_depth(1)
            .fit(&demo_dataset())
            .unwrap();
        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn depth_never_exceeds_max_depth() {
        for max_depth in 1..4 {
            let tree = DecisionTreeConfig::new()
                .with_max_depth(max_depth)
                .fit(&banded_dataset())
                .unwrap();
            assert!(tree.depth() <= max_depth, "depth {} > {max_depth}", tree.depth());
        }
    }

    #[test]
    fn banded_data_needs_depth_at_least_2() {
        let ds = banded_dataset();
        let tree = DecisionTreeConfig::new().fit(&ds).unwrap();
        assert!(tree.depth() >= 2);
        assert_eq!(tree.predict_batch(ds.rows()).unwrap(), ds.labels());
    }

    #[test]
    fn tied_candidates_keep_first_split() {
        // No split of XOR improves on 0.5, so the first candidate (X1 < 0,
        // empty left side) is kept and both leaves take the tie-broken majority.
        let ds = Dataset::new(vec![
            vec![0.0, 0.0, 0.0],
            vec![0.0, 1.0, 1.0],
            vec![1.0, 0.0, 1.0],
            vec![1.0, 1.0, 0.0],
        ])
        .unwrap();
        let tree = DecisionTreeConfig::new().fit(&ds).unwrap();
        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.leaf_labels(), vec![0.0, 0.0]);
    }

    #[test]
    fn empty_partition_collapses_to_union_majority() {
        // Every value is equal, so the only split leaves the left side empty.
        let ds = Dataset::new(vec![vec![1.0, 2.0], vec![1.0, 1.0], vec![1.0, 2.0]]).unwrap();
        let tree = DecisionTreeConfig::new().fit(&ds).unwrap();
        assert_eq!(tree.n_nodes(), 3);
        assert_eq!(tree.leaf_labels(), vec![2.0, 2.0]);
    }

    #[test]
    fn min_size_turns_small_partitions_into_leaves() {
        let ds = demo_dataset();
        let tree = DecisionTreeConfig::new().with_min_size(10).fit(&ds).unwrap();
        // Both partitions of the root hold 5 rows, at most min_size.
        assert_eq!(tree.n_nodes(), 3);
    }

    #[test]
    fn leaf_labels_come_from_training_set() {
        let ds = Dataset::new(vec![
            vec![1.0, 3.0, 7.0],
            vec![2.0, 1.0, 4.0],
            vec![3.0, 2.0, 7.0],
            vec![4.0, 5.0, 9.0],
            vec![5.0, 4.0, 4.0],
        ])
        .unwrap();
        let classes = ds.classes();
        let tree = DecisionTreeConfig::new().with_max_depth(2).fit(&ds).unwrap();
        assert!(tree.leaf_labels().iter().all(|l| classes.contains(l)));
    }

    #[test]
    fn build_is_deterministic() {
        let ds = banded_dataset();
        let a = DecisionTreeConfig::new().fit(&ds).unwrap();
        let b = DecisionTreeConfig::new().fit(&ds).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_hyperparameters() {
        let ds = banded_dataset();
        let err = DecisionTreeConfig::new().with_max_depth(0).fit(&ds).unwrap_err();
        assert!(matches!(err, CartError::InvalidMaxDepth { max_depth: 0 }));
        let err = DecisionTreeConfig::new().with_min_size(0).fit(&ds).unwrap_err();
        assert!(matches!(err, CartError::InvalidMinSize { min_size: 0 }));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "zero rows")]
    fn growing_from_zero_rows_panics_in_debug() {
        grow(&banded_dataset(), &[], &DecisionTreeConfig::new(), &mut AllFeatures);
    }

    #[test]
    fn from_nodes_accepts_grown_arena() {
        let tree = DecisionTreeConfig::new().fit(&demo_dataset()).unwrap();
        let rebuilt = DecisionTree::from_nodes(tree.nodes().to_vec(), 2).unwrap();
        assert_eq!(rebuilt, tree);
    }

    fn split(feature: usize, left: usize, right: usize) -> Node {
        Node::Split {
            feature: FeatureIndex::new(feature),
            threshold: 1.0,
            left: NodeIndex::new(left),
            right: NodeIndex::new(right),
            n_samples: 0,
        }
    }

    fn leaf() -> Node {
        Node::Leaf {
            label: 0.0,
            n_samples: 0,
        }
    }

    #[test]
    fn from_nodes_rejects_malformed_arenas() {
        let cases = vec![
            // Empty arena.
            vec![],
            // Child past the end.
            vec![split(0, 1, 9), leaf()],
            // Child pointing back at its parent.
            vec![split(0, 0, 1), leaf()],
            // Backward edge forming a cycle.
            vec![split(0, 1, 2), split(0, 0, 2), leaf()],
            // Feature not present in the training data.
            vec![split(5, 1, 2), leaf(), leaf()],
        ];
        for nodes in cases {
            let err = DecisionTree::from_nodes(nodes.clone(), 2).unwrap_err();
            assert!(matches!(err, CartError::CorruptModel { .. }), "{nodes:?}");
        }
    }

    #[test]
    fn deserialization_recomputes_required_row_len() {
        let mut tree = DecisionTreeConfig::new().fit(&demo_dataset()).unwrap();
        let expected = tree.required_row_len();
        tree.required_row_len = 0;
        let bytes = bincode::serialize(&tree).unwrap();
        let decoded: DecisionTree = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded.required_row_len(), expected);
    }

    #[test]
    fn short_prediction_row_is_rejected() {
        // Only the second feature separates the classes.
        let ds = Dataset::new(vec![
            vec![5.0, 1.0, 0.0],
            vec![5.0, 2.0, 0.0],
            vec![5.0, 8.0, 1.0],
            vec![5.0, 9.0, 1.0],
        ])
        .unwrap();
        let tree = DecisionTreeConfig::new().fit(&ds).unwrap();
        assert_eq!(tree.required_row_len(), 2);
        let err = tree.predict(&[1.0]).unwrap_err();
        assert!(matches!(
            err,
            CartError::RowTooShortForModel {
                required: 2,
                got: 1
            }
        ));
        // Rows without a label column are fine.
        assert!(tree.predict(&[1.0, 1.0]).is_ok());
    }
}
