//! Nested JSON exchange format for single trees.
//!
//! Internal nodes are written as `{featureIndex, threshold, left, right}`
//! and leaves as `{label}`, so a tree can be read back by tools that know
//! nothing about the arena layout used in memory.

use tracing::{debug, instrument};

use crate::error::CartError;
use crate::node::{FeatureIndex, Node, NodeIndex};
use crate::tree::DecisionTree;

/// Current tree document version.
const FORMAT_VERSION: u32 = 1;

/// A tree node in the exchange format.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ExportedNode {
    /// A decision node.
    #[serde(rename_all = "camelCase")]
    Internal {
        /// Zero-based feature compared at this node.
        feature_index: usize,
        /// Rows with a value strictly below this go left.
        threshold: f64,
        /// Subtree for rows below the threshold.
        left: Box<ExportedNode>,
        /// Subtree for all other rows.
        right: Box<ExportedNode>,
    },
    /// A terminal node.
    Leaf {
        /// The predicted label.
        label: f64,
    },
}

/// A versioned, self-describing tree document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDocument {
    /// Format version for compatibility checking.
    pub format_version: u32,
    /// Number of feature columns the tree was trained on.
    pub n_features: usize,
    /// The root node.
    pub root: ExportedNode,
}

impl DecisionTree {
    /// Convert the tree into its nested exchange form.
    #[must_use]
    pub fn export(&self) -> TreeDocument {
        TreeDocument {
            format_version: FORMAT_VERSION,
            n_features: self.n_features,
            root: self.export_node(NodeIndex::new(0)),
        }
    }

    fn export_node(&self, idx: NodeIndex) -> ExportedNode {
        match &self.nodes[idx.index()] {
            Node::Leaf { label, .. } => ExportedNode::Leaf { label: *label },
            Node::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } => ExportedNode::Internal {
                feature_index: feature.index(),
                threshold: *threshold,
                left: Box::new(self.export_node(*left)),
                right: Box::new(self.export_node(*right)),
            },
        }
    }

    /// Build a tree from its exchange form.
    ///
    /// Training statistics are not part of the exchange format, so every
    /// imported node reports zero samples.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CartError::IncompatibleModelVersion`] | unknown format version |
    /// | [`CartError::InvalidTreeDocument`] | feature index out of range or non-finite value |
    pub fn import(document: &TreeDocument) -> Result<Self, CartError> {
        if document.format_version != FORMAT_VERSION {
            return Err(CartError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: document.format_version,
            });
        }
        let mut arena = Vec::new();
        import_node(&document.root, document.n_features, &mut arena)?;
        DecisionTree::from_nodes(arena, document.n_features)
    }

    /// Encode the tree as a pretty-printed JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ExportTree`] if JSON encoding fails.
    pub fn to_json(&self) -> Result<String, CartError> {
        serde_json::to_string_pretty(&self.export()).map_err(|e| CartError::ExportTree { source: e })
    }

    /// Decode a tree from a JSON document produced by [`DecisionTree::to_json`].
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ImportTree`] on malformed JSON, plus the errors of
    /// [`DecisionTree::import`].
    #[instrument(skip(json), fields(len = json.len()))]
    pub fn from_json(json: &str) -> Result<Self, CartError> {
        let document: TreeDocument =
            serde_json::from_str(json).map_err(|e| CartError::ImportTree { source: e })?;
        let tree = Self::import(&document)?;
        debug!(n_nodes = tree.n_nodes(), "tree imported");
        Ok(tree)
    }
}

/// Append `node` and its subtree to `arena` in pre-order.
fn import_node(
    node: &ExportedNode,
    n_features: usize,
    arena: &mut Vec<Node>,
) -> Result<NodeIndex, CartError> {
    let idx = arena.len();
    match node {
        ExportedNode::Leaf { label } => {
            if !label.is_finite() {
                return Err(CartError::InvalidTreeDocument {
                    reason: format!("leaf label {label} is not finite"),
                });
            }
            arena.push(Node::Leaf {
                label: *label,
                n_samples: 0,
            });
        }
        ExportedNode::Internal {
            feature_index,
            threshold,
            left,
            right,
        } => {
            if *feature_index >= n_features {
                return Err(CartError::InvalidTreeDocument {
                    reason: format!(
                        "feature index {feature_index} out of range for {n_features} features"
                    ),
                });
            }
            if !threshold.is_finite() {
                return Err(CartError::InvalidTreeDocument {
                    reason: format!("threshold {threshold} is not finite"),
                });
            }
            arena.push(Node::Leaf {
                label: 0.0,
                n_samples: 0,
            });
            let left = import_node(left, n_features, arena)?;
            let right = import_node(right, n_features, arena)?;
            arena[idx] = Node::Split {
                feature: FeatureIndex::new(*feature_index),
                threshold: *threshold,
                left,
                right,
                n_samples: 0,
            };
        }
    }
    Ok(NodeIndex::new(idx))
}
