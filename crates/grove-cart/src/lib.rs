//! CART decision trees and Random Forest classification.
//!
//! Trees are grown greedily by minimising weighted Gini impurity over
//! candidate thresholds taken from the training values. Forests combine
//! trees trained on bootstrap samples with a random feature subspace drawn
//! at every split, built in parallel via rayon. Fitted models render as
//! indented text, export to a nested JSON document, and persist via bincode.

mod config;
mod dataset;
mod error;
mod export;
mod forest;
mod gini;
mod node;
mod predict;
mod render;
mod serialize;
mod split;
mod tree;
mod vote;

pub use config::{Aggregation, ForestMode, RandomForestConfig};
pub use dataset::Dataset;
pub use error::{CartError, ErrorKind};
pub use export::{ExportedNode, TreeDocument};
pub use forest::RandomForest;
pub use gini::{gini_index, group_impurity};
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use predict::ForestVote;
pub use split::{AllFeatures, FeatureSampler, RandomSubspace, SplitResult, find_best_split};
pub use tree::{DecisionTree, DecisionTreeConfig};
pub use vote::{VoteTally, majority};
