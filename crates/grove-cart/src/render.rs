//! Indented text rendering of fitted models.
//!
//! Internal nodes print as `[X<feature+1> < <threshold>]` with three
//! decimals, leaves as `[<label>]`. Each level indents by one space and the
//! left subtree is printed before the right.

use std::fmt;

use crate::forest::RandomForest;
use crate::node::{Node, NodeIndex};
use crate::tree::DecisionTree;

impl DecisionTree {
    fn render_node(&self, f: &mut fmt::Formatter<'_>, idx: NodeIndex, depth: usize) -> fmt::Result {
        match &self.nodes[idx.index()] {
            Node::Leaf { label, .. } => writeln!(f, "{:depth$}[{label}]", ""),
            Node::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } => {
                writeln!(f, "{:depth$}[X{} < {threshold:.3}]", "", feature.index() + 1)?;
                self.render_node(f, *left, depth + 1)?;
                self.render_node(f, *right, depth + 1)
            }
        }
    }
}

impl fmt::Display for DecisionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nodes.is_empty() {
            return Ok(());
        }
        self.render_node(f, NodeIndex::new(0), 0)
    }
}

impl fmt::Display for RandomForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tree) in self.trees.iter().enumerate() {
            writeln!(f, "Tree {i}:")?;
            write!(f, "{tree}")?;
        }
        Ok(())
    }
}
