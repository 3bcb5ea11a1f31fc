//! Error types for tree construction and maintenance

use crate::bounding::node::NodeId;
use crate::config::ConfigError;

/// Errors reported by tree construction, update and validation
#[derive(thiserror::Error, Debug)]
pub enum BvhError {
    /// Build was called with no elements; the tree is left empty
    #[error("cannot build a tree from zero elements")]
    NoElements,

    /// Leaf capacity must be at least one element
    #[error("invalid max leaf element count: {0}")]
    InvalidLeafSize(usize),

    /// Margin is not a finite number
    #[error("invalid margin: {0}")]
    InvalidMargin(f64),

    /// Update was given a different number of elements than build
    #[error("element count mismatch: tree holds {expected}, got {actual}")]
    ElementCountMismatch {
        /// Count the tree was built with
        expected: usize,
        /// Count supplied to the call
        actual: usize,
    },

    /// Node id does not belong to this tree
    #[error("invalid node {0}")]
    InvalidNode(NodeId),

    /// A node's volume does not enclose its elements
    #[error("node {node} does not contain its elements")]
    NotContained {
        /// Offending node
        node: NodeId,
    },

    /// An element reported no points to bound
    #[error("element has no points")]
    EmptyElement,

    /// Configuration could not be loaded or saved
    #[error(transparent)]
    Config(#[from] ConfigError),
}
