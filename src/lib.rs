//! Structural differencing and patching of syntax trees.
//!
//! ## Overview
//!
//! Given two immutable syntax trees, a *left* (before) one and a *right*
//! (after) one, this crate computes a structural mapping between their nodes
//! and classifies the delta as insertions, deletions and replacements. The
//! delta can be materialized as a [`DiffTree`]: a mirror of the original tree
//! whose child slots carry edit actions while staying navigable to both the
//! pre-edit and the post-edit state. A difference tree can in turn serve as a
//! find-and-replace *pattern* over arbitrary trees ([`Patcher`]).
//!
//! Trees are consumed as opaque immutable values behind the [`Node`] trait
//! and new nodes are produced through caller-supplied [`Builder`]s. Matching
//! is purely structural, driven by two cached 64-bit hashes per node: a
//! *local* hash of the node's type and data, and an *absolute* hash covering
//! the entire subtree. Two subtrees with equal absolute hashes are treated as
//! identical; the algorithm is a greedy top-down heuristic tuned for common
//! syntax-tree edits, not an optimal edit distance.
//!
//! ```
//! use astdelta::{DiffTree, ExtNode, TopDownMapper, deep_equal};
//! # use astdelta::NodeRef;
//! # fn demo(left: NodeRef, right: NodeRef) -> Result<(), astdelta::MappingError> {
//! let arena = typed_arena::Arena::new();
//! let left_view = ExtNode::build(&left, &arena);
//! let right_view = ExtNode::build(&right, &arena);
//! let mapping = TopDownMapper::new().map(left_view, right_view)?;
//! let diff = DiffTree::from_mapping(left_view, &mapping);
//! assert!(deep_equal(diff.before().as_ref(), left.as_ref()));
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod diff_tree;
pub mod ext_node;
pub(crate) mod hashing;
pub mod mapper;
pub mod mapping;
pub mod node;
pub(crate) mod pair_finder;
pub mod patcher;
pub(crate) mod section;
#[cfg(test)]
pub(crate) mod test_utils;

pub use builder::{Builder, NodeFactory, NodeType};
pub use diff_tree::{DiffNode, DiffNodeId, DiffTree, DiffTreeItem};
pub use ext_node::ExtNode;
pub use mapper::{MappingError, TopDownMapper};
pub use mapping::{Insertion, Mapping};
pub use node::{Fragment, Node, NodeRef, deep_equal, dummy};
pub use patcher::Patcher;

fn fxhasher() -> rustc_hash::FxHasher {
    use std::hash::BuildHasher;
    rustc_hash::FxBuildHasher.build_hasher()
}
