//! The two 64-bit hashes driving structural matching.
//!
//! The *local* hash covers a node's own identity (type name and data); the
//! *absolute* hash additionally covers the whole subtree, so that any two
//! structurally identical subtrees hash alike. Hash equality is treated as
//! identity by the matching algorithms: collisions are accepted as an
//! engineering trade-off and never verified by deep comparison.

use std::hash::{Hash, Hasher};

use crate::{fxhasher, node::Node};

/// Hash of a node's type name and data payload only.
pub fn local_hash(node: &dyn Node) -> u64 {
    let mut hasher = fxhasher();
    node.type_name().hash(&mut hasher);
    node.data().hash(&mut hasher);
    hasher.finish()
}

/// Hash of an entire subtree: the node's local hash combined with the
/// absolute hashes of all its children, in order.
pub fn absolute_hash(local_hash: u64, child_hashes: &[u64]) -> u64 {
    let mut hasher = fxhasher();
    local_hash.hash(&mut hasher);
    child_hashes.hash(&mut hasher);
    hasher.finish()
}
