use log::debug;

use crate::{
    builder::{Builder, NodeType},
    diff_tree::DiffTree,
    node::{Node, NodeRef, deep_equal},
};

/// Applies a difference tree as a find-and-replace pattern over arbitrary
/// trees.
///
/// The pattern's before-projection is the image to look for, its
/// after-projection the image to substitute. Matching is deep structural
/// equality; discovery is top-down and leftmost, and a substituted subtree
/// is not searched again. Nodes on the path to a substitution are rebuilt
/// through their own types' builders; everything else is shared with the
/// source tree.
#[derive(Debug, Default)]
pub struct Patcher;

impl Patcher {
    pub fn new() -> Self {
        Self
    }

    /// Replace every non-overlapping subtree of `source` matching the
    /// pattern's before-image with its after-image. Without any match the
    /// source is returned unchanged.
    pub fn patch(&self, source: &NodeRef, pattern: &DiffTree) -> NodeRef {
        let before = pattern.before();
        let after = pattern.after();
        if before.is_dummy() {
            // a pattern without a before-image matches nothing
            return source.clone();
        }
        let (patched, substitutions) = Self::apply(source, &before, &after);
        debug!("patching made {substitutions} substitutions");
        patched
    }

    /// Returns the patched subtree and the number of substitutions in it.
    fn apply(node: &NodeRef, before: &NodeRef, after: &NodeRef) -> (NodeRef, usize) {
        if deep_equal(node.as_ref(), before.as_ref()) {
            return (after.clone(), 1);
        }
        let mut substitutions = 0;
        let mut children = Vec::with_capacity(node.child_count());
        for index in 0..node.child_count() {
            let Some(child) = node.child(index) else {
                continue;
            };
            let (patched, count) = Self::apply(&child, before, after);
            substitutions += count;
            children.push(patched);
        }
        if substitutions == 0 {
            return (node.clone(), 0);
        }
        match Self::rebuild(node, children) {
            Some(rebuilt) => (rebuilt, substitutions),
            // the node's type rejects the patched children; leave this
            // subtree as it was
            None => (node.clone(), 0),
        }
    }

    fn rebuild(node: &NodeRef, children: Vec<NodeRef>) -> Option<NodeRef> {
        let mut builder = node.node_type().create_builder();
        builder.set_fragment(node.fragment());
        if !builder.set_data(node.data()) {
            return None;
        }
        if !builder.set_children_list(children) {
            return None;
        }
        if !builder.is_valid() {
            return None;
        }
        builder.create_node()
    }
}
