use rustc_hash::{FxHashMap, FxHashSet};

use crate::ext_node::ExtNode;

/// A planned insertion: `node` (from the right tree) enters the children of
/// `parent` (from the left tree) right after `after` — either an already
/// matched left sibling or the previously inserted right node. `None` means
/// at the head of the child list.
#[derive(Debug, Clone, Copy)]
pub struct Insertion<'a> {
    pub node: &'a ExtNode<'a>,
    pub parent: &'a ExtNode<'a>,
    pub after: Option<&'a ExtNode<'a>>,
}

/// The outcome of mapping two trees: the node relation plus the edit script.
///
/// Both relation tables are total over their tree: every left node ends up a
/// key of the left-to-right table and every right node a key of the
/// right-to-left one. A `None` value acknowledges a node as unmatched
/// (inserted, deleted, or under a replaced root) rather than merely not
/// visited.
#[derive(Debug, Default)]
pub struct Mapping<'a> {
    ltr: FxHashMap<&'a ExtNode<'a>, Option<&'a ExtNode<'a>>>,
    rtl: FxHashMap<&'a ExtNode<'a>, Option<&'a ExtNode<'a>>>,
    inserted: Vec<Insertion<'a>>,
    replaced: FxHashMap<&'a ExtNode<'a>, &'a ExtNode<'a>>,
    deleted: FxHashSet<&'a ExtNode<'a>>,
}

impl<'a> Mapping<'a> {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// The match recorded for a node of the left tree. The outer `Option` is
    /// key presence, the inner one the acknowledged-unmatched marker.
    pub fn get_from_left(&self, from: &'a ExtNode<'a>) -> Option<Option<&'a ExtNode<'a>>> {
        self.ltr.get(from).copied()
    }

    /// The match recorded for a node of the right tree.
    pub fn get_from_right(&self, from: &'a ExtNode<'a>) -> Option<Option<&'a ExtNode<'a>>> {
        self.rtl.get(from).copied()
    }

    /// Does the mapping pair these two nodes?
    pub fn are_matched(&self, left: &'a ExtNode<'a>, right: &'a ExtNode<'a>) -> bool {
        self.get_from_left(left) == Some(Some(right))
    }

    /// Adds a match between two nodes (in both directions).
    pub(crate) fn add(&mut self, left: &'a ExtNode<'a>, right: &'a ExtNode<'a>) {
        self.ltr.insert(left, Some(right));
        self.rtl.insert(right, Some(left));
    }

    /// Acknowledges a left-tree node as unmatched.
    pub(crate) fn acknowledge_left(&mut self, node: &'a ExtNode<'a>) {
        self.ltr.insert(node, None);
    }

    /// Acknowledges a right-tree node as unmatched.
    pub(crate) fn acknowledge_right(&mut self, node: &'a ExtNode<'a>) {
        self.rtl.insert(node, None);
    }

    pub(crate) fn add_insertion(&mut self, insertion: Insertion<'a>) {
        self.inserted.push(insertion);
    }

    pub(crate) fn add_deletion(&mut self, node: &'a ExtNode<'a>) {
        self.deleted.insert(node);
    }

    pub(crate) fn add_replacement(&mut self, left: &'a ExtNode<'a>, right: &'a ExtNode<'a>) {
        self.replaced.insert(left, right);
    }

    /// The planned insertions, in the order the mapper discovered them
    /// (left-to-right under each parent, `after` anchors chained).
    pub fn inserted(&self) -> &[Insertion<'a>] {
        &self.inserted
    }

    /// The nodes of the left tree that were deleted.
    pub fn deleted(&self) -> impl Iterator<Item = &'a ExtNode<'a>> + '_ {
        self.deleted.iter().copied()
    }

    /// Whether a left-tree node was deleted.
    pub fn is_deleted(&self, node: &'a ExtNode<'a>) -> bool {
        self.deleted.contains(node)
    }

    /// The replacements, as (left node, right node) pairs.
    pub fn replaced(&self) -> impl Iterator<Item = (&'a ExtNode<'a>, &'a ExtNode<'a>)> + '_ {
        self.replaced.iter().map(|(left, right)| (*left, *right))
    }

    /// The node a left-tree node was replaced by, if any.
    pub fn get_replacement(&self, left: &'a ExtNode<'a>) -> Option<&'a ExtNode<'a>> {
        self.replaced.get(left).copied()
    }

    /// Iterate over all left-tree entries.
    pub fn iter_left(&self) -> impl Iterator<Item = (&'a ExtNode<'a>, Option<&'a ExtNode<'a>>)> + '_ {
        self.ltr.iter().map(|(node, matched)| (*node, *matched))
    }

    /// Iterate over all right-tree entries.
    pub fn iter_right(&self) -> impl Iterator<Item = (&'a ExtNode<'a>, Option<&'a ExtNode<'a>>)> + '_ {
        self.rtl.iter().map(|(node, matched)| (*node, *matched))
    }

    /// The number of matched pairs.
    pub fn len(&self) -> usize {
        self.ltr.values().filter(|matched| matched.is_some()).count()
    }

    /// Whether no pair was matched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
