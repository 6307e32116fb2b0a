use std::{
    cell::UnsafeCell,
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

use itertools::Itertools;
use typed_arena::Arena;

use crate::{
    hashing,
    node::{Node, NodeRef},
};

/// A read-only decoration of a node tree for the duration of a mapping run.
///
/// All ext nodes of a view are allocated in a caller-owned arena, which
/// determines the lifetime parameter. On top of the underlying node, the
/// view adds a parent link, the position among the siblings, and the two
/// pre-computed hash values the matching algorithms run on: any two
/// structurally identical subtrees have the same absolute hash on their
/// roots. Hashes are fixed at construction; the view must be rebuilt to
/// reflect a different tree.
#[derive(Debug)]
pub struct ExtNode<'a> {
    /// The absolute hash: a statically computed hash value covering the
    /// entire subtree rooted in this node.
    pub hash: u64,
    /// Hash of the node's type name and data only.
    pub local_hash: u64,
    /// The decorated children of this node (empty if this is a leaf).
    pub children: Vec<&'a Self>,
    /// Zero-based position among the siblings (0 on a root).
    pub index: usize,
    /// An id unique within the view, in post-order.
    pub id: usize,
    node: NodeRef,
    /// A cached number of descendants, the node itself included.
    descendant_count: usize,
    /// The parent of this node, if any. Written once right after
    /// construction and never again.
    parent: UnsafeCell<Option<&'a Self>>,
}

impl<'a> ExtNode<'a> {
    /// Decorate the tree rooted in `node`, allocating the view in `arena`.
    pub fn build(node: &NodeRef, arena: &'a Arena<Self>) -> &'a Self {
        let mut next_id = 0;
        Self::internal_new(node.clone(), 0, arena, &mut next_id)
    }

    fn internal_new(
        node: NodeRef,
        index: usize,
        arena: &'a Arena<Self>,
        next_id: &mut usize,
    ) -> &'a Self {
        let children: Vec<&'a Self> = (0..node.child_count())
            .filter_map(|child_index| node.child(child_index))
            .enumerate()
            .map(|(child_index, child)| Self::internal_new(child, child_index, arena, next_id))
            .collect();

        let local_hash = hashing::local_hash(node.as_ref());
        let child_hashes = children.iter().map(|child| child.hash).collect_vec();
        let hash = hashing::absolute_hash(local_hash, &child_hashes);
        let descendant_count = 1 + children
            .iter()
            .map(|child| child.descendant_count)
            .sum::<usize>();

        let id = *next_id;
        *next_id += 1;

        let result = arena.alloc(Self {
            hash,
            local_hash,
            children,
            index,
            id,
            node,
            descendant_count,
            parent: UnsafeCell::new(None),
        });
        result.internal_set_parent_on_children();
        result
    }

    fn internal_set_parent_on_children(&'a self) {
        for child in &self.children {
            // SAFETY: written exactly once, right after the children were
            // allocated, before the view is shared.
            unsafe { *child.parent.get() = Some(self) }
        }
    }

    /// The underlying node.
    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    /// The name of the underlying node's type.
    pub fn type_name(&self) -> &str {
        self.node.type_name()
    }

    /// Get the parent of this node, if any.
    pub fn parent(&'a self) -> Option<&'a Self> {
        // SAFETY: not written to after construction.
        unsafe { *self.parent.get() }
    }

    /// The sibling immediately to the left, if any.
    pub fn previous_sibling(&'a self) -> Option<&'a Self> {
        let parent = self.parent()?;
        parent.child(self.index.checked_sub(1)?)
    }

    /// The sibling immediately to the right, if any.
    pub fn next_sibling(&'a self) -> Option<&'a Self> {
        self.parent()?.child(self.index + 1)
    }

    /// Convenience accessor for children.
    pub fn child(&self, index: usize) -> Option<&'a Self> {
        self.children.get(index).copied()
    }

    /// The number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Convenience function
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Convenience function
    pub fn is_root(&'a self) -> bool {
        self.parent().is_none()
    }

    /// The number of nodes in the subtree rooted here, itself included.
    pub fn size(&self) -> usize {
        self.descendant_count
    }

    /// Depth-first search iterator over the subtree, in prefix order.
    pub fn dfs(&'a self) -> impl Iterator<Item = &'a Self> {
        DfsIterator {
            current: vec![self],
        }
    }
}

/// Ext nodes compare and hash by identity: each decorated node is allocated
/// exactly once in its view's arena, so the address tells any two nodes
/// apart, including structurally identical ones on the two sides of a
/// mapping.
impl PartialEq for ExtNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for ExtNode<'_> {}

impl Hash for ExtNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self, state);
    }
}

// ExtNode fails to be Sync by default because it contains an UnsafeCell. But
// this cell is only mutated during construction and only ever refers to
// something that lives as long as the node itself (thanks to the use of
// arenas) so it's fine to share it across threads.
unsafe impl Sync for ExtNode<'_> {}
unsafe impl Send for ExtNode<'_> {}

impl Display for ExtNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.node.data().is_empty() {
            write!(f, "{}#{}", self.type_name(), self.id)
        } else {
            write!(f, "{}({})#{}", self.type_name(), self.node.data(), self.id)
        }
    }
}

struct DfsIterator<'a> {
    current: Vec<&'a ExtNode<'a>>,
}

impl<'a> Iterator for DfsIterator<'a> {
    type Item = &'a ExtNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.current.pop()?;
        self.current.extend(node.children.iter().rev());
        Some(node)
    }
}
