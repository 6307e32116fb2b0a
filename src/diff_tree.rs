use log::debug;
use rustc_hash::FxHashMap;

use crate::{
    builder::{Builder, NodeType},
    ext_node::ExtNode,
    mapping::Mapping,
    node::{Fragment, Node, NodeIdentity, NodeRef, dummy, resolves_to, same_node},
};

/// Integer handle of a [`DiffNode`] within its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiffNodeId(usize);

/// One child slot of a difference tree.
#[derive(Debug, Clone)]
pub enum DiffTreeItem {
    /// A recursively diffed original child.
    Node(DiffNodeId),
    /// An inserted node, positioned after the `after` anchor, or at the head
    /// of the child list for `None`.
    Insert {
        node: NodeRef,
        after: Option<NodeRef>,
    },
    /// The deletion of an original child.
    Delete(NodeRef),
    /// The replacement of an original child by a new node.
    Replace { before: NodeRef, after: NodeRef },
}

#[derive(Debug)]
struct DiffNodeData {
    prototype: NodeRef,
    /// Back-link to the node owning the slot; a relation only, `None` on the
    /// root.
    parent: Option<DiffNodeId>,
    items: Vec<DiffTreeItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Before,
    After,
}

/// A difference tree: a mirror of an original tree where every child slot
/// either recurses ([`DiffTreeItem::Node`]) or carries an edit action, so
/// that both the pre-edit and the post-edit tree can be rebuilt from the one
/// structure.
///
/// Diff nodes are allocated in a per-tree arena and addressed by integer
/// handles. The structure is read-only once the edits are replayed; the
/// [`before`](Self::before) and [`after`](Self::after) projections are
/// computed on demand through the prototypes' own builders. A builder
/// rejection at any stage degrades the whole projection to the dummy node:
/// partial trees are never emitted.
#[derive(Debug)]
pub struct DiffTree {
    nodes: Vec<DiffNodeData>,
    /// The root slot: a diff node in the common case, a `Replace` when the
    /// tree as a whole was replaced.
    root: DiffTreeItem,
    /// Prototype identity to handle, for by-node lookups.
    index: FxHashMap<NodeIdentity, DiffNodeId>,
}

impl DiffTree {
    /// Mirror `prototype` into a difference tree with no edits applied yet.
    pub fn new(prototype: &NodeRef) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: DiffTreeItem::Node(DiffNodeId(0)),
            index: FxHashMap::default(),
        };
        let root = tree.wrap(prototype.clone(), None);
        tree.root = DiffTreeItem::Node(root);
        tree
    }

    /// Materialize the edit script of `mapping` over the left tree: the
    /// canonical difference tree whose before-projection is the left tree
    /// and whose after-projection is the right one.
    pub fn from_mapping<'a>(left: &'a ExtNode<'a>, mapping: &Mapping<'a>) -> Self {
        if let Some(replacement) = mapping.get_replacement(left) {
            return Self {
                nodes: Vec::new(),
                root: DiffTreeItem::Replace {
                    before: left.node().clone(),
                    after: replacement.node().clone(),
                },
                index: FxHashMap::default(),
            };
        }

        let mut tree = Self::new(left.node());
        for node in mapping.deleted() {
            if let Some(parent) = node.parent()
                && let Some(parent_id) = tree.find_node(parent.node())
            {
                tree.delete_node(parent_id, node.node());
            }
        }
        // the top-down mapper only ever replaces the root, handled above; a
        // hand-built mapping may replace any child
        for (before, after) in mapping.replaced() {
            if let Some(parent) = before.parent()
                && let Some(parent_id) = tree.find_node(parent.node())
            {
                tree.replace_node(parent_id, before.node(), after.node().clone());
            }
        }
        for insertion in mapping.inserted() {
            if let Some(parent_id) = tree.find_node(insertion.parent.node()) {
                tree.insert_node_after(
                    parent_id,
                    insertion.node.node().clone(),
                    insertion.after.map(|anchor| anchor.node()),
                );
            }
        }
        debug!(
            "materialized an edit script over {} diff nodes",
            tree.nodes.len()
        );
        tree
    }

    fn wrap(&mut self, prototype: NodeRef, parent: Option<DiffNodeId>) -> DiffNodeId {
        let id = DiffNodeId(self.nodes.len());
        self.nodes.push(DiffNodeData {
            prototype: prototype.clone(),
            parent,
            items: Vec::new(),
        });
        self.index.entry(NodeIdentity::of(&prototype)).or_insert(id);
        let items = (0..prototype.child_count())
            .filter_map(|index| prototype.child(index))
            .map(|child| DiffTreeItem::Node(self.wrap(child, Some(id))))
            .collect();
        self.nodes[id.0].items = items;
        id
    }

    /// The root diff node, unless the tree as a whole is a replacement.
    pub fn root(&self) -> Option<DiffNode<'_>> {
        match self.root {
            DiffTreeItem::Node(id) => Some(DiffNode { tree: self, id }),
            _ => None,
        }
    }

    /// The view on a diff node by handle.
    pub fn node(&self, id: DiffNodeId) -> Option<DiffNode<'_>> {
        self.nodes.get(id.0).map(|_| DiffNode { tree: self, id })
    }

    /// Locate the diff node mirroring `node`, chasing the prototype chains
    /// of the mirrored originals.
    pub fn find_node(&self, node: &NodeRef) -> Option<DiffNodeId> {
        if let Some(id) = self.index.get(&NodeIdentity::of(node)) {
            return Some(*id);
        }
        (0..self.nodes.len())
            .map(DiffNodeId)
            .find(|id| resolves_to(&self.nodes[id.0].prototype, node))
    }

    /// The tree as it was before the edits.
    pub fn before(&self) -> NodeRef {
        self.project_root(Side::Before).unwrap_or_else(dummy)
    }

    /// The tree with all the edits applied.
    pub fn after(&self) -> NodeRef {
        self.project_root(Side::After).unwrap_or_else(dummy)
    }

    /// Insert `node` into the children of `parent`, right after the `after`
    /// anchor, or at the head of the child list when `after` is `None`. The
    /// anchor may be an original child or a previously inserted node.
    /// Returns whether a slot was found.
    pub fn insert_node_after(
        &mut self,
        parent: DiffNodeId,
        node: NodeRef,
        after: Option<&NodeRef>,
    ) -> bool {
        if self.nodes.get(parent.0).is_none() {
            return false;
        }
        let Some(anchor) = after else {
            self.nodes[parent.0]
                .items
                .insert(0, DiffTreeItem::Insert { node, after: None });
            return true;
        };
        let position = self.nodes[parent.0].items.iter().position(|item| match item {
            DiffTreeItem::Node(child) => resolves_to(&self.nodes[child.0].prototype, anchor),
            DiffTreeItem::Insert { node: inserted, .. } => same_node(inserted, anchor),
            _ => false,
        });
        match position {
            Some(position) => {
                let item = DiffTreeItem::Insert {
                    node,
                    after: Some(anchor.clone()),
                };
                self.nodes[parent.0].items.insert(position + 1, item);
                true
            }
            None => false,
        }
    }

    /// Replace the child at `index` of `parent`. Only a not-yet-edited slot
    /// can be replaced. Returns whether it was.
    pub fn replace_at(&mut self, parent: DiffNodeId, index: usize, replacement: NodeRef) -> bool {
        let Some(child) = self.diff_child_at(parent, index) else {
            return false;
        };
        let before = self.nodes[child.0].prototype.clone();
        self.nodes[parent.0].items[index] = DiffTreeItem::Replace {
            before,
            after: replacement,
        };
        true
    }

    /// Replace the child of `parent` mirroring `node` (prototype chains are
    /// chased). Returns whether it was found.
    pub fn replace_node(&mut self, parent: DiffNodeId, node: &NodeRef, replacement: NodeRef) -> bool {
        match self.find_child_index(parent, node) {
            Some(index) => self.replace_at(parent, index, replacement),
            None => false,
        }
    }

    /// Mark the child at `index` of `parent` as deleted. Only a
    /// not-yet-edited slot can be deleted. Returns whether it was.
    pub fn delete_at(&mut self, parent: DiffNodeId, index: usize) -> bool {
        let Some(child) = self.diff_child_at(parent, index) else {
            return false;
        };
        let before = self.nodes[child.0].prototype.clone();
        self.nodes[parent.0].items[index] = DiffTreeItem::Delete(before);
        true
    }

    /// Mark the child of `parent` mirroring `node` as deleted (prototype
    /// chains are chased). Returns whether it was found.
    pub fn delete_node(&mut self, parent: DiffNodeId, node: &NodeRef) -> bool {
        match self.find_child_index(parent, node) {
            Some(index) => self.delete_at(parent, index),
            None => false,
        }
    }

    /// The index of the child slot of `parent` still mirroring `node`.
    fn find_child_index(&self, parent: DiffNodeId, node: &NodeRef) -> Option<usize> {
        self.nodes
            .get(parent.0)?
            .items
            .iter()
            .position(|item| match item {
                DiffTreeItem::Node(child) => resolves_to(&self.nodes[child.0].prototype, node),
                _ => false,
            })
    }

    /// The handle behind the child slot at `index`, when it is still a plain
    /// diff node.
    fn diff_child_at(&self, parent: DiffNodeId, index: usize) -> Option<DiffNodeId> {
        match self.nodes.get(parent.0)?.items.get(index)? {
            DiffTreeItem::Node(child) => Some(*child),
            _ => None,
        }
    }

    fn project_root(&self, side: Side) -> Option<NodeRef> {
        match &self.root {
            DiffTreeItem::Node(id) => self.project_node(*id, side),
            DiffTreeItem::Replace { before, after } => Some(match side {
                Side::Before => before.clone(),
                Side::After => after.clone(),
            }),
            DiffTreeItem::Insert { node, .. } => {
                (side == Side::After).then(|| node.clone())
            }
            DiffTreeItem::Delete(node) => (side == Side::Before).then(|| node.clone()),
        }
    }

    /// Rebuild one side of a diff node through its prototype's builder.
    /// `None` on any rejection; the caller degrades to the dummy node.
    fn project_node(&self, id: DiffNodeId, side: Side) -> Option<NodeRef> {
        let data = &self.nodes[id.0];
        let mut children = Vec::new();
        for item in &data.items {
            match item {
                DiffTreeItem::Node(child) => children.push(self.project_node(*child, side)?),
                DiffTreeItem::Insert { node, .. } => {
                    if side == Side::After {
                        children.push(node.clone());
                    }
                }
                DiffTreeItem::Delete(node) => {
                    if side == Side::Before {
                        children.push(node.clone());
                    }
                }
                DiffTreeItem::Replace { before, after } => children.push(match side {
                    Side::Before => before.clone(),
                    Side::After => after.clone(),
                }),
            }
        }

        let prototype = &data.prototype;
        let mut builder = prototype.node_type().create_builder();
        builder.set_fragment(prototype.fragment());
        if !builder.set_data(prototype.data()) {
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

/// A borrowed view on one node of a [`DiffTree`], passing the original
/// node's surface through and exposing the annotated child slots.
#[derive(Debug, Clone, Copy)]
pub struct DiffNode<'t> {
    tree: &'t DiffTree,
    id: DiffNodeId,
}

impl<'t> DiffNode<'t> {
    fn record(&self) -> &'t DiffNodeData {
        &self.tree.nodes[self.id.0]
    }

    /// The handle of this node, for use with the tree's mutators.
    pub fn id(&self) -> DiffNodeId {
        self.id
    }

    /// The original node this diff node mirrors.
    pub fn prototype(&self) -> &'t NodeRef {
        &self.record().prototype
    }

    /// The diff node owning this one's slot, if any.
    pub fn parent(&self) -> Option<DiffNode<'t>> {
        self.record().parent.map(|id| DiffNode {
            tree: self.tree,
            id,
        })
    }

    /// The name of the prototype's type.
    pub fn type_name(&self) -> &'t str {
        self.record().prototype.type_name()
    }

    /// The prototype's data payload.
    pub fn data(&self) -> &'t str {
        self.record().prototype.data()
    }

    /// The prototype's source fragment.
    pub fn fragment(&self) -> Fragment {
        self.record().prototype.fragment()
    }

    /// The prototype's key/value annotations.
    pub fn properties(&self) -> FxHashMap<String, String> {
        self.record().prototype.properties()
    }

    /// The number of child slots.
    pub fn child_count(&self) -> usize {
        self.record().items.len()
    }

    /// The child slot at `index`, if any.
    pub fn child(&self, index: usize) -> Option<&'t DiffTreeItem> {
        self.record().items.get(index)
    }

    /// All child slots, in order.
    pub fn items(&self) -> &'t [DiffTreeItem] {
        &self.record().items
    }

    /// The diff node behind the child slot at `index`, when that slot is
    /// still one.
    pub fn diff_child(&self, index: usize) -> Option<DiffNode<'t>> {
        match self.child(index)? {
            DiffTreeItem::Node(id) => Some(DiffNode {
                tree: self.tree,
                id: *id,
            }),
            _ => None,
        }
    }

    /// This node's subtree as it was before the edits.
    pub fn before(&self) -> NodeRef {
        self.tree
            .project_node(self.id, Side::Before)
            .unwrap_or_else(dummy)
    }

    /// This node's subtree with the edits applied.
    pub fn after(&self) -> NodeRef {
        self.tree
            .project_node(self.id, Side::After)
            .unwrap_or_else(dummy)
    }
}
