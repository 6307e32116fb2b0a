use std::{
    fmt,
    sync::{Arc, LazyLock},
};

use rustc_hash::FxHashMap;

use crate::builder::{Builder, NodeType};

/// A shared handle to an immutable syntax tree node.
///
/// Handles compare by pointer identity ([`same_node`]); structural equality
/// is a separate, deep notion ([`deep_equal`]).
pub type NodeRef = Arc<dyn Node>;

/// Source-location metadata tying a node back to the text it was built from.
///
/// The differencing algorithms carry fragments around without inspecting
/// them; builders receive the fragment of the node they are rebuilding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Offset of the first byte covered by the node.
    pub begin: usize,
    /// Offset just past the last byte covered by the node.
    pub end: usize,
}

/// An immutable, ordered, typed tree node.
///
/// Children are addressed by zero-based index. The data payload is a plain
/// string, empty when the node carries none. Implementations must be cheap
/// to traverse: the mapper visits every node at least once.
pub trait Node: fmt::Debug + Send + Sync {
    /// The type of this node, able to produce builders for nodes like it.
    fn node_type(&self) -> Arc<dyn NodeType>;

    /// The name of this node's type.
    fn type_name(&self) -> &str;

    /// The data payload, empty if the node carries none.
    fn data(&self) -> &str;

    /// Where in the original source this node came from.
    fn fragment(&self) -> Fragment;

    /// Free-form key/value annotations.
    fn properties(&self) -> FxHashMap<String, String> {
        FxHashMap::default()
    }

    /// The number of children.
    fn child_count(&self) -> usize;

    /// The child at `index`, if any.
    fn child(&self, index: usize) -> Option<NodeRef>;

    /// The node this one wraps and delegates to, if it is a prototype-based
    /// variant. Chains of prototypes are allowed but must be acyclic.
    fn prototype(&self) -> Option<NodeRef> {
        None
    }

    /// Whether this is the distinguished "no node" marker.
    fn is_dummy(&self) -> bool {
        false
    }
}

/// The distinguished node standing for "no node / empty tree".
///
/// Projections that cannot be built degrade to this node rather than
/// emitting a partial tree.
pub fn dummy() -> NodeRef {
    static DUMMY: LazyLock<NodeRef> = LazyLock::new(|| Arc::new(DummyNode));
    Arc::clone(&DUMMY)
}

/// Pointer identity of two node handles.
pub fn same_node(a: &NodeRef, b: &NodeRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Deep structural comparison: type names, data payloads and children must
/// all agree, recursively. Fragments and properties are not compared.
pub fn deep_equal(a: &dyn Node, b: &dyn Node) -> bool {
    a.type_name() == b.type_name()
        && a.data() == b.data()
        && a.child_count() == b.child_count()
        && (0..a.child_count()).all(|index| match (a.child(index), b.child(index)) {
            (Some(left), Some(right)) => deep_equal(left.as_ref(), right.as_ref()),
            _ => false,
        })
}

/// How deep a prototype chain may be followed before assuming a cycle.
/// Chains are contractually acyclic; the cap only bounds the damage of a
/// contract violation.
const MAX_PROTOTYPE_DEPTH: usize = 64;

/// Whether `candidate` is `target` itself or wraps it anywhere down its
/// prototype chain.
pub fn resolves_to(candidate: &NodeRef, target: &NodeRef) -> bool {
    let mut current = candidate.clone();
    for _ in 0..MAX_PROTOTYPE_DEPTH {
        if same_node(&current, target) {
            return true;
        }
        match current.prototype() {
            Some(prototype) => current = prototype,
            None => return false,
        }
    }
    false
}

/// Hashable pointer identity of a node handle, for identity-keyed tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeIdentity(usize);

impl NodeIdentity {
    pub(crate) fn of(node: &NodeRef) -> Self {
        Self(Arc::as_ptr(node) as *const () as usize)
    }
}

#[derive(Debug)]
struct DummyNode;

impl Node for DummyNode {
    fn node_type(&self) -> Arc<dyn NodeType> {
        Arc::new(DummyType)
    }

    fn type_name(&self) -> &str {
        ""
    }

    fn data(&self) -> &str {
        ""
    }

    fn fragment(&self) -> Fragment {
        Fragment::default()
    }

    fn child_count(&self) -> usize {
        0
    }

    fn child(&self, _index: usize) -> Option<NodeRef> {
        None
    }

    fn is_dummy(&self) -> bool {
        true
    }
}

#[derive(Debug)]
struct DummyType;

impl NodeType for DummyType {
    fn name(&self) -> &str {
        ""
    }

    fn create_builder(&self) -> Box<dyn Builder> {
        Box::new(DummyBuilder)
    }
}

/// The dummy node admits no data and no children.
struct DummyBuilder;

impl Builder for DummyBuilder {
    fn set_fragment(&mut self, _fragment: Fragment) {}

    fn set_data(&mut self, data: &str) -> bool {
        data.is_empty()
    }

    fn set_children_list(&mut self, children: Vec<NodeRef>) -> bool {
        children.is_empty()
    }

    fn is_valid(&self) -> bool {
        true
    }

    fn create_node(self: Box<Self>) -> Option<NodeRef> {
        Some(dummy())
    }
}
