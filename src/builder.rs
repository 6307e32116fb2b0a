use std::fmt;

use crate::node::{Fragment, NodeRef};

/// A handle on a node type, able to produce builders for nodes of that type.
pub trait NodeType: fmt::Debug + Send + Sync {
    /// The name of the type.
    fn name(&self) -> &str;

    /// A fresh builder for a node of this type.
    fn create_builder(&self) -> Box<dyn Builder>;
}

/// Mutable construction interface for a single node.
///
/// A builder is a rejectable sink: each setter reports whether the value was
/// accepted, [`is_valid`](Builder::is_valid) gates the final construction,
/// and [`create_node`](Builder::create_node) may still refuse. Callers that
/// must not emit partial trees (projections, the patcher) short-circuit on
/// the first rejection.
pub trait Builder {
    /// Attach source-location metadata to the node under construction.
    fn set_fragment(&mut self, fragment: Fragment);

    /// Attach a data payload. Returns whether the type accepts it.
    fn set_data(&mut self, data: &str) -> bool;

    /// Set the full children list. Returns whether the type accepts it
    /// (arity and child-type constraints are up to the implementation).
    fn set_children_list(&mut self, children: Vec<NodeRef>) -> bool;

    /// Whether the builder is in a state fit to produce a node.
    fn is_valid(&self) -> bool;

    /// Produce the node, or `None` if the builder refuses in its current
    /// state.
    fn create_node(self: Box<Self>) -> Option<NodeRef>;
}

/// Maps type names to fresh builders.
///
/// This is the seam external node catalogs plug into; implementations must
/// be shareable across threads so independent mappings can run in parallel.
pub trait NodeFactory: Send + Sync {
    /// A fresh builder for the named type, or `None` if the factory does not
    /// know the type.
    fn create_builder(&self, type_name: &str) -> Option<Box<dyn Builder>>;
}
