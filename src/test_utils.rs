//! Utilities to build small trees concisely in tests.

use std::sync::Arc;

use crate::{
    builder::{Builder, NodeFactory, NodeType},
    node::{Fragment, Node, NodeRef},
};

/// An unconstrained node: any type name, any data, any children.
#[derive(Debug)]
pub(crate) struct DraftNode {
    type_name: String,
    data: String,
    fragment: Fragment,
    children: Vec<NodeRef>,
}

impl Node for DraftNode {
    fn node_type(&self) -> Arc<dyn NodeType> {
        Arc::new(DraftType {
            name: self.type_name.clone(),
        })
    }

    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn data(&self) -> &str {
        &self.data
    }

    fn fragment(&self) -> Fragment {
        self.fragment.clone()
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child(&self, index: usize) -> Option<NodeRef> {
        self.children.get(index).cloned()
    }
}

#[derive(Debug)]
struct DraftType {
    name: String,
}

impl NodeType for DraftType {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_builder(&self) -> Box<dyn Builder> {
        Box::new(DraftBuilder::new(self.name.clone()))
    }
}

pub(crate) struct DraftBuilder {
    type_name: String,
    data: String,
    fragment: Fragment,
    children: Vec<NodeRef>,
}

impl DraftBuilder {
    fn new(type_name: String) -> Self {
        Self {
            type_name,
            data: String::new(),
            fragment: Fragment::default(),
            children: Vec::new(),
        }
    }
}

impl Builder for DraftBuilder {
    fn set_fragment(&mut self, fragment: Fragment) {
        self.fragment = fragment;
    }

    fn set_data(&mut self, data: &str) -> bool {
        self.data = data.to_owned();
        true
    }

    fn set_children_list(&mut self, children: Vec<NodeRef>) -> bool {
        self.children = children;
        true
    }

    fn is_valid(&self) -> bool {
        true
    }

    fn create_node(self: Box<Self>) -> Option<NodeRef> {
        Some(Arc::new(DraftNode {
            type_name: self.type_name,
            data: self.data,
            fragment: self.fragment,
            children: self.children,
        }))
    }
}

/// A factory that knows every type name.
pub(crate) struct DraftFactory;

impl NodeFactory for DraftFactory {
    fn create_builder(&self, type_name: &str) -> Option<Box<dyn Builder>> {
        Some(Box::new(DraftBuilder::new(type_name.to_owned())))
    }
}

/// A node that insists on exactly two leaf children and no data, for
/// exercising builder rejections.
#[derive(Debug)]
pub(crate) struct PairNode {
    children: Vec<NodeRef>,
}

impl Node for PairNode {
    fn node_type(&self) -> Arc<dyn NodeType> {
        Arc::new(PairType)
    }

    fn type_name(&self) -> &str {
        "Pair"
    }

    fn data(&self) -> &str {
        ""
    }

    fn fragment(&self) -> Fragment {
        Fragment::default()
    }

    fn child_count(&self) -> usize {
        self.children.len()
    }

    fn child(&self, index: usize) -> Option<NodeRef> {
        self.children.get(index).cloned()
    }
}

#[derive(Debug)]
struct PairType;

impl NodeType for PairType {
    fn name(&self) -> &str {
        "Pair"
    }

    fn create_builder(&self) -> Box<dyn Builder> {
        Box::new(PairBuilder {
            children: Vec::new(),
        })
    }
}

struct PairBuilder {
    children: Vec<NodeRef>,
}

impl Builder for PairBuilder {
    fn set_fragment(&mut self, _fragment: Fragment) {}

    fn set_data(&mut self, data: &str) -> bool {
        data.is_empty()
    }

    fn set_children_list(&mut self, children: Vec<NodeRef>) -> bool {
        if children.len() == 2 && children.iter().all(|child| child.child_count() == 0) {
            self.children = children;
            true
        } else {
            false
        }
    }

    fn is_valid(&self) -> bool {
        self.children.len() == 2
    }

    fn create_node(self: Box<Self>) -> Option<NodeRef> {
        if self.is_valid() {
            Some(Arc::new(PairNode {
                children: self.children,
            }))
        } else {
            None
        }
    }
}

/// A valid strict pair, built through its own builder.
pub(crate) fn strict_pair(first: NodeRef, second: NodeRef) -> NodeRef {
    let mut builder = PairType.create_builder();
    assert!(builder.set_children_list(vec![first, second]));
    builder.create_node().expect("two leaf children form a valid pair")
}

/// A pair that violates its own type's constraints, constructed directly.
/// Its projections cannot be rebuilt through the pair builder.
pub(crate) fn invalid_pair(children: Vec<NodeRef>) -> NodeRef {
    Arc::new(PairNode { children })
}

/// A node delegating everything to a wrapped prototype.
#[derive(Debug)]
pub(crate) struct WrappedNode {
    prototype: NodeRef,
}

impl Node for WrappedNode {
    fn node_type(&self) -> Arc<dyn NodeType> {
        self.prototype.node_type()
    }

    fn type_name(&self) -> &str {
        self.prototype.type_name()
    }

    fn data(&self) -> &str {
        self.prototype.data()
    }

    fn fragment(&self) -> Fragment {
        self.prototype.fragment()
    }

    fn child_count(&self) -> usize {
        self.prototype.child_count()
    }

    fn child(&self, index: usize) -> Option<NodeRef> {
        self.prototype.child(index)
    }

    fn prototype(&self) -> Option<NodeRef> {
        Some(self.prototype.clone())
    }
}

/// Wrap a node into a prototype-based delegate.
pub(crate) fn wrap(node: &NodeRef) -> NodeRef {
    Arc::new(WrappedNode {
        prototype: node.clone(),
    })
}

/// Parse the `Type(data)[child, …]` shorthand into a draft tree:
/// `Add[Int(2), Int(3)]` is an `Add` node with two `Int` leaves.
pub(crate) fn parse(input: &str) -> NodeRef {
    let mut parser = ShorthandParser {
        input: input.as_bytes(),
        position: 0,
    };
    let node = parser.parse_node();
    parser.skip_whitespace();
    assert!(
        parser.position == parser.input.len(),
        "trailing input in tree literal: {input}"
    );
    node
}

struct ShorthandParser<'s> {
    input: &'s [u8],
    position: usize,
}

impl ShorthandParser<'_> {
    fn skip_whitespace(&mut self) {
        while self.peek() == Some(b' ') {
            self.position += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn expect(&mut self, byte: u8) {
        assert_eq!(self.peek(), Some(byte), "malformed tree literal");
        self.position += 1;
    }

    fn parse_node(&mut self) -> NodeRef {
        self.skip_whitespace();
        let start = self.position;
        while self
            .peek()
            .is_some_and(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
        {
            self.position += 1;
        }
        let type_name = std::str::from_utf8(&self.input[start..self.position])
            .expect("tree literals are ASCII");
        assert!(!type_name.is_empty(), "expected a type name");

        let mut data = String::new();
        if self.peek() == Some(b'(') {
            self.position += 1;
            let data_start = self.position;
            while self.peek().is_some_and(|byte| byte != b')') {
                self.position += 1;
            }
            data = std::str::from_utf8(&self.input[data_start..self.position])
                .expect("tree literals are ASCII")
                .to_owned();
            self.expect(b')');
        }

        let mut children = Vec::new();
        if self.peek() == Some(b'[') {
            self.position += 1;
            self.skip_whitespace();
            if self.peek() == Some(b']') {
                self.position += 1;
            } else {
                loop {
                    children.push(self.parse_node());
                    self.skip_whitespace();
                    match self.peek() {
                        Some(b',') => self.position += 1,
                        _ => break,
                    }
                }
                self.expect(b']');
            }
        }

        Arc::new(DraftNode {
            type_name: type_name.to_owned(),
            data,
            fragment: Fragment::default(),
            children,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::node::deep_equal;

    use super::*;

    #[test]
    fn shorthand_round_trip() {
        let tree = parse("Stmt[Call(f), Return[Int(0)]]");
        assert_eq!(tree.type_name(), "Stmt");
        assert_eq!(tree.child_count(), 2);

        let call = tree.child(0).unwrap();
        assert_eq!(call.type_name(), "Call");
        assert_eq!(call.data(), "f");
        assert_eq!(call.child_count(), 0);

        let ret = tree.child(1).unwrap();
        assert_eq!(ret.child(0).unwrap().data(), "0");
    }

    #[test]
    fn shorthand_leaves_and_empty_lists() {
        assert!(deep_equal(parse("A").as_ref(), parse("A[]").as_ref()));
        assert_eq!(parse("A").data(), "");
    }

    #[test]
    fn strict_pair_enforces_its_shape() {
        let pair = strict_pair(parse("A"), parse("B"));
        assert_eq!(pair.type_name(), "Pair");

        let mut builder = pair.node_type().create_builder();
        assert!(!builder.set_children_list(vec![parse("A")]));
        assert!(!builder.set_children_list(vec![parse("A"), parse("B[C]")]));
        assert!(!builder.set_data("x"));
        assert!(!builder.is_valid());
    }
}
