use std::collections::VecDeque;

use crate::{ext_node::ExtNode, pair_finder::PairRun};

/// A pair of contiguous runs of still-unmatched siblings under two matched
/// parents.
#[derive(Debug)]
pub struct Section<'a> {
    /// Unmatched children of the left parent, in order.
    pub left: Vec<&'a ExtNode<'a>>,
    /// Unmatched children of the right parent, in order.
    pub right: Vec<&'a ExtNode<'a>>,
    /// The left-tree sibling just before this section, `None` at the head of
    /// the child list. Seeds the `after` chain when the section turns out to
    /// be a pure insertion run.
    pub anchor: Option<&'a ExtNode<'a>>,
}

impl<'a> Section<'a> {
    /// A section spanning all children of both parents.
    pub fn new(left: &'a ExtNode<'a>, right: &'a ExtNode<'a>) -> Self {
        Self {
            left: left.children.clone(),
            right: right.children.clone(),
            anchor: None,
        }
    }

    /// Whether the left run still holds this node.
    pub fn contains_left(&self, node: &'a ExtNode<'a>) -> bool {
        self.left.contains(&node)
    }

    /// Whether the right run still holds this node.
    pub fn contains_right(&self, node: &'a ExtNode<'a>) -> bool {
        self.right.contains(&node)
    }

    fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

/// The still-unmatched portions of two matched parents' child lists, as an
/// ordered sequence of sections.
///
/// At any point, the union of the pending sections' left (resp. right) runs
/// equals the left (resp. right) parent's children minus the already matched
/// nodes, order preserved. Removing a matched run splits its section in two.
#[derive(Debug, Default)]
pub struct Unprocessed<'a> {
    sections: VecDeque<Section<'a>>,
}

impl<'a> Unprocessed<'a> {
    /// Bookkeeping for the children of two parents, starting with a single
    /// section spanning everything (or none, if both are leaves).
    pub fn new(left: &'a ExtNode<'a>, right: &'a ExtNode<'a>) -> Self {
        let section = Section::new(left, right);
        let mut sections = VecDeque::new();
        if !section.is_empty() {
            sections.push_back(section);
        }
        Self { sections }
    }

    /// Take the first pending section.
    pub fn pop(&mut self) -> Option<Section<'a>> {
        self.sections.pop_front()
    }

    /// Put back what remains of a section around a matched run: the part
    /// before the run, then the part after it, both in front of any other
    /// pending section. The trailing part is anchored on the last matched
    /// left node.
    pub fn push_split(&mut self, section: Section<'a>, run: &PairRun) {
        let Section {
            left,
            right,
            anchor,
        } = section;
        let last_matched = left[run.left + run.count - 1];

        let trailing = Section {
            left: left[run.left + run.count..].to_vec(),
            right: right[run.right + run.count..].to_vec(),
            anchor: Some(last_matched),
        };
        let leading = Section {
            left: left[..run.left].to_vec(),
            right: right[..run.right].to_vec(),
            anchor,
        };

        if !trailing.is_empty() {
            self.sections.push_front(trailing);
        }
        if !leading.is_empty() {
            self.sections.push_front(leading);
        }
    }

    /// The number of pending sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether every section has been resolved.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Iterate over the pending sections, in processing order.
    pub fn iter(&self) -> impl Iterator<Item = &Section<'a>> {
        self.sections.iter()
    }
}

#[cfg(test)]
mod tests {
    use typed_arena::Arena;

    use crate::pair_finder::PairRun;
    use crate::test_utils::parse;

    use super::*;

    #[test]
    fn initial_section_spans_all_children() {
        let arena = Arena::new();
        let left = ExtNode::build(&parse("List[A, B, C]"), &arena);
        let right = ExtNode::build(&parse("List[A, C]"), &arena);

        let mut unprocessed = Unprocessed::new(left, right);
        assert_eq!(unprocessed.len(), 1);

        let section = unprocessed.pop().unwrap();
        assert_eq!(section.left, left.children);
        assert_eq!(section.right, right.children);
        assert_eq!(section.anchor, None);
        assert!(section.contains_left(left.child(1).unwrap()));
        assert!(!section.contains_right(left.child(1).unwrap()));
        assert!(unprocessed.is_empty());
    }

    #[test]
    fn leaf_parents_need_no_section() {
        let arena = Arena::new();
        let left = ExtNode::build(&parse("Int(2)"), &arena);
        let right = ExtNode::build(&parse("Int(2)"), &arena);

        let mut unprocessed = Unprocessed::new(left, right);
        assert!(unprocessed.is_empty());
        assert!(unprocessed.pop().is_none());
    }

    #[test]
    fn splitting_around_a_matched_run() {
        let arena = Arena::new();
        let left = ExtNode::build(&parse("List[A, B, C, D]"), &arena);
        let right = ExtNode::build(&parse("List[X, B, C, Y]"), &arena);

        let mut unprocessed = Unprocessed::new(left, right);
        let section = unprocessed.pop().unwrap();
        // B and C matched at offset 1 on both sides
        unprocessed.push_split(
            section,
            &PairRun {
                left: 1,
                right: 1,
                count: 2,
            },
        );

        assert_eq!(unprocessed.len(), 2);
        let leading = unprocessed.pop().unwrap();
        assert_eq!(leading.left, vec![left.child(0).unwrap()]);
        assert_eq!(leading.right, vec![right.child(0).unwrap()]);
        assert_eq!(leading.anchor, None);

        let trailing = unprocessed.pop().unwrap();
        assert_eq!(trailing.left, vec![left.child(3).unwrap()]);
        assert_eq!(trailing.right, vec![right.child(3).unwrap()]);
        // anchored on C, the last matched left node
        assert_eq!(trailing.anchor, Some(left.child(2).unwrap()));
    }

    #[test]
    fn splits_preserve_the_unmatched_residue_in_order() {
        let arena = Arena::new();
        let left = ExtNode::build(&parse("List[A, B, C, D, E]"), &arena);
        let right = ExtNode::build(&parse("List[A, X, C, D, Y]"), &arena);

        let mut unprocessed = Unprocessed::new(left, right);
        let section = unprocessed.pop().unwrap();
        // C and D matched at offset 2 on both sides
        unprocessed.push_split(
            section,
            &PairRun {
                left: 2,
                right: 2,
                count: 2,
            },
        );

        let remaining_left: Vec<_> = unprocessed
            .iter()
            .flat_map(|section| section.left.iter().copied())
            .collect();
        let remaining_right: Vec<_> = unprocessed
            .iter()
            .flat_map(|section| section.right.iter().copied())
            .collect();

        // everything but the matched run, original order preserved
        assert_eq!(
            remaining_left,
            vec![
                left.child(0).unwrap(),
                left.child(1).unwrap(),
                left.child(4).unwrap()
            ]
        );
        assert_eq!(
            remaining_right,
            vec![
                right.child(0).unwrap(),
                right.child(1).unwrap(),
                right.child(4).unwrap()
            ]
        );
    }

    #[test]
    fn empty_remainders_are_dropped() {
        let arena = Arena::new();
        let left = ExtNode::build(&parse("List[A, B]"), &arena);
        let right = ExtNode::build(&parse("List[A, B]"), &arena);

        let mut unprocessed = Unprocessed::new(left, right);
        let section = unprocessed.pop().unwrap();
        unprocessed.push_split(
            section,
            &PairRun {
                left: 0,
                right: 0,
                count: 2,
            },
        );

        assert!(unprocessed.is_empty());
    }
}
