use std::time::Instant;

use log::debug;
use thiserror::Error;

use crate::{
    ext_node::ExtNode,
    mapping::{Insertion, Mapping},
    pair_finder::{MatchKey, NodePairFinder},
    section::{Section, Unprocessed},
};

/// The mapper could not make progress: some pending section had unmatched
/// children on both sides, none of which agree on the absolute hash. This
/// surfaces as an error rather than a partial result, since the relation
/// tables would be left incomplete.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot map the children of {left} against {right}: the remaining siblings share no subtree")]
pub struct MappingError {
    left: String,
    right: String,
}

impl MappingError {
    fn stuck(left: &ExtNode<'_>, right: &ExtNode<'_>) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
        }
    }
}

/// Top-down structural mapper.
///
/// Starting from the two roots, subtrees with equal absolute hashes are
/// paired wholesale; nodes with equal local hashes are paired and their
/// child lists reconciled section by section, matching identical sibling
/// runs and classifying the residue as insertions or deletions. Roots that
/// agree on neither hash are recorded as a replacement, with both subtrees
/// acknowledged as unmatched.
#[derive(Debug, Default)]
pub struct TopDownMapper;

impl TopDownMapper {
    pub fn new() -> Self {
        Self
    }

    /// Map `left` against `right`, producing the full node relation and the
    /// edit script turning the left tree into the right one.
    pub fn map<'a>(
        &self,
        left: &'a ExtNode<'a>,
        right: &'a ExtNode<'a>,
    ) -> Result<Mapping<'a>, MappingError> {
        let start = Instant::now();
        let mut mapping = Mapping::new();
        if !Self::map_subtrees(left, right, &mut mapping)? {
            mapping.add_replacement(left, right);
            for node in left.dfs() {
                mapping.acknowledge_left(node);
            }
            for node in right.dfs() {
                mapping.acknowledge_right(node);
            }
        }
        debug!(
            "mapped {} against {} nodes in {:?}: {} pairs, {} inserted, {} deleted",
            left.size(),
            right.size(),
            start.elapsed(),
            mapping.len(),
            mapping.inserted().len(),
            mapping.deleted().count(),
        );
        Ok(mapping)
    }

    /// Tries to pair two subtrees at their roots; returns whether it could.
    fn map_subtrees<'a>(
        left: &'a ExtNode<'a>,
        right: &'a ExtNode<'a>,
        mapping: &mut Mapping<'a>,
    ) -> Result<bool, MappingError> {
        if left.hash == right.hash {
            Self::map_identical(left, right, mapping);
            Ok(true)
        } else if left.local_hash == right.local_hash {
            Self::map_by_section(left, right, mapping)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Pair two structurally identical subtrees, recursively. The child
    /// counts agree by construction since the absolute hashes do.
    fn map_identical<'a>(
        left: &'a ExtNode<'a>,
        right: &'a ExtNode<'a>,
        mapping: &mut Mapping<'a>,
    ) {
        mapping.add(left, right);
        for (left_child, right_child) in left
            .children
            .iter()
            .copied()
            .zip(right.children.iter().copied())
        {
            Self::map_identical(left_child, right_child, mapping);
        }
    }

    /// Pair two nodes agreeing on their local hash only, and reconcile their
    /// child lists section by section, leftmost sections first.
    fn map_by_section<'a>(
        left: &'a ExtNode<'a>,
        right: &'a ExtNode<'a>,
        mapping: &mut Mapping<'a>,
    ) -> Result<(), MappingError> {
        mapping.add(left, right);
        let mut unprocessed = Unprocessed::new(left, right);
        while let Some(section) = unprocessed.pop() {
            if section.left.is_empty() {
                Self::insert_all(&section, left, mapping);
            } else if section.right.is_empty() {
                Self::delete_all(&section, mapping);
            } else {
                let run = NodePairFinder::new(&section, MatchKey::AbsoluteHash).find();
                match run {
                    Some(run) => {
                        for offset in 0..run.count {
                            Self::map_identical(
                                section.left[run.left + offset],
                                section.right[run.right + offset],
                                mapping,
                            );
                        }
                        unprocessed.push_split(section, &run);
                    }
                    None => return Err(MappingError::stuck(left, right)),
                }
            }
        }
        Ok(())
    }

    /// Record every node of a right-only section as inserted under `parent`,
    /// chaining the `after` anchors so the right-tree order is preserved.
    fn insert_all<'a>(section: &Section<'a>, parent: &'a ExtNode<'a>, mapping: &mut Mapping<'a>) {
        let mut after = section.anchor;
        for node in section.right.iter().copied() {
            mapping.add_insertion(Insertion {
                node,
                parent,
                after,
            });
            for descendant in node.dfs() {
                mapping.acknowledge_right(descendant);
            }
            after = Some(node);
        }
    }

    /// Record every node of a left-only section as deleted.
    fn delete_all<'a>(section: &Section<'a>, mapping: &mut Mapping<'a>) {
        for node in section.left.iter().copied() {
            mapping.add_deletion(node);
            for descendant in node.dfs() {
                mapping.acknowledge_left(descendant);
            }
        }
    }
}
