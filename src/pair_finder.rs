use itertools::Itertools;

use crate::{ext_node::ExtNode, section::Section};

/// Which cached hash sibling pairs are compared by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKey {
    /// Whole-subtree identity: pairs are structurally identical trees.
    AbsoluteHash,
    /// Type-and-data identity only, ignoring children. Pairs up the roots of
    /// subtrees whose contents diverged.
    LocalHash,
}

impl MatchKey {
    fn of(self, node: &ExtNode<'_>) -> u64 {
        match self {
            Self::AbsoluteHash => node.hash,
            Self::LocalHash => node.local_hash,
        }
    }
}

/// A contiguous run of sibling pairs agreeing pairwise on a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairRun {
    /// Offset of the run in the section's left list.
    pub left: usize,
    /// Offset of the run in the section's right list.
    pub right: usize,
    /// The number of pairs in the run, always positive.
    pub count: usize,
}

/// Finds the longest contiguous run of key-equal sibling pairs in a section:
/// the classic longest-common-substring dynamic program, over two sequences
/// of 64-bit keys instead of characters.
pub struct NodePairFinder<'a, 'b> {
    section: &'b Section<'a>,
    key: MatchKey,
}

impl<'a, 'b> NodePairFinder<'a, 'b> {
    pub fn new(section: &'b Section<'a>, key: MatchKey) -> Self {
        Self { section, key }
    }

    /// The best run, or `None` when no pair of siblings agrees on the key.
    /// Ties are broken towards the smallest offset sum `left + right`, then
    /// the smallest `left`.
    pub fn find(&self) -> Option<PairRun> {
        let left_keys = self.section.left.iter().map(|node| self.key.of(node)).collect_vec();
        let right_keys = self.section.right.iter().map(|node| self.key.of(node)).collect_vec();

        let mut best: Option<PairRun> = None;
        // lengths[j]: length of the key-equal run ending at the current left
        // position and at right position j
        let mut lengths = vec![0_usize; right_keys.len()];
        for (i, left_key) in left_keys.iter().enumerate() {
            let mut previous_diagonal = 0;
            for (j, right_key) in right_keys.iter().enumerate() {
                let above = lengths[j];
                lengths[j] = if left_key == right_key {
                    previous_diagonal + 1
                } else {
                    0
                };
                previous_diagonal = above;
                if lengths[j] > 0 {
                    let candidate = PairRun {
                        left: i + 1 - lengths[j],
                        right: j + 1 - lengths[j],
                        count: lengths[j],
                    };
                    if Self::improves(candidate, best) {
                        best = Some(candidate);
                    }
                }
            }
        }
        best
    }

    fn improves(candidate: PairRun, best: Option<PairRun>) -> bool {
        match best {
            None => true,
            Some(best) => {
                candidate.count > best.count
                    || (candidate.count == best.count
                        && (candidate.left + candidate.right, candidate.left)
                            < (best.left + best.right, best.left))
            }
        }
    }
}
