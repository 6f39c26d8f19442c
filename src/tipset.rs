//! Per-node tip sets for bipartition matching.
//!
//! # Overview
//! `TipSets` captures, for every node of a tree, the set of tip names below
//! it as a compact bitset. The whole table is filled in one bottom-up
//! traversal, so asking "which tips sit under node N" is O(words) per node
//! instead of a fresh subtree scan, keeping a full-tree bipartition search
//! near O(n) rather than O(n²).
//!
//! # Why tip NAMES, not node ids
//! Node ids are an artifact of parsing and differ between independently
//! built trees. Tip names are the shared vocabulary. Names are sorted
//! before being assigned bit positions so that equal name sets always map
//! to equal bitsets, whatever order the tips appear in.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::bitset::Bitset;
use crate::tree::{NodeId, Tree};

/// Two tips share a name; tip-set comparison would be ill-defined.
#[derive(Debug, Error)]
#[error("duplicate tip name `{0}` in tree")]
pub struct DuplicateTipName(pub String);

/// Tip-set table for one tree.
///
/// Indexed by `NodeId`; detached arena slots keep an all-zero set.
#[derive(Debug, Clone)]
pub struct TipSets {
    /// tip name → bit index, positions assigned in sorted-name order
    index: HashMap<String, usize>,

    /// per-node tip sets, indexed by `NodeId`
    sets: Vec<Bitset>,

    /// number of u64 words per bitset
    words: usize,
}

impl TipSets {
    /// Build the table for every node reachable from `tree`'s root.
    ///
    /// # Algorithm
    /// 1. Collect tip names and sort them; sorted position = bit index.
    /// 2. Walk the tree with an explicit stack, children before parents.
    /// 3. A tip contributes its own bit; an internal node ORs its
    ///    children's sets.
    ///
    /// Unnamed tips get no bit: they cannot be referenced by name, so they
    /// stay invisible to set comparisons, which is exactly the unannotated
    /// behavior callers want.
    ///
    /// # Errors
    /// Returns [`DuplicateTipName`] when two tips carry the same name.
    pub fn from_tree(tree: &Tree) -> Result<Self, DuplicateTipName> {
        let mut names: Vec<String> = tree
            .tips(tree.root())
            .filter_map(|id| tree.node(id).name.clone())
            .collect();
        names.sort();
        for pair in names.windows(2) {
            if pair[0] == pair[1] {
                return Err(DuplicateTipName(pair[0].clone()));
            }
        }

        let num_tips = names.len();
        let words = num_tips.div_ceil(64).max(1);
        let index: HashMap<String, usize> = names
            .into_iter()
            .enumerate()
            .map(|(bit, name)| (name, bit))
            .collect();

        let mut sets = vec![Bitset::zeros(words); tree.len()];
        // post-order via a (node, children-done) stack
        let mut stack = vec![(tree.root(), false)];
        while let Some((id, ready)) = stack.pop() {
            let node = tree.node(id);
            if node.is_tip() {
                let mut bs = Bitset::zeros(words);
                if let Some(name) = &node.name {
                    if let Some(&bit) = index.get(name) {
                        bs.set(bit);
                    }
                }
                sets[id] = bs;
            } else if ready {
                let mut bs = Bitset::zeros(words);
                for &child in &node.children {
                    bs.or_assign(&sets[child]);
                }
                sets[id] = bs;
            } else {
                stack.push((id, true));
                for &child in &node.children {
                    stack.push((child, false));
                }
            }
        }

        Ok(TipSets { index, sets, words })
    }

    /// The tip set below `id`.
    pub fn set(&self, id: NodeId) -> &Bitset {
        &self.sets[id]
    }

    /// Whether `name` is a known tip of the underlying tree.
    pub fn contains_name(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of named tips.
    pub fn num_tips(&self) -> usize {
        self.index.len()
    }

    /// Bitset for an arbitrary collection of tip names.
    ///
    /// Names unknown to this tree are ignored; callers that care check
    /// coverage with [`TipSets::contains_name`] first.
    pub fn bitset_for_names(&self, names: &HashSet<String>) -> Bitset {
        let mut bs = Bitset::zeros(self.words);
        for name in names {
            if let Some(&bit) = self.index.get(name) {
                bs.set(bit);
            }
        }
        bs
    }
}
