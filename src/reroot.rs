//! The tree rerooting engine.
//!
//! # Overview
//! Two independent algorithms on top of the tree model:
//!
//! 1. **Longest-branch rerooting**: convert an unrooted topology (an n-ary
//!    "root") into a rooted binary tree by placing the root at the midpoint
//!    of the longest root-incident branch.
//!
//! 2. **Reference-guided rerooting**: transplant the root position implied
//!    by a second, already-rooted tree that shares some but not all taxa.
//!    The reference root's bipartition is located in the target as a single
//!    edge; tips the reference does not know about ride with whichever side
//!    they are nested under.
//!
//! Both algorithms are pure: they take `&Tree` and return a freshly built
//! `Tree`, never mutating their inputs, so repeated calls on the same tree
//! cannot alias or interfere.
//!
//! # Branch-length bookkeeping
//! The reference-guided restructure keeps the matched clade's edge length
//! unchanged (it is a real, measured distance) and attaches the rest of
//! the tree with length 0 (its top-level attachment point has no
//! independent meaning once the root has moved). When the matched clade is
//! a direct child of a bifurcating root the detach would leave a unary
//! root; the collapsed edge length is credited to the matched side.

use thiserror::Error;

use crate::tipset::{DuplicateTipName, TipSets};
use crate::tree::{Node, NodeId, Tree, add_lengths};

/// Failure modes of the rerooting engine.
///
/// [`RerootError::Paraphyletic`] is the only error expected in normal
/// operation (conflicting reference and target topologies); the other
/// variants are precondition violations. Callers that batch over many
/// trees typically skip paraphyletic ones and abort on everything else.
#[derive(Debug, Error)]
pub enum RerootError {
    /// Longest-branch rerooting needs at least two root-incident branches.
    #[error("cannot reroot: the tree root has {0} children, need at least 2")]
    DegenerateRoot(usize),

    /// The reference root must define a bipartition.
    #[error("reference root must split the taxa into exactly 2 clades, found {0} children")]
    ReferenceNotBifurcating(usize),

    /// The target does not contain every reference tip.
    #[error("target tree is missing reference tips: {}", .0.join(", "))]
    MissingReferenceTips(Vec<String>),

    /// Tip names are not unique, so tip-set comparison is ill-defined.
    #[error(transparent)]
    DuplicateTip(#[from] DuplicateTipName),

    /// No single target edge cleanly separates the two reference clades.
    #[error("reference bipartition cannot be induced on the target tree (paraphyletic)")]
    Paraphyletic,
}

/// Which reference clade a matched target node corresponds to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    /// `reference.children[0]`
    Left,
    /// `reference.children[1]`
    Right,
}

fn edge_or_zero(tree: &Tree, id: NodeId) -> f64 {
    tree.node(id).parent_edge.unwrap_or(0.0)
}

/// Reroot `tree` at the midpoint of the longest root-incident branch.
///
/// The returned tree has a binary root named `root` (length 0): one child
/// is the longest-branch clade, the other groups every remaining
/// root-incident clade, each side carrying half the longest branch.
/// Ties on the maximal length go to the earliest child; the remaining
/// clades keep their internal structure and branch lengths unchanged.
///
/// When the input root has exactly two children the grouping node would be
/// unary, so the lone remaining child is attached directly with the half
/// length added to its own; point-to-point path lengths are conserved
/// either way.
///
/// # Errors
/// [`RerootError::DegenerateRoot`] when the root has fewer than two
/// children.
pub fn reroot_by_longest_branch(tree: &Tree) -> Result<Tree, RerootError> {
    let root = tree.root();
    let children = tree.node(root).children.clone();
    if children.len() < 2 {
        return Err(RerootError::DegenerateRoot(children.len()));
    }

    let mut work = tree.clone();
    // strict comparison keeps the first of equally long branches
    let mut longest = children[0];
    for &child in &children[1..] {
        if edge_or_zero(&work, child) > edge_or_zero(&work, longest) {
            longest = child;
        }
    }
    let half = edge_or_zero(&work, longest) / 2.0;

    work.detach(longest);
    let rest = work.node(root).children.clone();
    for &child in &rest {
        work.detach(child);
    }

    let new_root = work.add_node(Node::new(Some("root".to_string()), Some(0.0)));
    if rest.len() == 1 {
        let only = rest[0];
        let merged = add_lengths(work.node(only).parent_edge, Some(half));
        work.graft(new_root, only, merged);
    } else {
        let group = work.add_node(Node::internal(None));
        for &child in &rest {
            let edge = work.node(child).parent_edge;
            work.graft(group, child, edge);
        }
        work.graft(new_root, group, Some(half));
    }
    work.graft(new_root, longest, Some(half));
    work.set_root(new_root);
    Ok(work)
}

/// Reroot `target` so that its root reproduces `reference`'s root
/// bipartition.
///
/// `reference` must have a bifurcating root; its two children define the
/// clades `R0` and `R1` over the reference tip names. `target`'s tip set
/// must cover the reference's, and may be larger: unannotated tips fall on
/// whichever side of the split they are nested under.
///
/// A target node matches a clade when its tip set contains the whole clade
/// and none of the other clade. Candidates are scanned in preorder and the
/// first match wins; every valid match induces the same bipartition over
/// the annotated tips, preorder just makes the choice deterministic.
///
/// The matched subtree keeps its original branch length; the rest of the
/// tree, re-rooted at the matched node's former parent and repaired with
/// unary collapse, is attached with length 0. On the new root (named
/// `root`, no length), position 0 corresponds to `reference.children[1]`
/// and position 1 to `reference.children[0]`; consumers rely on this
/// ordering.
///
/// # Errors
/// - [`RerootError::ReferenceNotBifurcating`] when the reference root does
///   not have exactly two children.
/// - [`RerootError::MissingReferenceTips`] when the target lacks reference
///   tips.
/// - [`RerootError::DuplicateTip`] when target tip names collide.
/// - [`RerootError::Paraphyletic`] when no single target edge separates
///   the two reference clades.
pub fn reroot_by_tree(reference: &Tree, target: &Tree) -> Result<Tree, RerootError> {
    let ref_children = &reference.node(reference.root()).children;
    if ref_children.len() != 2 {
        return Err(RerootError::ReferenceNotBifurcating(ref_children.len()));
    }
    let left_names = reference.tip_name_set(ref_children[0]);
    let right_names = reference.tip_name_set(ref_children[1]);

    let sets = TipSets::from_tree(target)?;
    let mut missing: Vec<String> = left_names
        .union(&right_names)
        .filter(|name| !sets.contains_name(name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(RerootError::MissingReferenceTips(missing));
    }

    let left = sets.bitset_for_names(&left_names);
    let right = sets.bitset_for_names(&right_names);

    // first preorder match wins; skip(1) drops the root itself
    let mut matched = None;
    for id in target.descendants(target.root()).skip(1) {
        let s = sets.set(id);
        if s.contains_all(&left) && s.is_disjoint(&right) {
            matched = Some((id, Side::Left));
            break;
        }
        if s.contains_all(&right) && s.is_disjoint(&left) {
            matched = Some((id, Side::Right));
            break;
        }
    }
    let (anchor, side) = matched.ok_or(RerootError::Paraphyletic)?;

    let mut work = target.clone();
    let old_root = work.root();
    let parent = work.node(anchor).parent.expect("matched node is not the root");
    let anchor_edge = work.node(anchor).parent_edge;

    let (anchor_edge, remainder) = if parent == old_root && work.node(old_root).children.len() == 2
    {
        // Detaching the anchor would leave the root unary; the collapsed
        // edge length is credited to the anchor side.
        let sibling = work
            .node(old_root)
            .children
            .iter()
            .copied()
            .find(|&c| c != anchor)
            .expect("bifurcating root has a second child");
        let sibling_edge = work.node(sibling).parent_edge;
        work.detach(anchor);
        work.detach(sibling);
        (add_lengths(anchor_edge, sibling_edge), sibling)
    } else {
        work.detach(anchor);
        work.reroot_at(parent);
        work.collapse_if_unary(old_root);
        (anchor_edge, parent)
    };

    let new_root = work.add_node(Node::new(Some("root".to_string()), None));
    match side {
        // position 0 carries the clade of reference.children[1]
        Side::Left => {
            work.graft(new_root, remainder, Some(0.0));
            work.graft(new_root, anchor, anchor_edge);
        }
        Side::Right => {
            work.graft(new_root, anchor, anchor_edge);
            work.graft(new_root, remainder, Some(0.0));
        }
    }
    work.set_root(new_root);
    Ok(work)
}

/// Backward-compatible entry point used by the older annotation step.
///
/// Identical contract and output as [`reroot_by_tree`], with the arguments
/// in the legacy (old rooted tree, tree to reroot) order.
pub fn reroot_tree_by_old_root(old_tree: &Tree, tree: &Tree) -> Result<Tree, RerootError> {
    reroot_by_tree(old_tree, tree)
}
