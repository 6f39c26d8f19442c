//! Arena-based phylogenetic tree model.
//!
//! # Overview
//! Nodes live in a flat `Vec` and refer to each other by index (`NodeId`),
//! so parent back-references never create ownership cycles and upward
//! traversal stays cheap. A `Tree` is one designated root plus everything
//! reachable from it; detached subtrees stay addressable by their own root
//! id inside the same arena until they are grafted back (or dropped with
//! the arena).
//!
//! # Branch lengths
//! `parent_edge` is the length of the edge *above* a node. `None` means the
//! source Newick carried no length for that edge; arithmetic treats `None`
//! as 0 but never invents a length where both operands were absent.
//!
//! # Traversal
//! All traversals are iterative with an explicit stack. Real phylogenies
//! run to thousands of tips and recursion depth tracks tree depth.

use std::collections::HashSet;

/// Index of a node inside a [`Tree`] arena.
pub type NodeId = usize;

/// A tree vertex: tip or internal node.
///
/// Tip nodes carry a `name` (unique within a tree); internal names are
/// optional and purely advisory.
#[derive(Debug, Clone, Default)]
pub struct Node {
    /// Optional label. Required and unique on tips.
    pub name: Option<String>,

    /// Back-reference to the parent, absent on a root.
    pub parent: Option<NodeId>,

    /// Ordered child list. Order is meaningful and preserved by every
    /// mutation primitive.
    pub children: Vec<NodeId>,

    /// Length of the edge connecting this node to its parent.
    pub parent_edge: Option<f64>,
}

impl Node {
    /// Create an unattached node with the given label and edge length.
    pub fn new(name: Option<String>, parent_edge: Option<f64>) -> Self {
        Node {
            name,
            parent: None,
            children: Vec::new(),
            parent_edge,
        }
    }

    /// Convenience constructor for a named tip.
    pub fn tip(name: impl Into<String>, parent_edge: Option<f64>) -> Self {
        Node::new(Some(name.into()), parent_edge)
    }

    /// Convenience constructor for an unnamed internal node.
    pub fn internal(parent_edge: Option<f64>) -> Self {
        Node::new(None, parent_edge)
    }

    /// A node with no children is a tip (leaf).
    pub fn is_tip(&self) -> bool {
        self.children.is_empty()
    }
}

/// Sum of two optional branch lengths.
///
/// `None` acts as 0, but the result is `None` only when both sides were
/// absent, so collapsing unannotated edges does not fabricate lengths.
pub(crate) fn add_lengths(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (None, None) => None,
        _ => Some(a.unwrap_or(0.0) + b.unwrap_or(0.0)),
    }
}

/// A rooted, n-ary, labeled, weighted tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Create a tree consisting of the given root node.
    pub fn with_root(node: Node) -> Self {
        Tree {
            nodes: vec![node],
            root: 0,
        }
    }

    /// The current root id.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of arena slots (attached and detached nodes alike).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the arena holds no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Shared access to a node.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Mutable access to a node.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Insert an unattached node into the arena and return its id.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    /// Insert `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.add_node(node);
        self.nodes[id].parent = Some(parent);
        self.nodes[parent].children.push(id);
        id
    }

    /// Declare `id` the root of the tree. The node must be unattached.
    pub fn set_root(&mut self, id: NodeId) {
        debug_assert!(self.nodes[id].parent.is_none(), "root must have no parent");
        self.root = id;
    }

    /// Lazy preorder iterator over `id` and all its descendants.
    ///
    /// Each call returns a fresh, restartable iterator; children are
    /// visited in child-list order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// Lazy iterator over the tips (leaves) under `id`.
    pub fn tips(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(id)
            .filter(|&n| self.nodes[n].children.is_empty())
    }

    /// Lazy iterator over the internal nodes under `id`, `id` included
    /// when it is internal.
    pub fn non_tips(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(id)
            .filter(|&n| !self.nodes[n].children.is_empty())
    }

    /// The set of tip names under `id`.
    ///
    /// Runs in time proportional to the subtree size. Unnamed tips are
    /// skipped.
    pub fn tip_name_set(&self, id: NodeId) -> HashSet<String> {
        self.tips(id)
            .filter_map(|n| self.nodes[n].name.clone())
            .collect()
    }

    /// Remove `id` (with its whole subtree) from its parent.
    ///
    /// The former parent keeps its remaining children in order. The
    /// subtree stays in the arena, rooted at `id`, ready to be grafted
    /// elsewhere. Detaching a root is a no-op.
    pub fn detach(&mut self, id: NodeId) -> NodeId {
        if let Some(parent) = self.nodes[id].parent.take() {
            let siblings = &mut self.nodes[parent].children;
            if let Some(pos) = siblings.iter().position(|&c| c == id) {
                siblings.remove(pos);
            }
        }
        id
    }

    /// Attach `child` under `parent` with the given branch length.
    pub fn graft(&mut self, parent: NodeId, child: NodeId, branch_length: Option<f64>) {
        debug_assert!(self.nodes[child].parent.is_none(), "graft of an attached node");
        debug_assert!(branch_length.is_none_or(|l| l >= 0.0));
        self.nodes[child].parent = Some(parent);
        self.nodes[child].parent_edge = branch_length;
        self.nodes[parent].children.push(child);
    }

    /// Splice out `id` if it is a non-root internal node left with exactly
    /// one child, then repeat up the parent chain.
    ///
    /// The single child is reattached in the removed node's position among
    /// its siblings with the two edge lengths summed, so point-to-point
    /// path lengths are conserved. The root is never spliced; what a unary
    /// root means is the caller's decision.
    pub fn collapse_if_unary(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(node_id) = cur {
            let parent = self.nodes[node_id].parent;
            if node_id != self.root && self.nodes[node_id].children.len() == 1 {
                let parent_id = parent.expect("non-root node has a parent");
                let child = self.nodes[node_id].children[0];
                let merged =
                    add_lengths(self.nodes[child].parent_edge, self.nodes[node_id].parent_edge);
                let pos = self.nodes[parent_id]
                    .children
                    .iter()
                    .position(|&c| c == node_id)
                    .expect("node listed under its parent");
                self.nodes[parent_id].children[pos] = child;
                self.nodes[child].parent = Some(parent_id);
                self.nodes[child].parent_edge = merged;
                self.nodes[node_id].children.clear();
                self.nodes[node_id].parent = None;
            }
            cur = parent;
        }
    }

    /// Re-orient the tree so that `id` becomes the root.
    ///
    /// Every parent link on the path from `id` to the old root is
    /// reversed, and each reversed edge keeps its length (now stored on
    /// the former parent). Path lengths between any two attached nodes
    /// are unchanged. The old root may come out unary; callers repair it
    /// with [`Tree::collapse_if_unary`].
    pub fn reroot_at(&mut self, id: NodeId) {
        let mut path = vec![id];
        let mut cur = id;
        while let Some(p) = self.nodes[cur].parent {
            path.push(p);
            cur = p;
        }
        // original edge lengths along the path, captured before any flip
        let edges: Vec<Option<f64>> = path.iter().map(|&n| self.nodes[n].parent_edge).collect();
        for i in 0..path.len() - 1 {
            let (child, parent) = (path[i], path[i + 1]);
            let pos = self.nodes[parent]
                .children
                .iter()
                .position(|&c| c == child)
                .expect("node listed under its parent");
            self.nodes[parent].children.remove(pos);
            self.nodes[parent].parent = Some(child);
            self.nodes[parent].parent_edge = edges[i];
            self.nodes[child].children.push(parent);
        }
        self.nodes[id].parent = None;
        self.nodes[id].parent_edge = None;
        self.root = id;
    }
}

/// Preorder traversal state. See [`Tree::descendants`].
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let node = &self.tree.nodes[id];
        self.stack.extend(node.children.iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ((A:1,B:2):3,C:4)
    fn small_tree() -> (Tree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = Tree::with_root(Node::internal(None));
        let x = tree.add_child(tree.root(), Node::internal(Some(3.0)));
        let a = tree.add_child(x, Node::tip("A", Some(1.0)));
        let b = tree.add_child(x, Node::tip("B", Some(2.0)));
        let c = tree.add_child(tree.root(), Node::tip("C", Some(4.0)));
        (tree, x, a, b, c)
    }

    #[test]
    fn preorder_visits_children_in_order() {
        let (tree, x, a, b, c) = small_tree();
        let order: Vec<NodeId> = tree.descendants(tree.root()).collect();
        assert_eq!(order, vec![tree.root(), x, a, b, c]);
    }

    #[test]
    fn tips_and_non_tips_partition_the_subtree() {
        let (tree, x, a, b, c) = small_tree();
        let tips: Vec<NodeId> = tree.tips(tree.root()).collect();
        let inner: Vec<NodeId> = tree.non_tips(tree.root()).collect();
        assert_eq!(tips, vec![a, b, c]);
        assert_eq!(inner, vec![tree.root(), x]);
    }

    #[test]
    fn tip_name_set_covers_the_subtree_only() {
        let (tree, x, _, _, _) = small_tree();
        let names = tree.tip_name_set(x);
        assert_eq!(names.len(), 2);
        assert!(names.contains("A") && names.contains("B"));
    }

    #[test]
    fn detach_preserves_sibling_order() {
        let mut tree = Tree::with_root(Node::internal(None));
        let a = tree.add_child(tree.root(), Node::tip("A", Some(1.0)));
        let b = tree.add_child(tree.root(), Node::tip("B", Some(1.0)));
        let c = tree.add_child(tree.root(), Node::tip("C", Some(1.0)));
        tree.detach(b);
        assert_eq!(tree.node(tree.root()).children, vec![a, c]);
        assert!(tree.node(b).parent.is_none());
    }

    #[test]
    fn graft_appends_and_links() {
        let mut tree = Tree::with_root(Node::internal(None));
        let a = tree.add_child(tree.root(), Node::tip("A", Some(1.0)));
        let b = tree.add_node(Node::tip("B", None));
        tree.graft(tree.root(), b, Some(2.5));
        assert_eq!(tree.node(tree.root()).children, vec![a, b]);
        assert_eq!(tree.node(b).parent, Some(tree.root()));
        assert_eq!(tree.node(b).parent_edge, Some(2.5));
    }

    #[test]
    fn collapse_sums_edge_lengths() {
        // root -> u:0.5 -> A:12  (u unary after a detach elsewhere)
        let mut tree = Tree::with_root(Node::internal(None));
        let u = tree.add_child(tree.root(), Node::internal(Some(0.5)));
        let a = tree.add_child(u, Node::tip("A", Some(12.0)));
        let other = tree.add_child(tree.root(), Node::tip("B", Some(1.0)));
        tree.collapse_if_unary(u);
        assert_eq!(tree.node(tree.root()).children, vec![a, other]);
        assert_eq!(tree.node(a).parent_edge, Some(12.5));
        assert_eq!(tree.node(a).parent, Some(tree.root()));
    }

    #[test]
    fn collapse_walks_a_chain_of_unary_nodes() {
        // root -> u:1 -> v:2 -> A:4, plus a sibling to keep root branching
        let mut tree = Tree::with_root(Node::internal(None));
        let u = tree.add_child(tree.root(), Node::internal(Some(1.0)));
        let v = tree.add_child(u, Node::internal(Some(2.0)));
        let a = tree.add_child(v, Node::tip("A", Some(4.0)));
        let _b = tree.add_child(tree.root(), Node::tip("B", Some(1.0)));
        tree.collapse_if_unary(v);
        assert_eq!(tree.node(a).parent, Some(tree.root()));
        assert_eq!(tree.node(a).parent_edge, Some(7.0));
    }

    #[test]
    fn collapse_keeps_absent_lengths_absent() {
        let mut tree = Tree::with_root(Node::internal(None));
        let u = tree.add_child(tree.root(), Node::internal(None));
        let a = tree.add_child(u, Node::tip("A", None));
        let _b = tree.add_child(tree.root(), Node::tip("B", None));
        tree.collapse_if_unary(u);
        assert_eq!(tree.node(a).parent_edge, None);
    }

    #[test]
    fn reroot_at_reverses_the_parent_chain() {
        // ((A:1,B:2)x:3,C:4) rerooted at x
        let (mut tree, x, a, b, c) = small_tree();
        let old_root = tree.root();
        tree.reroot_at(x);
        assert_eq!(tree.root(), x);
        assert!(tree.node(x).parent.is_none());
        assert_eq!(tree.node(x).parent_edge, None);
        // old root is now x's last child, carrying x's former edge length
        assert_eq!(tree.node(x).children, vec![a, b, old_root]);
        assert_eq!(tree.node(old_root).parent, Some(x));
        assert_eq!(tree.node(old_root).parent_edge, Some(3.0));
        // C stayed under the old root, untouched
        assert_eq!(tree.node(old_root).children, vec![c]);
        assert_eq!(tree.node(c).parent_edge, Some(4.0));
    }

    #[test]
    fn reroot_at_root_is_a_no_op_on_structure() {
        let (mut tree, x, _, _, c) = small_tree();
        let root = tree.root();
        tree.reroot_at(root);
        assert_eq!(tree.root(), root);
        assert_eq!(tree.node(root).children, vec![x, c]);
    }
}
