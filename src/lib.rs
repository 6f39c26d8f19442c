//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `tree`: arena-based tree model with traversal and mutation primitives.
//! - `bitset`: compact bitset representation for tip sets.
//! - `tipset`: per-node tip-set table used for bipartition matching.
//! - `reroot`: the rerooting engine (longest-branch and reference-guided).
//! - `io`: reading, parsing, and writing Newick tree files.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).
//!
//! Public API kept stable by re-exporting key items from the modules.

pub mod tree;
pub mod bitset;
pub mod tipset;
pub mod reroot;
pub mod io;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use tree::{Node, NodeId, Tree};
pub use bitset::Bitset;
pub use tipset::TipSets;
pub use reroot::{RerootError, reroot_by_longest_branch, reroot_by_tree, reroot_tree_by_old_root};
pub use io::{parse_newick, read_newick_trees, write_newick, write_trees};
