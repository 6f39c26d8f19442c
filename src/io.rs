//! Reading, parsing, and writing Newick tree files.
//!
//! Parsing is delegated to the `phylotree` crate; this module converts the
//! parsed arena into the crate's own [`Tree`] model and renders trees back
//! to Newick text. File helpers read and write one tree per line,
//! transparently handling gzip for paths ending in `.gz`.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, Read as _, Write as _};
use std::path::Path;

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use itertools::Itertools;
use phylotree::tree::{Tree as PhyloTree, TreeError};
use thiserror::Error;

use crate::tree::{Node, NodeId, Tree};

/// Failures while loading trees from text or disk.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error("invalid Newick on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("malformed tree: {0}")]
    Tree(#[from] TreeError),
}

/// Parse a single Newick string into a [`Tree`].
pub fn parse_newick(newick: &str) -> Result<Tree, ReadError> {
    parse_line(newick, 1)
}

fn parse_line(newick: &str, line: usize) -> Result<Tree, ReadError> {
    let parsed = PhyloTree::from_newick(newick).map_err(|e| ReadError::Parse {
        line,
        message: e.to_string(),
    })?;
    from_phylotree(&parsed)
}

/// Convert a `phylotree` arena into the crate's own model.
///
/// Iterative and order-preserving; empty labels become `None`.
fn from_phylotree(src: &PhyloTree) -> Result<Tree, ReadError> {
    let src_root = src.get_root()?;
    let root = src.get(&src_root)?;
    let mut tree = Tree::with_root(Node::new(clean_name(&root.name), root.parent_edge));

    let mut stack: Vec<(usize, NodeId)> = root
        .children
        .iter()
        .rev()
        .map(|&child| (child, tree.root()))
        .collect();
    while let Some((src_id, parent)) = stack.pop() {
        let node = src.get(&src_id)?;
        let id = tree.add_child(parent, Node::new(clean_name(&node.name), node.parent_edge));
        for &child in node.children.iter().rev() {
            stack.push((child, id));
        }
    }
    Ok(tree)
}

fn clean_name(name: &Option<String>) -> Option<String> {
    name.clone().filter(|n| !n.is_empty())
}

/// Read one or more Newick trees from a file, one per line.
///
/// Blank lines are skipped. Paths ending in `.gz` are gunzipped on the
/// fly.
pub fn read_newick_trees<P: AsRef<Path>>(path: P) -> Result<Vec<Tree>, ReadError> {
    let content = read_to_string(path.as_ref())?;
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line_no, line)| parse_line(line, line_no))
        .collect()
}

fn read_to_string(path: &Path) -> io::Result<String> {
    let mut content = String::new();
    if path.to_string_lossy().ends_with(".gz") {
        GzDecoder::new(File::open(path)?).read_to_string(&mut content)?;
    } else {
        File::open(path)?.read_to_string(&mut content)?;
    }
    Ok(content)
}

/// Serialize a [`Tree`] to a Newick string terminated by `;`.
///
/// Nodes render as `name:length` with either part omitted when absent, so
/// trees parsed without branch lengths round-trip without invented zeros.
pub fn write_newick(tree: &Tree) -> String {
    let mut newick = format_node(tree, tree.root());
    newick.push(';');
    newick
}

fn format_node(tree: &Tree, id: NodeId) -> String {
    let node = tree.node(id);
    let mut out = String::new();
    if !node.is_tip() {
        let inner = node
            .children
            .iter()
            .map(|&child| format_node(tree, child))
            .join(",");
        let _ = write!(out, "({inner})");
    }
    if let Some(name) = &node.name {
        out.push_str(name);
    }
    if let Some(length) = node.parent_edge {
        let _ = write!(out, ":{length}");
    }
    out
}

/// Write trees to `path`, one Newick string per line.
///
/// Paths ending in `.gz` are gzip-compressed; `-` writes to stdout.
pub fn write_trees<P: AsRef<Path>>(path: P, trees: &[Tree]) -> io::Result<()> {
    let p = path.as_ref();
    let mut out: Box<dyn io::Write> = if p.as_os_str() == "-" {
        Box::new(io::stdout().lock())
    } else if p.to_string_lossy().ends_with(".gz") {
        let f = File::create(p)?;
        Box::new(io::BufWriter::new(GzEncoder::new(f, Compression::default())))
    } else {
        Box::new(io::BufWriter::new(File::create(p)?))
    };

    for tree in trees {
        writeln!(&mut out, "{}", write_newick(tree))?;
    }
    out.flush()?;
    Ok(())
}
