//! Python binding layer for tree rerooting.
//!
//! String-in/string-out wrappers around the engine, for pipeline code that
//! already holds Newick text.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use rayon::prelude::*;

use crate::io::{parse_newick, write_newick};
use crate::reroot::{reroot_by_longest_branch, reroot_by_tree};
use crate::tree::Tree;

fn parse(label: &str, newick: &str) -> PyResult<Tree> {
    parse_newick(newick)
        .map_err(|e| PyValueError::new_err(format!("failed to parse {label} tree: {e}")))
}

/// Reroot a tree at the midpoint of its longest root-incident branch.
///
/// Args:
///     newick: Newick string of the tree to reroot
///
/// Returns:
///     Newick string of the rerooted tree
///
/// Raises:
///     ValueError: If the input does not parse or its root has fewer than
///     two children
#[pyfunction]
fn reroot_longest_branch(newick: &str) -> PyResult<String> {
    let tree = parse("input", newick)?;
    let rerooted =
        reroot_by_longest_branch(&tree).map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(write_newick(&rerooted))
}

/// Reroot `target` so its root matches `reference`'s root bipartition.
///
/// Args:
///     reference: Newick string of a rooted (bifurcating) reference tree
///     target: Newick string of the tree to reroot; its tip set must cover
///         the reference's
///
/// Returns:
///     Newick string of the rerooted target
///
/// Raises:
///     ValueError: If parsing fails, a precondition is violated, or the
///     reference bipartition is paraphyletic with respect to the target
#[pyfunction]
fn reroot_by_reference(reference: &str, target: &str) -> PyResult<String> {
    let reference = parse("reference", reference)?;
    let target = parse("target", target)?;
    let rerooted =
        reroot_by_tree(&reference, &target).map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(write_newick(&rerooted))
}

/// Reroot many targets against one reference, in parallel.
///
/// Args:
///     reference: Newick string of a rooted (bifurcating) reference tree
///     targets: List of Newick strings to reroot
///
/// Returns:
///     List of rerooted Newick strings, in input order
///
/// Raises:
///     ValueError: On the first tree that fails to parse or reroot
#[pyfunction]
fn reroot_many(reference: &str, targets: Vec<String>) -> PyResult<Vec<String>> {
    let reference = parse("reference", reference)?;
    let targets: Vec<Tree> = targets
        .iter()
        .enumerate()
        .map(|(idx, newick)| parse(&format!("target {idx}"), newick))
        .collect::<PyResult<Vec<_>>>()?;

    let results: Vec<Result<String, String>> = targets
        .par_iter()
        .map(|target| {
            reroot_by_tree(&reference, target)
                .map(|rerooted| write_newick(&rerooted))
                .map_err(|e| e.to_string())
        })
        .collect();

    results
        .into_iter()
        .collect::<Result<Vec<_>, _>>()
        .map_err(PyValueError::new_err)
}

/// Python module definition
#[pymodule]
fn phylo_reroot(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(reroot_longest_branch, m)?)?;
    m.add_function(wrap_pyfunction!(reroot_by_reference, m)?)?;
    m.add_function(wrap_pyfunction!(reroot_many, m)?)?;
    Ok(())
}
