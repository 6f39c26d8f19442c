use clap::{Parser, ValueEnum};
use phylo_reroot::io::{read_newick_trees, write_trees};
use phylo_reroot::reroot::{RerootError, reroot_by_longest_branch, reroot_by_tree};
use phylo_reroot::tree::Tree;
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

/// Reroot phylogenetic trees from a Newick file, either at the midpoint of
/// the longest root-incident branch or to match the root bipartition of an
/// already-rooted reference tree.
#[derive(Parser, Debug)]
#[command(name = "phylo-reroot", version, about = "Reroot Newick trees by longest branch or by a rooted reference tree")]
struct Args {
    /// Path to input Newick file, one tree per line (.gz supported)
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Rooted reference tree (Newick); required for --method reference
    #[arg(short = 'r', long = "reference")]
    reference: Option<PathBuf>,

    /// Output path for rerooted trees (.gz supported, `-` for stdout)
    #[arg(short = 'o', long = "output")]
    output: PathBuf,

    /// Rerooting method: longest-branch | reference
    #[arg(long = "method", value_enum, default_value_t = MethodArg::LongestBranch)]
    method: MethodArg,

    /// Skip trees whose topology conflicts with the reference instead of aborting
    #[arg(long = "skip-incompatible", default_value_t = false)]
    skip_incompatible: bool,

    /// Quiet mode: suppresses progress messages on stdout
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum MethodArg {
    LongestBranch,
    Reference,
}

fn main() {
    let args = Args::parse();
    // progress would interleave with trees when writing to stdout
    let quiet = args.quiet || args.output.as_os_str() == "-";

    let t0 = Instant::now();
    let trees = match read_newick_trees(&args.input) {
        Ok(trees) => trees,
        Err(e) => {
            eprintln!("Failed to read {:?}: {e}", args.input);
            std::process::exit(2);
        }
    };
    if trees.is_empty() {
        eprintln!("No trees parsed from {:?}.", args.input);
        std::process::exit(2);
    }
    log_if(!quiet, format!("Read {} trees in {:.3}s", trees.len(), t0.elapsed().as_secs_f64()));

    let t1 = Instant::now();
    let rerooted = match args.method {
        MethodArg::LongestBranch => {
            run_all(&trees, args.skip_incompatible, reroot_by_longest_branch)
        }
        MethodArg::Reference => {
            let Some(ref_path) = args.reference.as_ref() else {
                eprintln!("--method reference requires --reference");
                std::process::exit(2);
            };
            let reference = match read_newick_trees(ref_path) {
                Ok(mut trees) if !trees.is_empty() => trees.remove(0),
                Ok(_) => {
                    eprintln!("No trees parsed from {ref_path:?}.");
                    std::process::exit(2);
                }
                Err(e) => {
                    eprintln!("Failed to read {ref_path:?}: {e}");
                    std::process::exit(2);
                }
            };
            run_all(&trees, args.skip_incompatible, move |tree| {
                reroot_by_tree(&reference, tree)
            })
        }
    };
    log_if(
        !quiet,
        format!("Rerooted {} trees in {:.3}s", rerooted.len(), t1.elapsed().as_secs_f64()),
    );

    let t2 = Instant::now();
    if let Err(e) = write_trees(&args.output, &rerooted) {
        eprintln!("Failed to write output {:?}: {e}", args.output);
        std::process::exit(4);
    }
    log_if(!quiet, format!("Wrote output in {:.3}s", t2.elapsed().as_secs_f64()));
}

/// Reroot every tree in parallel.
///
/// Paraphyletic trees are dropped with a warning when `skip_incompatible`
/// is set; every other failure aborts the run.
fn run_all<F>(trees: &[Tree], skip_incompatible: bool, reroot: F) -> Vec<Tree>
where
    F: Fn(&Tree) -> Result<Tree, RerootError> + Sync,
{
    let results: Vec<(usize, Result<Tree, RerootError>)> = trees
        .par_iter()
        .enumerate()
        .map(|(idx, tree)| (idx, reroot(tree)))
        .collect();

    let mut rerooted = Vec::with_capacity(results.len());
    for (idx, result) in results {
        match result {
            Ok(tree) => rerooted.push(tree),
            Err(e @ RerootError::Paraphyletic) if skip_incompatible => {
                eprintln!("Skipping tree {idx}: {e}");
            }
            Err(e) => {
                eprintln!("Failed to reroot tree {idx}: {e}");
                std::process::exit(3);
            }
        }
    }
    rerooted
}

fn log_if(show: bool, msg: String) {
    if show {
        println!("{}", msg);
    }
}
