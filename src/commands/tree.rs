//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays which
//! packages pulled in which dependencies.
//!
//! The tree is built from `yacpm.json` alone: the roots are the packages in
//! `packages`, and a dependency appears under every package listed in its
//! `^dependents`. Run `yacpm install` first so the manifest is up to date.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use yacpm::defaults::MANIFEST_FILE;
use yacpm::manifest::{Manifest, PackageEntry};
use yacpm::suggestions;

/// Display the package dependency tree
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Path to the yacpm.json manifest.
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = MANIFEST_FILE,
        env = "YACPM_MANIFEST"
    )]
    pub manifest: PathBuf,

    /// Maximum depth to display in the tree.
    ///
    /// Use 0 to show only the direct packages.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,
}

/// Execute the `tree` command.
pub fn execute(args: TreeArgs) -> Result<()> {
    if !args.manifest.exists() {
        return Err(suggestions::manifest_not_found(&args.manifest));
    }
    let manifest = Manifest::from_file(&args.manifest).map_err(suggestions::explain)?;

    let tree_root = build_tree(&manifest, &args.manifest, args.depth.unwrap_or(usize::MAX));
    print_tree(&tree_root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;

    Ok(())
}

fn label(name: &str, entry: &PackageEntry) -> String {
    match entry.version() {
        "" => name.to_string(),
        version => format!("{name} @ {version}"),
    }
}

/// Dependencies whose `^dependents` include `parent`.
fn children_of<'a>(
    manifest: &'a Manifest,
    parent: &str,
) -> Vec<(&'a String, &'a PackageEntry)> {
    manifest
        .dependency_packages
        .iter()
        .filter(|(_, entry)| match entry {
            PackageEntry::Detailed(request) => request.dependents.iter().any(|d| d == parent),
            PackageEntry::Version(_) => false,
        })
        .collect()
}

fn build_node(
    manifest: &Manifest,
    name: &str,
    entry: &PackageEntry,
    path: &mut HashSet<String>,
    max_depth: usize,
    depth: usize,
) -> TreeNode {
    let label = label(name, entry);
    if path.contains(name) {
        return TreeNode {
            label: format!("{label} (cycle)"),
            children: vec![],
        };
    }
    if depth >= max_depth {
        return TreeNode {
            label,
            children: vec![],
        };
    }

    path.insert(name.to_string());
    let children = children_of(manifest, name)
        .into_iter()
        .map(|(child, child_entry)| {
            build_node(manifest, child, child_entry, path, max_depth, depth + 1)
        })
        .collect();
    path.remove(name);

    TreeNode { label, children }
}

/// Build the tree under a root labelled with the manifest path.
fn build_tree(manifest: &Manifest, manifest_path: &Path, max_depth: usize) -> TreeNode {
    let mut path = HashSet::new();
    let children = manifest
        .packages
        .iter()
        .map(|(name, entry)| build_node(manifest, name, entry, &mut path, max_depth, 0))
        .collect();

    TreeNode {
        label: manifest_path.display().to_string(),
        children,
    }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
