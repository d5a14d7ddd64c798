//! # Ls Command Implementation
//!
//! This module implements the `ls` subcommand, which lists the packages a
//! project uses: the ones declared in `packages` and the ones pulled in
//! through `dependency_packages`.
//!
//! Each line shows the version recorded in `yacpm.json`. When the checkout
//! under `yacpkgs/` is missing or at a different version, that is shown as
//! well, which means `yacpm install` has not been run since the manifest
//! changed.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use yacpm::defaults::{MANIFEST_FILE, PACKAGE_FILE};
use yacpm::manifest::{Manifest, PackageEntry};
use yacpm::output::OutputConfig;
use yacpm::package::PackageDescriptor;
use yacpm::phases::InstallOptions;
use yacpm::suggestions;

/// List the packages of a project
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Path to the yacpm.json manifest.
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = MANIFEST_FILE,
        env = "YACPM_MANIFEST"
    )]
    pub manifest: PathBuf,

    /// Directory holding the installed packages.
    #[arg(long, value_name = "DIR", env = "YACPM_PACKAGES_DIR")]
    pub packages_dir: Option<PathBuf>,

    /// Only list packages declared directly in `packages`.
    #[arg(long)]
    pub direct: bool,
}

/// Execute the `ls` command.
pub fn execute(args: LsArgs, output: &OutputConfig) -> Result<()> {
    if !args.manifest.exists() {
        return Err(suggestions::manifest_not_found(&args.manifest));
    }
    let manifest = Manifest::from_file(&args.manifest).map_err(suggestions::explain)?;
    let packages_dir = args
        .packages_dir
        .unwrap_or_else(|| InstallOptions::for_manifest(&args.manifest).packages_dir);

    print!("{}", render(&manifest, &packages_dir, args.direct, output));
    Ok(())
}

/// What `yacpkgs/<name>/yacpkg.json` says is checked out.
enum Checkout {
    Missing,
    At(String),
}

fn checkout_state(packages_dir: &Path, name: &str) -> Checkout {
    let path = packages_dir.join(name).join(PACKAGE_FILE);
    if !path.is_file() {
        return Checkout::Missing;
    }
    match PackageDescriptor::load(&path, name) {
        Ok(descriptor) => match descriptor.record.current_version {
            Some(version) => Checkout::At(version),
            None => Checkout::Missing,
        },
        Err(e) => {
            log::warn!("Could not read {}: {}", path.display(), e);
            Checkout::Missing
        }
    }
}

fn render_line(
    name: &str,
    entry: &PackageEntry,
    packages_dir: &Path,
    output: &OutputConfig,
) -> String {
    let mut line = format!("  {} {}", output.package(name), output.version(entry.version()));

    match checkout_state(packages_dir, name) {
        Checkout::Missing => line.push_str(" [not installed]"),
        Checkout::At(current) if current != entry.version() => {
            line.push_str(&format!(" [checked out: {current}]"))
        }
        Checkout::At(_) => {}
    }

    if let PackageEntry::Detailed(request) = entry {
        if !request.dependents.is_empty() {
            line.push_str(&format!(" (required by {})", request.dependents.join(", ")));
        }
    }
    line.push('\n');
    line
}

/// Listing of the manifest's packages, direct ones first.
fn render(
    manifest: &Manifest,
    packages_dir: &Path,
    direct_only: bool,
    output: &OutputConfig,
) -> String {
    let mut text = String::new();

    if manifest.packages.is_empty() {
        text.push_str("No packages declared\n");
    } else {
        text.push_str("Packages:\n");
        for (name, entry) in &manifest.packages {
            text.push_str(&render_line(name, entry, packages_dir, output));
        }
    }

    if !direct_only && !manifest.dependency_packages.is_empty() {
        text.push_str("Dependencies:\n");
        for (name, entry) in &manifest.dependency_packages {
            text.push_str(&render_line(name, entry, packages_dir, output));
        }
    }
    text
}
