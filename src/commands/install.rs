//! # Install Command Implementation
//!
//! This module implements the `install` subcommand, the main entry point of
//! yacpm. It reads `yacpm.json`, resolves every package and its transitive
//! dependencies, brings each `yacpkgs/<name>/` directory up to date, removes
//! packages nobody needs any more, and writes `yacpkgs/packages.cmake`.
//!
//! ## Functionality
//!
//! - **Resolution**: Fetches package descriptors from the configured remotes
//! - **Version Freezing**: Branch and tag versions are pinned to a commit hash
//! - **Sparse Checkouts**: Only the paths packages ask for are checked out
//! - **Manifest Rewrite**: `yacpm.json` is rewritten with frozen versions and
//!   the discovered `dependency_packages`
//!
//! A failed install leaves `yacpm.json` and `packages.cmake` untouched.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use yacpm::defaults::MANIFEST_FILE;
use yacpm::output::{emoji, OutputConfig};
use yacpm::phases::{self, InstallOptions, InstallReport};
use yacpm::suggestions;

/// Install the packages listed in yacpm.json
#[derive(Args, Debug)]
pub struct InstallArgs {
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
    ///
    /// Defaults to `yacpkgs/` next to the manifest.
    #[arg(long, value_name = "DIR", env = "YACPM_PACKAGES_DIR")]
    pub packages_dir: Option<PathBuf>,

    /// Show every git command as it runs.
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print warnings and errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl InstallArgs {
    fn options(&self) -> InstallOptions {
        let mut options = InstallOptions::for_manifest(&self.manifest);
        if let Some(dir) = &self.packages_dir {
            options.packages_dir = dir.clone();
        }
        options.verbose = self.verbose;
        options
    }
}

/// Execute the `install` command.
pub fn execute(args: InstallArgs, output: &OutputConfig) -> Result<()> {
    if !args.manifest.exists() {
        return Err(suggestions::manifest_not_found(&args.manifest));
    }

    let options = args.options();
    if !args.quiet {
        println!(
            "{} Installing packages from {}",
            emoji(output, "📦", "==>"),
            args.manifest.display()
        );
    }

    let report = phases::install(&options).map_err(suggestions::explain)?;

    if !args.quiet {
        print!("{}", summary(&report, output));
    }
    Ok(())
}

fn count(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Human readable summary of an install.
fn summary(report: &InstallReport, output: &OutputConfig) -> String {
    let mut text = format!(
        "{} Installed {} ({} direct, {})\n",
        emoji(output, "✅", "==>"),
        count(
            report.direct.len() + report.dependencies.len(),
            "package",
            "packages"
        ),
        report.direct.len(),
        count(report.dependencies.len(), "dependency", "dependencies"),
    );
    if !report.fetched.is_empty() {
        text.push_str(&format!("   fetched: {}\n", report.fetched.join(", ")));
    }
    if !report.refreshed.is_empty() {
        text.push_str(&format!("   updated: {}\n", report.refreshed.join(", ")));
    }
    if !report.removed.is_empty() {
        text.push_str(&format!("   removed: {}\n", report.removed.join(", ")));
    }
    text
}
