//! Orchestrator for the complete install operation
//!
//! Ties the phases together:
//! 1. Resolve - run the generation loop over the manifest, installing each
//!    package as it becomes Ready
//! 2. Reclassify - split the resolved set into `packages` and
//!    `dependency_packages`
//! 3. Prune - delete package directories nothing asks for anymore
//! 4. Write - `packages.cmake` and the updated manifest
//!
//! Steps 2-4 only run when resolution succeeded, so a failed install leaves
//! the manifest and unrelated package directories untouched.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::process::Installer;
use super::{prune, resolve, write};
use crate::defaults::{INTEGRATION_FILE, PACKAGES_DIR};
use crate::error::Result;
use crate::manifest::Manifest;
use crate::repository::{
    DefaultFetchOperations, DefaultGitOperations, FetchOperations, GitOperations,
};

/// Where an install reads and writes.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub manifest_path: PathBuf,
    pub packages_dir: PathBuf,
    /// Echo every git command, in addition to the manifest's `verbose`.
    pub verbose: bool,
}

impl InstallOptions {
    /// Packages go to `yacpkgs/` next to the manifest.
    pub fn for_manifest(manifest_path: &Path) -> Self {
        Self {
            manifest_path: manifest_path.to_path_buf(),
            packages_dir: project_dir(manifest_path).join(PACKAGES_DIR),
            verbose: false,
        }
    }
}

/// Summary of an install.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    /// Packages written to `packages`.
    pub direct: Vec<String>,
    /// Packages written to `dependency_packages`.
    pub dependencies: Vec<String>,
    /// Packages whose version was resolved again.
    pub refreshed: Vec<String>,
    /// Packages whose sources were fetched.
    pub fetched: Vec<String>,
    /// Package directories deleted.
    pub removed: Vec<String>,
    pub generations: usize,
}

/// Directory the manifest lives in; relative remotes resolve against it.
pub fn project_dir(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Install everything `options.manifest_path` asks for, using the system
/// `git` and the network.
pub fn install(options: &InstallOptions) -> Result<InstallReport> {
    let manifest = Manifest::from_file(&options.manifest_path)?;
    let git = DefaultGitOperations::new(options.verbose || manifest.verbose);
    let fetcher = DefaultFetchOperations::new(project_dir(&options.manifest_path))?;
    install_with_operations(manifest, options, Box::new(git), Box::new(fetcher))
}

/// Install with custom git and fetch operations.
pub fn install_with_operations(
    mut manifest: Manifest,
    options: &InstallOptions,
    git: Box<dyn GitOperations>,
    fetcher: Box<dyn FetchOperations>,
) -> Result<InstallReport> {
    fs::create_dir_all(&options.packages_dir)?;

    // Phase 1: Resolve
    let mut installer = Installer::new(git, fetcher, options.packages_dir.clone());
    let resolution = resolve::execute(&manifest, &mut installer)?;

    // Phase 2: Reclassify
    write::reclassify(&mut manifest, &resolution.table);

    // Phase 3: Prune
    let keep: HashSet<&str> = resolution
        .table
        .live()
        .map(|package| package.name.as_str())
        .collect();
    let removed = prune::execute(&options.packages_dir, &keep)?;

    // Phase 4: Write
    write::write_integration_file(
        &options.packages_dir.join(INTEGRATION_FILE),
        &resolution.table,
    )?;
    manifest.write(&options.manifest_path)?;

    Ok(InstallReport {
        direct: manifest.packages.keys().cloned().collect(),
        dependencies: manifest.dependency_packages.keys().cloned().collect(),
        refreshed: resolution.refreshed,
        fetched: resolution.fetched,
        removed,
        generations: resolution.generations,
    })
}
