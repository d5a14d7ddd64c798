//! Per-package pipeline: metadata, repository identity, version, build
//! descriptor, sparse content.
//!
//! Every step is skipped when the package directory already reflects what it
//! would produce, so a second run over an unchanged manifest touches neither
//! the network nor git for packages with frozen versions. The checkout record
//! is saved after each step that changes the checkout, so a failure part way
//! through leaves a record that still matches what is on disk.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use super::merge::ResolvedPackage;
use super::resolve::{PackageProcessor, ProcessedPackage, Progress};
use crate::checkout;
use crate::cmake;
use crate::defaults::{PACKAGE_FILE, REPOSITORY_DIR};
use crate::error::{Error, Result};
use crate::package::PackageDescriptor;
use crate::remote::{self, LocateOutcome};
use crate::repository::{FetchOperations, GitOperations};
use crate::sparse;
use crate::version;

/// Installs packages into `packages_dir` through the given operations.
pub struct Installer {
    git: Box<dyn GitOperations>,
    fetcher: Box<dyn FetchOperations>,
    packages_dir: PathBuf,
}

impl Installer {
    pub fn new(
        git: Box<dyn GitOperations>,
        fetcher: Box<dyn FetchOperations>,
        packages_dir: PathBuf,
    ) -> Self {
        Self {
            git,
            fetcher,
            packages_dir,
        }
    }

    fn package_dir(&self, name: &str) -> PathBuf {
        self.packages_dir.join(name)
    }

    /// Bring the package's descriptor and build descriptor into its directory.
    fn fetch_metadata(&self, package: &ResolvedPackage, package_dir: &Path) -> Result<()> {
        let outcome = match (&package.repository, &package.cmake) {
            (Some(_), Some(location)) => {
                remote::use_explicit_build_descriptor(location, package_dir, self.fetcher.as_ref())?
            }
            _ => remote::locate(
                &package.remotes,
                &package.name,
                package_dir,
                self.fetcher.as_ref(),
            )?,
        };
        if let LocateOutcome::Fetched(origin) = outcome {
            info!("Fetched metadata for {} from {}", package.name, origin);
        }
        Ok(())
    }

    /// Make sure `repo_dir` is a repository whose origin is `repository`.
    fn ensure_origin(
        &self,
        repo_dir: &Path,
        repository: &str,
        descriptor: &mut PackageDescriptor,
    ) -> Result<()> {
        if !self.git.is_initialized(repo_dir) {
            self.git.init(repo_dir, repository)?;
            descriptor.record.initialize(repository);
        } else if descriptor.record.repository.as_deref() != Some(repository) {
            info!("Repository of {} changed to {}", repo_dir.display(), repository);
            self.git.set_origin(repo_dir, repository)?;
            descriptor.record.initialize(repository);
        }
        Ok(())
    }

    /// Apply the sparse selection when it differs from the recorded one.
    fn apply_selection(
        &self,
        package: &ResolvedPackage,
        repo_dir: &Path,
        descriptor: &mut PackageDescriptor,
        descriptor_path: &Path,
    ) -> Result<bool> {
        let selection = sparse::compute_selection(
            &descriptor.include,
            &package.include_paths,
            &descriptor.record.sparse_selection,
        );
        if !checkout::needs_content_refresh(&selection, &descriptor.record) {
            return Ok(false);
        }

        info!("Fetching files for {}", package.name);
        self.git.sparse_checkout_set(repo_dir, &selection)?;
        descriptor.record.mark_selected(selection);
        descriptor.save(descriptor_path)?;
        Ok(true)
    }
}

impl PackageProcessor for Installer {
    fn process(
        &mut self,
        package: &ResolvedPackage,
        progress: Progress,
    ) -> Result<ProcessedPackage> {
        let package_dir = self.package_dir(&package.name);
        let repo_dir = package_dir.join(REPOSITORY_DIR);
        fs::create_dir_all(&repo_dir)?;

        self.fetch_metadata(package, &package_dir)?;

        let descriptor_path = package_dir.join(PACKAGE_FILE);
        let mut descriptor = PackageDescriptor::load(&descriptor_path, &package.name)?;

        let repository = package
            .repository
            .clone()
            .or_else(|| descriptor.repository.clone())
            .ok_or_else(|| Error::MissingRepository {
                package: package.name.clone(),
            })?;
        self.ensure_origin(&repo_dir, &repository, &mut descriptor)?;

        let mut resolved = package.version.clone();
        let version_refreshed = checkout::needs_version_refresh(&resolved, &descriptor.record);
        if version_refreshed {
            resolved = version::resolve(&package.version, &repository, &repo_dir, self.git.as_ref())?;
            info!(
                "{} Fetching {}@{} at {}",
                progress, package.name, resolved, repository
            );
            descriptor.record.mark_checked_out(&resolved);
            descriptor.save(&descriptor_path)?;
        } else {
            info!("{} {}@{} is up to date", progress, package.name, resolved);
        }

        cmake::write_build_descriptor(&package_dir, &package.build_variables)?;

        let content_refreshed =
            self.apply_selection(package, &repo_dir, &mut descriptor, &descriptor_path)?;
        descriptor.save(&descriptor_path)?;

        Ok(ProcessedPackage {
            version: resolved,
            dependencies: descriptor.dependency_map(&package.name)?,
            remotes: descriptor.remote_list()?,
            version_refreshed,
            content_refreshed,
        })
    }

    fn reconcile(&mut self, package: &ResolvedPackage) -> Result<bool> {
        let package_dir = self.package_dir(&package.name);
        let repo_dir = package_dir.join(REPOSITORY_DIR);
        let descriptor_path = package_dir.join(PACKAGE_FILE);
        let mut descriptor = PackageDescriptor::load(&descriptor_path, &package.name)?;

        cmake::write_build_descriptor(&package_dir, &package.build_variables)?;
        self.apply_selection(package, &repo_dir, &mut descriptor, &descriptor_path)
    }
}
