//! # Merge Table
//!
//! One run's view of every package it knows about. Each package moves through
//!
//! ```text
//! Unseen ──claim──▶ Pending ──last dependent processed──▶ Ready ──▶ Processed
//!    └────────────────claim with no dependents left───────▶┘
//! ```
//!
//! - **Unseen**: only known from the previous run's `dependency_packages`.
//!   Not installed, not written back, unless something declares it again.
//! - **Pending**: declared this run, but some of the packages that declared it
//!   last run have not been processed yet. Waiting lets all of them merge
//!   their include paths and variables before the package is checked out.
//! - **Ready**: will be processed in the next generation.
//! - **Processed**: checked out. Later requests still merge into it, which
//!   flags it for a content reconcile at the end of the run, but it never
//!   goes back into the pipeline.
//!
//! Direct packages from `packages` start out Ready.
//!
//! ## Merge rules
//!
//! - version: a claimed seed keeps its frozen version if the request still
//!   asks for the spec it was frozen from. After that, the first writer wins
//!   and conflicting requests are logged.
//! - include paths: each request's paths go in front, duplicates dropped.
//! - variables: first writer wins per variable.
//! - remotes: appended in declaration order, duplicates dropped.

use std::collections::{BTreeSet, HashSet};

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};

use crate::error::Result;
use crate::manifest::{Manifest, PackageEntry, PackageRequest, VariableValue};
use crate::sparse::{ordered_union, prepend_paths};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    Unseen,
    Pending,
    Ready,
    Processed,
}

/// Everything the run has merged for one package.
#[derive(Debug, Clone)]
pub struct ResolvedPackage {
    pub name: String,
    /// Version to check out, or the resolved version once processed.
    pub version: String,
    /// Spec the version came from.
    pub requested: String,
    pub repository: Option<String>,
    /// Explicit build descriptor location.
    pub cmake: Option<String>,
    pub remotes: Vec<String>,
    pub include_paths: Vec<String>,
    pub build_variables: IndexMap<String, VariableValue>,
    /// Packages that declared this one during this run.
    pub dependents: BTreeSet<String>,
    /// Packages still expected to declare this one before it is processed.
    pub dependents_left: BTreeSet<String>,
    pub state: PackageState,
    /// The entry from `packages`, for direct packages.
    pub declared: Option<PackageEntry>,
    /// Merged into after it was processed.
    pub needs_reconcile: bool,
}

impl ResolvedPackage {
    fn from_request(name: &str, request: PackageRequest, remotes: Vec<String>) -> Result<Self> {
        let build_variables = request.build_variables(name)?;
        Ok(Self {
            name: name.to_string(),
            requested: request.requested.unwrap_or_else(|| request.version.clone()),
            version: request.version,
            repository: request.repository,
            cmake: request.cmake,
            remotes,
            include_paths: ordered_union([request.include.as_slice()]),
            build_variables,
            dependents: BTreeSet::new(),
            dependents_left: BTreeSet::new(),
            state: PackageState::Ready,
            declared: None,
            needs_reconcile: false,
        })
    }

    /// Requested only by the project itself.
    pub fn is_direct(&self) -> bool {
        self.dependents.is_empty()
    }
}

/// A package declared in another package's `dependencies`.
#[derive(Debug, Clone)]
pub struct Declaration {
    /// The declaring package.
    pub owner: String,
    pub name: String,
    pub request: PackageRequest,
    /// The declaring package's remotes followed by its descriptor's own.
    pub remotes: Vec<String>,
}

/// All packages known to one run, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct MergeTable {
    packages: IndexMap<String, ResolvedPackage>,
}

impl MergeTable {
    /// Direct packages start Ready; the previous run's dependency packages are
    /// remembered as Unseen, except those marked `^direct`, which are direct
    /// packages that something else also declared.
    pub fn new(manifest: &Manifest) -> Result<Self> {
        let mut packages = IndexMap::new();

        for (name, entry) in &manifest.packages {
            let mut package =
                ResolvedPackage::from_request(name, entry.request(), manifest.remotes.clone())?;
            // A direct package follows what the user writes, not an old freeze
            package.requested = package.version.clone();
            package.declared = Some(entry.clone());
            packages.insert(name.clone(), package);
        }

        for (name, entry) in &manifest.dependency_packages {
            if packages.contains_key(name) {
                continue;
            }
            let request = entry.request();
            if request.direct {
                // The project declared it too, so its own pin stays in charge
                let mut package =
                    ResolvedPackage::from_request(name, request, manifest.remotes.clone())?;
                package.declared = Some(entry.clone());
                packages.insert(name.clone(), package);
                continue;
            }
            let seeded_dependents: BTreeSet<String> = request.dependents.iter().cloned().collect();
            let mut package =
                ResolvedPackage::from_request(name, request, manifest.remotes.clone())?;
            package.state = PackageState::Unseen;
            package.dependents_left = seeded_dependents;
            packages.insert(name.clone(), package);
        }

        Ok(Self { packages })
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedPackage> {
        self.packages.get(name)
    }

    /// Every package this run installs, in first-seen order.
    pub fn live(&self) -> impl Iterator<Item = &ResolvedPackage> {
        self.packages
            .values()
            .filter(|package| package.state != PackageState::Unseen)
    }

    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    /// Names of the packages to process in the next generation.
    pub fn ready(&self) -> Vec<String> {
        self.names_in(PackageState::Ready)
    }

    pub fn has_pending(&self) -> bool {
        self.packages
            .values()
            .any(|package| package.state == PackageState::Pending)
    }

    /// Processed packages that were merged into after processing.
    pub fn needing_reconcile(&self) -> Vec<String> {
        self.packages
            .values()
            .filter(|package| package.needs_reconcile)
            .map(|package| package.name.clone())
            .collect()
    }

    fn names_in(&self, state: PackageState) -> Vec<String> {
        self.packages
            .values()
            .filter(|package| package.state == state)
            .map(|package| package.name.clone())
            .collect()
    }

    /// Record that `name` was checked out at `version`.
    pub fn mark_processed(&mut self, name: &str, version: &str) {
        if let Some(package) = self.packages.get_mut(name) {
            package.version = version.to_string();
            package.state = PackageState::Processed;
        }
    }

    /// A reconcile pass has caught `name` up with its late merges.
    pub fn mark_reconciled(&mut self, name: &str) {
        if let Some(package) = self.packages.get_mut(name) {
            package.needs_reconcile = false;
        }
    }

    /// `owner` was processed and declares only `declared`: it is no longer a
    /// dependent of anything else.
    pub fn forget_dependent(&mut self, owner: &str, declared: &IndexSet<String>) {
        for package in self.packages.values_mut() {
            if declared.contains(&package.name) {
                continue;
            }
            package.dependents.remove(owner);
            if package.dependents_left.remove(owner) {
                Self::release_if_unblocked(package);
            }
        }
    }

    /// Merge one declaration into the table.
    pub fn merge(&mut self, declaration: Declaration) -> Result<()> {
        let Declaration {
            owner,
            name,
            request,
            remotes,
        } = declaration;

        if !self.packages.contains_key(&name) {
            let mut package = ResolvedPackage::from_request(&name, request, remotes)?;
            package.dependents.insert(owner);
            self.packages.insert(name, package);
            return Ok(());
        }

        let build_variables = request.build_variables(&name)?;

        let Some(package) = self.packages.get_mut(&name) else {
            return Ok(());
        };
        if package.state == PackageState::Unseen {
            Self::claim(package, &owner, request, build_variables, remotes);
        } else {
            Self::combine(package, &owner, request, build_variables, remotes);
        }

        package.dependents.insert(owner.clone());
        package.dependents_left.remove(&owner);
        Self::release_if_unblocked(package);
        Ok(())
    }

    /// First declaration of a package remembered from the previous run.
    fn claim(
        package: &mut ResolvedPackage,
        owner: &str,
        request: PackageRequest,
        build_variables: IndexMap<String, VariableValue>,
        remotes: Vec<String>,
    ) {
        if request.version != package.requested {
            debug!(
                "{} now requests {}@{} (was {}), dropping the frozen version",
                owner,
                package.name,
                request.version,
                package.requested
            );
            package.version = request.version.clone();
            package.requested = request.version;
        }

        if request.repository.is_some() {
            package.repository = request.repository;
        }
        if request.cmake.is_some() {
            package.cmake = request.cmake;
        }
        package.include_paths = prepend_paths(&request.include, &package.include_paths);

        let mut merged = build_variables;
        for (variable, value) in package.build_variables.drain(..) {
            merged.entry(variable).or_insert(value);
        }
        package.build_variables = merged;

        package.remotes = ordered_union([remotes.as_slice(), package.remotes.as_slice()]);
        package.dependents.clear();
        package.state = PackageState::Pending;
    }

    /// Any later declaration.
    fn combine(
        package: &mut ResolvedPackage,
        owner: &str,
        request: PackageRequest,
        build_variables: IndexMap<String, VariableValue>,
        remotes: Vec<String>,
    ) {
        if request.version != package.requested {
            warn!(
                "{} requests {}@{} but {} is already used",
                owner,
                package.name,
                request.version,
                if package.requested.is_empty() {
                    "the default branch"
                } else {
                    package.requested.as_str()
                }
            );
        }

        if package.repository.is_none() {
            package.repository = request.repository;
        }
        if package.cmake.is_none() {
            package.cmake = request.cmake;
        }

        let include_paths = prepend_paths(&request.include, &package.include_paths);
        let paths_grew = include_paths.len() != package.include_paths.len();
        package.include_paths = include_paths;

        let mut variables_grew = false;
        for (variable, value) in build_variables {
            if !package.build_variables.contains_key(&variable) {
                package.build_variables.insert(variable, value);
                variables_grew = true;
            }
        }

        package.remotes = ordered_union([package.remotes.as_slice(), remotes.as_slice()]);

        if package.state == PackageState::Processed && (paths_grew || variables_grew) {
            package.needs_reconcile = true;
        }
    }

    fn release_if_unblocked(package: &mut ResolvedPackage) {
        if package.state == PackageState::Pending && package.dependents_left.is_empty() {
            package.state = PackageState::Ready;
        }
    }

    /// Unblock Pending packages when nothing is Ready.
    ///
    /// First drops dependents that will never be processed this run. If that
    /// frees nothing, the remaining Pending packages wait on each other, and
    /// all of them are released. Returns whether anything became Ready.
    pub fn release_stalled(&mut self) -> bool {
        let live: HashSet<String> = self
            .packages
            .values()
            .filter(|package| matches!(package.state, PackageState::Pending | PackageState::Ready))
            .map(|package| package.name.clone())
            .collect();

        let mut released = false;
        for package in self.packages.values_mut() {
            if package.state != PackageState::Pending {
                continue;
            }
            package.dependents_left.retain(|name| live.contains(name));
            Self::release_if_unblocked(package);
            released |= package.state == PackageState::Ready;
        }
        if released {
            return true;
        }

        for package in self.packages.values_mut() {
            if package.state != PackageState::Pending {
                continue;
            }
            warn!(
                "Dependency cycle: installing {} without waiting for {}",
                package.name,
                package
                    .dependents_left
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            package.dependents_left.clear();
            package.state = PackageState::Ready;
            released = true;
        }
        released
    }
}
