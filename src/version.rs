//! # Version Resolution and Freezing
//!
//! A declared version is one of:
//!
//! | Spec        | Meaning                                                 |
//! |-------------|---------------------------------------------------------|
//! | `""`        | default branch of the repository, frozen to its commit  |
//! | `v1.2`      | branch, tag or commit; branches and tags are frozen     |
//! | `+main`     | float on `main`, never frozen                           |
//! | `+`         | float on the default branch, remembered as `+<branch>`  |
//! | `++`/`++x`  | float and re-resolve everything on every run            |
//!
//! Resolution fetches the working reference shallowly, checks it out, and then
//! decides what to write back: a commit id for frozen specs, `+<branch>` for a
//! single marker, or the untouched spec for a doubled marker.

use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::repository::{GitOperations, RefKind};

/// Prefix marking a version as floating.
pub const FLOATING_MARKER: char = '+';

/// A parsed version spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    /// The empty spec.
    DefaultBranch,
    /// A reference that gets frozen when it names a branch or tag.
    Exact(String),
    /// `+ref`; the reference may be empty.
    Floating(String),
    /// `++ref`; the reference may be empty.
    AlwaysFloating(String),
}

impl VersionSpec {
    pub fn parse(spec: &str) -> Self {
        if let Some(rest) = spec.strip_prefix(FLOATING_MARKER) {
            match rest.strip_prefix(FLOATING_MARKER) {
                Some(reference) => VersionSpec::AlwaysFloating(reference.to_string()),
                None => VersionSpec::Floating(rest.to_string()),
            }
        } else if spec.is_empty() {
            VersionSpec::DefaultBranch
        } else {
            VersionSpec::Exact(spec.to_string())
        }
    }

    pub fn is_floating(&self) -> bool {
        matches!(
            self,
            VersionSpec::Floating(_) | VersionSpec::AlwaysFloating(_)
        )
    }

    /// The git reference to fetch, empty when the default branch must be asked for.
    pub fn working_reference(&self) -> &str {
        match self {
            VersionSpec::DefaultBranch => "",
            VersionSpec::Exact(reference)
            | VersionSpec::Floating(reference)
            | VersionSpec::AlwaysFloating(reference) => reference,
        }
    }
}

/// Whether `version` re-resolves on every run.
pub fn is_floating(version: &str) -> bool {
    VersionSpec::parse(version).is_floating()
}

/// Check out `spec` in `repo_dir` and return the version to record.
///
/// `repo_dir` must already be an initialized repository whose `origin` is
/// `repository`.
pub fn resolve(
    spec: &str,
    repository: &str,
    repo_dir: &Path,
    git: &dyn GitOperations,
) -> Result<String> {
    let parsed = VersionSpec::parse(spec);

    let mut reference = parsed.working_reference().to_string();
    if reference.is_empty() {
        reference = git.default_branch(repo_dir, repository)?;
        debug!("Default branch of {} is {}", repository, reference);
    }

    git.fetch_shallow(repo_dir, &reference)?;
    git.sparse_checkout_init(repo_dir)?;
    git.checkout_fetch_head(repo_dir)?;

    let resolved = match parsed {
        VersionSpec::DefaultBranch => git.head_commit(repo_dir)?,
        VersionSpec::Exact(_) => match git.classify_reference(repo_dir, &reference)? {
            RefKind::Branch | RefKind::Tag => git.head_commit(repo_dir)?,
            RefKind::Commit => reference,
        },
        VersionSpec::Floating(_) => format!("{}{}", FLOATING_MARKER, reference),
        VersionSpec::AlwaysFloating(_) => spec.to_string(),
    };

    Ok(resolved)
}
