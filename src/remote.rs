//! # Remote Package Locator
//!
//! Brings a package's two metadata artifacts into its directory:
//!
//! - `yacpkg.json`, the package descriptor, and
//! - `CMakeLists.txt` from the remote, stored as `CMakeLists-downloaded.txt`.
//!
//! Remotes are tried in order. A remote that does not have the package is
//! skipped after deleting whatever this attempt already wrote, so a later
//! remote never ends up mixed with a partial download from an earlier one. Any
//! other failure (a 500, a connection error, a permission problem) aborts
//! immediately.
//!
//! Once both artifacts are present nothing is fetched again; deleting them is
//! how a user forces a refresh.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::defaults::{expand_remote, CMAKE_FILE, DOWNLOADED_CMAKE_FILE, PACKAGE_FILE};
use crate::error::{Error, Result};
use crate::repository::{FetchOperations, FetchOutcome};

/// Where a package's metadata came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateOutcome {
    /// Both artifacts were already in the package directory.
    AlreadyPresent,
    /// Fetched from the named remote (or explicit build descriptor location).
    Fetched(String),
}

/// Find `package` on the first remote that serves it.
pub fn locate(
    remotes: &[String],
    package: &str,
    package_dir: &Path,
    fetcher: &dyn FetchOperations,
) -> Result<LocateOutcome> {
    let descriptor = package_dir.join(PACKAGE_FILE);
    let build_descriptor = package_dir.join(DOWNLOADED_CMAKE_FILE);
    if descriptor.exists() && build_descriptor.exists() {
        return Ok(LocateOutcome::AlreadyPresent);
    }

    let mut attempted = Vec::with_capacity(remotes.len());
    for remote in remotes {
        let remote = expand_remote(remote);
        attempted.push(remote.to_string());

        let base = format!("{}/{}", remote.trim_end_matches('/'), package);
        let artifacts = [
            (format!("{}/{}", base, PACKAGE_FILE), descriptor.clone()),
            (format!("{}/{}", base, CMAKE_FILE), build_descriptor.clone()),
        ];

        match fetch_all(&artifacts, fetcher) {
            Ok(()) => return Ok(LocateOutcome::Fetched(remote.to_string())),
            Err(e) if e.is_not_found() => {
                debug!("{} is not on {}: {}", package, remote, e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::PackageNotFound {
        package: package.to_string(),
        remotes: attempted,
    })
}

/// Use an explicitly given build descriptor instead of asking the remotes.
///
/// The package has no remote descriptor in this case, so an empty `{}` one
/// is created for the checkout record to live in.
pub fn use_explicit_build_descriptor(
    location: &str,
    package_dir: &Path,
    fetcher: &dyn FetchOperations,
) -> Result<LocateOutcome> {
    let outcome = fetcher.fetch_if_missing(location, &package_dir.join(DOWNLOADED_CMAKE_FILE))?;

    let descriptor = package_dir.join(PACKAGE_FILE);
    if !descriptor.exists() {
        fs::write(&descriptor, "{}")?;
    }

    Ok(match outcome {
        FetchOutcome::Present => LocateOutcome::AlreadyPresent,
        FetchOutcome::Fetched => LocateOutcome::Fetched(location.to_string()),
    })
}

/// Fetch every artifact, rolling back this attempt's writes on not-found.
fn fetch_all(artifacts: &[(String, PathBuf)], fetcher: &dyn FetchOperations) -> Result<()> {
    let mut written: Vec<&Path> = Vec::new();
    for (source, destination) in artifacts {
        match fetcher.fetch_if_missing(source, destination) {
            Ok(FetchOutcome::Fetched) => written.push(destination),
            Ok(FetchOutcome::Present) => {}
            Err(e) => {
                if e.is_not_found() {
                    for path in written {
                        let _ = fs::remove_file(path);
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(())
}
