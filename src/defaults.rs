//! Default values and well-known file names.
//!
//! This module centralizes the names of every file yacpm reads or writes and
//! the canonical package remote, so commands and phases agree on them.

/// Sentinel accepted in the `remote`/`remotes` manifest field, substituted with
/// [`DEFAULT_REMOTE_URL`].
pub const DEFAULT_REMOTE: &str = "DEFAULT_REMOTE";

/// Branch of the canonical package index.
pub const PACKAGES_BRANCH: &str = "main";

/// The canonical package index served over HTTP.
pub const DEFAULT_REMOTE_URL: &str = "https://github.com/Calbabreaker/yacpm/raw/main/packages";

/// The project manifest.
pub const MANIFEST_FILE: &str = "yacpm.json";

/// Directory (relative to the project) holding one subdirectory per package.
pub const PACKAGES_DIR: &str = "yacpkgs";

/// Package descriptor plus checkout record, one per package directory.
pub const PACKAGE_FILE: &str = "yacpkg.json";

/// The build descriptor as served by the remote.
pub const DOWNLOADED_CMAKE_FILE: &str = "CMakeLists-downloaded.txt";

/// The build descriptor actually used: variable prelude + downloaded content.
pub const CMAKE_FILE: &str = "CMakeLists.txt";

/// Sparse git checkout of the package sources.
pub const REPOSITORY_DIR: &str = "repository";

/// Generated integration file included by the consuming project.
pub const INTEGRATION_FILE: &str = "packages.cmake";

/// Expand the [`DEFAULT_REMOTE`] sentinel; any other remote is returned as is.
pub fn expand_remote(remote: &str) -> &str {
    if remote == DEFAULT_REMOTE {
        DEFAULT_REMOTE_URL
    } else {
        remote
    }
}
