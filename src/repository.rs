//! # Git and Fetch Operations
//!
//! Everything yacpm does to the outside world goes through one of two traits:
//!
//! - **`GitOperations`**: the handful of git commands run inside a package's
//!   `repository/` checkout (init, fetch, sparse checkout, ref queries).
//!
//! - **`FetchOperations`**: downloading or copying a single package artifact
//!   from a remote, which is either an HTTP(S) URL or a local directory.
//!
//! The install pipeline only ever sees these traits. `DefaultGitOperations`
//! wraps the system `git` binary and `DefaultFetchOperations` uses a blocking
//! reqwest client or the local filesystem. Tests swap in the in-memory mocks
//! from `test_support`, so the whole resolver runs without a network.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use url::Url;

use crate::error::{Error, Result};

pub use crate::git::RefKind;

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Whether `repo_dir` already holds a git repository.
    fn is_initialized(&self, repo_dir: &Path) -> bool {
        repo_dir.join(".git").exists()
    }

    /// Create a repository in `repo_dir` with `origin` pointing at `url`.
    fn init(&self, repo_dir: &Path, url: &str) -> Result<()>;

    /// Re-point `origin` at `url`.
    fn set_origin(&self, repo_dir: &Path, url: &str) -> Result<()>;

    /// Name of the default branch of the repository at `url`.
    fn default_branch(&self, repo_dir: &Path, url: &str) -> Result<String>;

    /// Shallow, blob-less fetch of `reference` from `origin`.
    fn fetch_shallow(&self, repo_dir: &Path, reference: &str) -> Result<()>;

    fn sparse_checkout_init(&self, repo_dir: &Path) -> Result<()>;

    fn checkout_fetch_head(&self, repo_dir: &Path) -> Result<()>;

    /// Whether `reference` names a branch or tag on `origin`.
    fn classify_reference(&self, repo_dir: &Path, reference: &str) -> Result<RefKind>;

    /// Commit id of the current checkout.
    fn head_commit(&self, repo_dir: &Path) -> Result<String>;

    /// Restrict the working tree to `paths`, downloading what is missing.
    fn sparse_checkout_set(&self, repo_dir: &Path, paths: &[String]) -> Result<()>;
}

/// What a fetch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The destination already existed and was left alone.
    Present,
    /// The destination was written by this call.
    Fetched,
}

/// Trait for artifact retrieval - allows mocking in tests
pub trait FetchOperations: Send + Sync {
    /// Copy or download `source` to `destination` unless `destination` exists.
    ///
    /// Fails with [`Error::NotFound`] when the source does not exist, so the
    /// caller can move on to another remote.
    fn fetch_if_missing(&self, source: &str, destination: &Path) -> Result<FetchOutcome>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command.
pub struct DefaultGitOperations {
    verbose: bool,
}

impl DefaultGitOperations {
    /// With `verbose`, every git command is echoed at info level.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl GitOperations for DefaultGitOperations {
    fn init(&self, repo_dir: &Path, url: &str) -> Result<()> {
        crate::git::init(repo_dir, url, self.verbose)
    }

    fn set_origin(&self, repo_dir: &Path, url: &str) -> Result<()> {
        crate::git::set_origin(repo_dir, url, self.verbose)
    }

    fn default_branch(&self, repo_dir: &Path, url: &str) -> Result<String> {
        crate::git::default_branch(repo_dir, url, self.verbose)
    }

    fn fetch_shallow(&self, repo_dir: &Path, reference: &str) -> Result<()> {
        crate::git::fetch_shallow(repo_dir, reference, self.verbose)
    }

    fn sparse_checkout_init(&self, repo_dir: &Path) -> Result<()> {
        crate::git::sparse_checkout_init(repo_dir, self.verbose)
    }

    fn checkout_fetch_head(&self, repo_dir: &Path) -> Result<()> {
        crate::git::checkout_fetch_head(repo_dir, self.verbose)
    }

    fn classify_reference(&self, repo_dir: &Path, reference: &str) -> Result<RefKind> {
        crate::git::classify_reference(repo_dir, reference, self.verbose)
    }

    fn head_commit(&self, repo_dir: &Path) -> Result<String> {
        crate::git::head_commit(repo_dir, self.verbose)
    }

    fn sparse_checkout_set(&self, repo_dir: &Path, paths: &[String]) -> Result<()> {
        crate::git::sparse_checkout_set(repo_dir, paths, self.verbose)
    }
}

/// Where an artifact comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Http(Url),
    Local(PathBuf),
}

impl Source {
    /// Classify `location`; relative local paths resolve against `base_dir`.
    pub fn parse(location: &str, base_dir: &Path) -> Result<Self> {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Source::Http(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Source::Local)
                .map_err(|_| Error::NotFound {
                    location: location.to_string(),
                }),
            // Anything else (relative paths, `C:\...`) is a filesystem path
            _ => Ok(Source::Local(base_dir.join(location))),
        }
    }
}

/// The default implementation of `FetchOperations`: HTTP(S) through a blocking
/// reqwest client, everything else from the local filesystem.
pub struct DefaultFetchOperations {
    base_dir: PathBuf,
    http_client: reqwest::blocking::Client,
}

impl DefaultFetchOperations {
    /// Local remotes are resolved relative to `base_dir`, the project directory.
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .user_agent(concat!("yacpm/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network {
                url: String::new(),
                message: e.to_string(),
            })?;

        Ok(Self {
            base_dir,
            http_client,
        })
    }

    fn download(&self, url: &Url, destination: &Path) -> Result<()> {
        let network_error = |message: String| Error::Network {
            url: url.to_string(),
            message,
        };

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .map_err(|e| network_error(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound {
                location: url.to_string(),
            });
        }
        if !response.status().is_success() {
            return Err(network_error(format!("HTTP {}", response.status())));
        }

        let body = response.bytes().map_err(|e| network_error(e.to_string()))?;
        fs::write(destination, &body)?;
        Ok(())
    }

    fn copy(&self, path: &Path, destination: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(Error::NotFound {
                location: path.display().to_string(),
            });
        }
        fs::copy(path, destination)?;
        Ok(())
    }
}

impl FetchOperations for DefaultFetchOperations {
    fn fetch_if_missing(&self, source: &str, destination: &Path) -> Result<FetchOutcome> {
        if destination.exists() {
            return Ok(FetchOutcome::Present);
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        debug!("Fetching {} to {}", source, destination.display());
        match Source::parse(source, &self.base_dir)? {
            Source::Http(url) => self.download(&url, destination)?,
            Source::Local(path) => self.copy(&path, destination)?,
        }
        Ok(FetchOutcome::Fetched)
    }
}
