//! In-memory git and fetch operations for unit tests.
//!
//! `MockGit` simulates a set of upstream repositories (branches, tags and a
//! default branch per URL) and the local checkouts made from them. `MockFetch`
//! serves package artifacts from a map keyed by source location. Both are
//! cheap to clone and clones share state, so a test can hand one to an
//! `Installer` and still inspect what happened afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::repository::{FetchOperations, FetchOutcome, GitOperations, RefKind};

#[derive(Debug, Clone, Default)]
struct MockUpstream {
    default_branch: String,
    branches: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct MockGitState {
    upstreams: HashMap<String, MockUpstream>,
    origins: HashMap<PathBuf, String>,
    fetched: HashMap<PathBuf, String>,
    heads: HashMap<PathBuf, String>,
    selections: HashMap<PathBuf, Vec<String>>,
    calls: Vec<String>,
}

/// Mock git operations for testing
#[derive(Debug, Clone, Default)]
pub struct MockGit {
    state: Arc<Mutex<MockGitState>>,
}

fn is_commit_id(reference: &str) -> bool {
    reference.len() == 40 && reference.chars().all(|c| c.is_ascii_hexdigit())
}

impl MockGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_remote(&self, url: &str, default_branch: &str) {
        let mut state = self.state.lock().unwrap();
        let upstream = state.upstreams.entry(url.to_string()).or_default();
        upstream.default_branch = default_branch.to_string();
    }

    /// Create or move a branch.
    pub fn set_branch(&self, url: &str, branch: &str, commit: &str) {
        let mut state = self.state.lock().unwrap();
        let upstream = state.upstreams.entry(url.to_string()).or_default();
        upstream
            .branches
            .insert(branch.to_string(), commit.to_string());
    }

    pub fn set_tag(&self, url: &str, tag: &str, commit: &str) {
        let mut state = self.state.lock().unwrap();
        let upstream = state.upstreams.entry(url.to_string()).or_default();
        upstream.tags.insert(tag.to_string(), commit.to_string());
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn count_calls(&self, prefix: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    /// Commit checked out in `repo_dir`.
    pub fn head(&self, repo_dir: &Path) -> Option<String> {
        self.state.lock().unwrap().heads.get(repo_dir).cloned()
    }

    /// Last sparse selection applied in `repo_dir`.
    pub fn selection(&self, repo_dir: &Path) -> Option<Vec<String>> {
        self.state.lock().unwrap().selections.get(repo_dir).cloned()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn upstream_of(&self, repo_dir: &Path) -> Result<MockUpstream> {
        let state = self.state.lock().unwrap();
        state
            .origins
            .get(repo_dir)
            .and_then(|url| state.upstreams.get(url))
            .cloned()
            .ok_or_else(|| Error::GitCommand {
                command: "fetch".to_string(),
                dir: repo_dir.display().to_string(),
                stderr: "fatal: 'origin' does not appear to be a git repository".to_string(),
            })
    }
}

impl GitOperations for MockGit {
    fn init(&self, repo_dir: &Path, url: &str) -> Result<()> {
        fs::create_dir_all(repo_dir.join(".git"))?;
        self.record(format!("init {}", url));
        self.state
            .lock()
            .unwrap()
            .origins
            .insert(repo_dir.to_path_buf(), url.to_string());
        Ok(())
    }

    fn set_origin(&self, repo_dir: &Path, url: &str) -> Result<()> {
        self.record(format!("remote set-url origin {}", url));
        self.state
            .lock()
            .unwrap()
            .origins
            .insert(repo_dir.to_path_buf(), url.to_string());
        Ok(())
    }

    fn default_branch(&self, _repo_dir: &Path, url: &str) -> Result<String> {
        self.record(format!("remote show {}", url));
        let state = self.state.lock().unwrap();
        state
            .upstreams
            .get(url)
            .map(|upstream| upstream.default_branch.clone())
            .ok_or_else(|| Error::GitCommand {
                command: format!("remote show {}", url),
                dir: String::new(),
                stderr: format!("fatal: repository '{}' not found", url),
            })
    }

    fn fetch_shallow(&self, repo_dir: &Path, reference: &str) -> Result<()> {
        self.record(format!("fetch {}", reference));
        let upstream = self.upstream_of(repo_dir)?;
        let commit = upstream
            .branches
            .get(reference)
            .or_else(|| upstream.tags.get(reference))
            .cloned()
            .or_else(|| is_commit_id(reference).then(|| reference.to_string()))
            .ok_or_else(|| Error::GitCommand {
                command: format!("fetch --depth 1 --filter=blob:none origin {}", reference),
                dir: repo_dir.display().to_string(),
                stderr: format!("fatal: couldn't find remote ref {}", reference),
            })?;
        self.state
            .lock()
            .unwrap()
            .fetched
            .insert(repo_dir.to_path_buf(), commit);
        Ok(())
    }

    fn sparse_checkout_init(&self, _repo_dir: &Path) -> Result<()> {
        self.record("sparse-checkout init".to_string());
        Ok(())
    }

    fn checkout_fetch_head(&self, repo_dir: &Path) -> Result<()> {
        self.record("checkout FETCH_HEAD".to_string());
        let mut state = self.state.lock().unwrap();
        let commit = state.fetched.get(repo_dir).cloned().unwrap_or_default();
        state.heads.insert(repo_dir.to_path_buf(), commit);
        Ok(())
    }

    fn classify_reference(&self, repo_dir: &Path, reference: &str) -> Result<RefKind> {
        self.record(format!("ls-remote {}", reference));
        let upstream = self.upstream_of(repo_dir)?;
        Ok(if upstream.branches.contains_key(reference) {
            RefKind::Branch
        } else if upstream.tags.contains_key(reference) {
            RefKind::Tag
        } else {
            RefKind::Commit
        })
    }

    fn head_commit(&self, repo_dir: &Path) -> Result<String> {
        self.record("rev-parse HEAD".to_string());
        Ok(self.head(repo_dir).unwrap_or_default())
    }

    fn sparse_checkout_set(&self, repo_dir: &Path, paths: &[String]) -> Result<()> {
        self.record(format!("sparse-checkout set {}", paths.join(" ")));
        self.state
            .lock()
            .unwrap()
            .selections
            .insert(repo_dir.to_path_buf(), paths.to_vec());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MockFetchState {
    files: HashMap<String, String>,
    failing: HashSet<String>,
    fetches: usize,
}

/// Mock artifact retrieval for testing
#[derive(Debug, Clone, Default)]
pub struct MockFetch {
    state: Arc<Mutex<MockFetchState>>,
}

impl MockFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, source: &str, content: &str) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(source.to_string(), content.to_string());
    }

    /// Serve `name` from `remote` with the given descriptor and build descriptor.
    pub fn add_package(&self, remote: &str, name: &str, descriptor: &str, cmake: &str) {
        self.add_file(&format!("{}/{}/yacpkg.json", remote, name), descriptor);
        self.add_file(&format!("{}/{}/CMakeLists.txt", remote, name), cmake);
    }

    /// Make `source` fail with a network error instead of not-found.
    pub fn fail_with_network_error(&self, source: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(source.to_string());
    }

    /// Number of artifacts actually written.
    pub fn fetch_count(&self) -> usize {
        self.state.lock().unwrap().fetches
    }
}

impl FetchOperations for MockFetch {
    fn fetch_if_missing(&self, source: &str, destination: &Path) -> Result<FetchOutcome> {
        if destination.exists() {
            return Ok(FetchOutcome::Present);
        }

        let content = {
            let state = self.state.lock().unwrap();
            if state.failing.contains(source) {
                return Err(Error::Network {
                    url: source.to_string(),
                    message: "HTTP 500 Internal Server Error".to_string(),
                });
            }
            state.files.get(source).cloned()
        };
        let content = content.ok_or_else(|| Error::NotFound {
            location: source.to_string(),
        })?;

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(destination, content)?;
        self.state.lock().unwrap().fetches += 1;
        Ok(FetchOutcome::Fetched)
    }
}
