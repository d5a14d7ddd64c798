//! Shared test utilities for the CLI end-to-end tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_manifest(manifests::EMPTY)
//!         .with_remote_package("glm", r#"{"repository": "..."}"#, "add_library(glm INTERFACE)");
//!     fixture.command().arg("install").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    #[allow(unused_imports)]
    pub use super::should_skip_network_tests;
    pub use super::TestFixture;
}

/// Manifest snippets for testing.
#[allow(dead_code)]
pub mod manifests {
    /// No packages at all.
    pub const EMPTY: &str = r#"{"packages": {}}"#;

    /// A package only the fixture's local remote could serve.
    pub const LOCAL_REMOTE: &str = r#"{
    "remotes": ["./remote"],
    "packages": {"nosuchpkg": "main"}
}"#;

    /// Missing the required `packages` object.
    pub const NO_PACKAGES: &str = r#"{"remotes": ["DEFAULT_REMOTE"]}"#;

    /// Not JSON.
    pub const INVALID_JSON: &str = "{ packages: ";
}

/// Returns `true` if the `SKIP_NETWORK_TESTS` environment variable is set.
#[allow(dead_code)]
pub fn should_skip_network_tests() -> bool {
    env::var("SKIP_NETWORK_TESTS").is_ok()
}

/// A temporary project directory with a `yacpm.json` and an optional local
/// package remote under `remote/`.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `yacpm.json` with the given content.
    pub fn with_manifest(self, content: &str) -> Self {
        self.temp_dir
            .child("yacpm.json")
            .write_str(content)
            .expect("Failed to write manifest");
        self
    }

    /// Publish a package on the local remote at `remote/<name>/`.
    #[allow(dead_code)]
    pub fn with_remote_package(self, name: &str, descriptor: &str, cmake: &str) -> Self {
        self.temp_dir
            .child(format!("remote/{name}/yacpkg.json"))
            .write_str(descriptor)
            .expect("Failed to write yacpkg.json");
        self.temp_dir
            .child(format!("remote/{name}/CMakeLists.txt"))
            .write_str(cmake)
            .expect("Failed to write CMakeLists.txt");
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.temp_dir.path().join("yacpm.json")
    }

    /// Current content of `yacpm.json`.
    #[allow(dead_code)]
    pub fn manifest(&self) -> String {
        std::fs::read_to_string(self.manifest_path()).expect("Failed to read manifest")
    }

    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a git repository at `path` with one commit of `files` on `main`.
    ///
    /// Returns a `file://` URL usable as a package repository.
    #[allow(dead_code)]
    pub fn with_git_repository(&self, path: &str, files: &[(&str, &str)]) -> String {
        let dir = self.temp_dir.child(path);
        for (file, content) in files {
            dir.child(file).write_str(content).expect("Failed to write file");
        }

        let git = |args: &[&str]| {
            let status = Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .env("GIT_AUTHOR_NAME", "yacpm")
                .env("GIT_AUTHOR_EMAIL", "yacpm@example.com")
                .env("GIT_COMMITTER_NAME", "yacpm")
                .env("GIT_COMMITTER_EMAIL", "yacpm@example.com")
                .status()
                .expect("Failed to run git");
            assert!(status.success(), "git {:?} failed", args);
        };
        git(&["init", "--quiet", "--initial-branch=main"]);
        git(&["add", "--all"]);
        git(&["commit", "--quiet", "--message", "initial"]);

        format!("file://{}", dir.path().display())
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("yacpm");
        cmd.current_dir(self.path())
            .env_remove("YACPM_MANIFEST")
            .env_remove("YACPM_PACKAGES_DIR")
            .env("NO_COLOR", "1");
        cmd
    }
}
