//! # yacpm
//!
//! A package manager for CMake projects. A project lists the packages it wants
//! in `yacpm.json`; yacpm finds each package's metadata on a remote, checks
//! out only the needed paths of its git repository, resolves the packages the
//! packages themselves depend on, and generates a `packages.cmake` file the
//! project includes to build all of them.
//!
//! ## Quick Example
//!
//! ```
//! use yacpm::cmake;
//! use yacpm::manifest::Manifest;
//! use yacpm::sparse;
//!
//! let manifest = Manifest::parse(r#"{
//!     "packages": {
//!         "glm": "0.9.9.8",
//!         "imgui": { "version": "+docking", "include": ["backends"] }
//!     }
//! }"#).unwrap();
//!
//! let imgui = manifest.packages["imgui"].request();
//! let selection = sparse::compute_selection(&["imgui.h".to_string()], &imgui.include, &[]);
//! assert_eq!(selection, vec!["imgui.h", "backends"]);
//!
//! let names: Vec<&str> = manifest.packages.keys().map(String::as_str).collect();
//! assert!(cmake::render_integration_file(&names).starts_with("set(YACPM_PKGS glm imgui)"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifest (`manifest`)**: `yacpm.json`, the packages a project requests
//!   and the dependency packages yacpm found for it.
//! - **Package descriptor (`package`, `checkout`)**: `yacpkg.json` in each
//!   package directory, with the package's repository and dependencies plus a
//!   record of what is checked out.
//! - **Versions (`version`)**: empty, exact, or `+`/`++` floating specs, and
//!   freezing branches and tags to commits.
//! - **Sparse checkout (`sparse`)**: which paths of a repository to materialize.
//! - **Remotes (`remote`, `repository`, `git`)**: finding package metadata and
//!   running git, behind traits that tests replace with mocks.
//! - **Phases (`phases`)**: the resolver and the install pipeline.
//!
//! ## Execution Flow
//!
//! `phases::install` runs generations of packages: each Ready package gets its
//! metadata fetched, its version resolved, and its sparse selection applied,
//! and the dependencies it declares are merged into the table for the next
//! generation. When nothing is left, packages are written back to the manifest
//! as direct or dependency packages, unused package directories are removed,
//! and `packages.cmake` is generated.

pub mod checkout;
pub mod cmake;
pub mod defaults;
pub mod error;
pub mod git;
pub mod manifest;
pub mod output;
pub mod package;
pub mod phases;
pub mod remote;
pub mod repository;
pub mod sparse;
pub mod suggestions;
pub mod version;

#[cfg(test)]
mod test_support;
