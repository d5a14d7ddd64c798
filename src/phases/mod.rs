//! Implementation of the install operation.
//!
//! ## Overview
//!
//! An install runs these phases:
//! 1. Resolve ([`resolve`]) - generations of Ready packages are processed
//!    ([`process`]) and what they declare is merged into the [`merge`] table
//! 2. Reclassify ([`write`]) - direct vs. dependency packages
//! 3. Prune ([`prune`]) - unused package directories
//! 4. Write ([`write`]) - `packages.cmake` and the manifest
//!
//! [`orchestrator`] runs them in order.

pub mod merge;
pub mod orchestrator;
pub mod process;
pub mod prune;
pub mod resolve;
pub mod write;

pub use merge::{Declaration, MergeTable, PackageState, ResolvedPackage};
pub use orchestrator::{install, install_with_operations, InstallOptions, InstallReport};
pub use resolve::{PackageProcessor, ProcessedPackage, Progress, Resolution};
