//! Removal of package directories nothing asks for anymore.
//!
//! Runs only after resolution has finished without error, so a failed run
//! never deletes anything.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::info;
use walkdir::WalkDir;

use crate::error::Result;

/// Delete every directory directly under `packages_dir` whose name is not in
/// `keep`. Returns the removed names, sorted.
pub fn execute(packages_dir: &Path, keep: &HashSet<&str>) -> Result<Vec<String>> {
    if !packages_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut removed = Vec::new();
    for entry in WalkDir::new(packages_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if keep.contains(name.as_str()) {
            continue;
        }

        info!("Removing unused package {}", name);
        fs::remove_dir_all(entry.path())?;
        removed.push(name);
    }
    Ok(removed)
}
