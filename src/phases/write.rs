//! Writing the run's results back: manifest reclassification and the
//! `packages.cmake` integration file.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::merge::{MergeTable, ResolvedPackage};
use crate::cmake;
use crate::error::Result;
use crate::manifest::{Manifest, PackageEntry, PackageMap, PackageRequest, VariableValue};

/// Rebuild `packages` and `dependency_packages` from the resolved table.
///
/// Packages nobody else declared stay in `packages` in the shape the user
/// wrote, with their version replaced by the resolved one. Everything else
/// goes to `dependency_packages` together with the bookkeeping the next run
/// needs to keep its frozen version: the spec it was frozen from, the
/// packages that declared it, and `^direct` when the project declared it too.
pub fn reclassify(manifest: &mut Manifest, table: &MergeTable) {
    let mut packages = PackageMap::new();
    let mut dependency_packages = PackageMap::new();

    for package in table.live() {
        if package.is_direct() {
            let mut entry = match &package.declared {
                Some(PackageEntry::Detailed(request)) if request.direct => project_entry(request),
                Some(entry) => entry.clone(),
                None => PackageEntry::Version(String::new()),
            };
            entry.set_version(&package.version);
            packages.insert(package.name.clone(), entry);
        } else {
            dependency_packages.insert(package.name.clone(), dependency_entry(package));
        }
    }

    manifest.packages = packages;
    manifest.dependency_packages = dependency_packages;
}

/// A `^direct` dependency entry going back to `packages`, without the
/// bookkeeping keys. Collapses to a plain version string when nothing else is set.
fn project_entry(request: &PackageRequest) -> PackageEntry {
    let mut request = request.clone();
    request.requested = None;
    request.dependents.clear();
    request.direct = false;
    if request == PackageRequest::new(request.version.clone()) {
        PackageEntry::Version(request.version)
    } else {
        PackageEntry::Detailed(request)
    }
}

fn dependency_entry(package: &ResolvedPackage) -> PackageEntry {
    let mut request = match &package.declared {
        Some(entry) => entry.request(),
        None => PackageRequest::default(),
    };
    request.version = package.version.clone();
    request.repository = package.repository.clone();
    request.cmake = package.cmake.clone();
    request.include = package.include_paths.clone();
    request.variables = package
        .build_variables
        .iter()
        .map(|(name, value)| {
            let value = match value {
                VariableValue::Bool(b) => Value::Bool(*b),
                VariableValue::String(s) => Value::String(s.clone()),
            };
            (name.clone(), value)
        })
        .collect();
    request.requested = Some(package.requested.clone());
    request.dependents = package.dependents.iter().cloned().collect();
    request.direct = package.declared.is_some();
    PackageEntry::Detailed(request)
}

/// Write `packages.cmake` for every live package, in resolution order.
pub fn write_integration_file(path: &Path, table: &MergeTable) -> Result<()> {
    let names: Vec<&str> = table.live().map(|package| package.name.as_str()).collect();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, cmake::render_integration_file(&names))?;
    Ok(())
}
