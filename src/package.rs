//! The per-package descriptor, `yacpkgs/<name>/yacpkg.json`.
//!
//! The descriptor is authored on a remote and copied into the package
//! directory once. It says where the sources live (`repository`), which
//! paths are always needed (`include`), and what the package itself depends
//! on (`dependencies`, same shape as the manifest's `packages`). yacpm then
//! writes its own bookkeeping next to those fields: the
//! [`CheckoutRecord`](crate::checkout::CheckoutRecord) `^` keys.
//!
//! Unknown fields and key order survive a load/save cycle.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::checkout::CheckoutRecord;
use crate::error::{Error, Result};
use crate::manifest::{one_or_many, parse_package_map, parse_remotes, to_pretty_json, PackageMap};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Git URL of the package sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Paths always included in the sparse checkout.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub include: Vec<String>,

    /// Packages this package needs, kept raw and parsed on demand.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub dependencies: Map<String, Value>,

    /// Extra remotes for resolving `dependencies`.
    #[serde(
        default,
        alias = "remote",
        skip_serializing_if = "Option::is_none"
    )]
    pub remotes: Option<Value>,

    #[serde(flatten)]
    pub record: CheckoutRecord,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageDescriptor {
    /// Read a descriptor; `package` names it in error messages.
    pub fn load(path: &Path, package: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| Error::ConfigParse {
            message: format!("Invalid yacpkg.json for package {}: {}", package, e),
            hint: Some(format!(
                "Delete {} to fetch it again from the remote",
                path.display()
            )),
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, to_pretty_json(self)?)?;
        Ok(())
    }

    /// The package's declared dependencies.
    pub fn dependency_map(&self, package: &str) -> Result<PackageMap> {
        if self.dependencies.is_empty() {
            return Ok(PackageMap::new());
        }
        parse_package_map(
            &Value::Object(self.dependencies.clone()),
            &format!("dependencies of {}", package),
        )
    }

    /// Remotes the package adds for its own dependencies.
    pub fn remote_list(&self) -> Result<Vec<String>> {
        match &self.remotes {
            Some(value) => parse_remotes(value),
            None => Ok(Vec::new()),
        }
    }
}
