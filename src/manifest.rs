//! # Manifest Schema and Parsing
//!
//! This module defines the data structures behind `yacpm.json`, the project
//! manifest, and the `dependencies` section of a package's own `yacpkg.json`
//! (which has the same shape as `packages`).
//!
//! ## Request shapes
//!
//! A package can be declared in two ways:
//!
//! ```json
//! {
//!     "packages": {
//!         "glm": "0.9.9.8",
//!         "glfw": {
//!             "version": "+master",
//!             "include": ["include", "src"],
//!             "variables": { "GLFW_BUILD_DOCS": false }
//!         }
//!     }
//! }
//! ```
//!
//! The shorthand string is the version. The object form must carry a `version`
//! field. Both are kept as a [`PackageEntry`] so that writing the manifest back
//! preserves the shape the user chose, and both normalize to a
//! [`PackageRequest`] which is the only form the resolver works with.
//!
//! Fields the tool does not know about are preserved untouched, and so is the
//! order of keys.

use crate::defaults::DEFAULT_REMOTE;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// Ordered mapping of package name to its declaration.
pub type PackageMap = IndexMap<String, PackageEntry>;

/// A build variable value passed to the package's CMake configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Bool(bool),
    String(String),
}

/// One package declaration exactly as written in a manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PackageEntry {
    /// `"name": "version"`
    Version(String),
    /// `"name": { "version": ..., ... }`
    Detailed(PackageRequest),
}

/// A fully specified package request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageRequest {
    /// Version spec: empty for the default branch, a ref to freeze, or a
    /// `+`/`++` prefixed floating ref.
    pub version: String,

    /// Git repository overriding the one from the package descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    /// Explicit CMakeLists.txt location (path or URL). Only used when
    /// `repository` is also set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmake: Option<String>,

    /// Extra paths to materialize in the sparse checkout.
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub include: Vec<String>,

    /// CMake cache variables set before the package's build descriptor runs.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, Value>,

    /// Spec the `version` was frozen from (dependency packages only).
    #[serde(
        rename = "^requested",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub requested: Option<String>,

    /// Packages that declared this one (dependency packages only).
    #[serde(rename = "^dependents", default, skip_serializing_if = "Vec::is_empty")]
    pub dependents: Vec<String>,

    /// Also declared in the project's own `packages` (dependency packages only).
    #[serde(rename = "^direct", default, skip_serializing_if = "std::ops::Not::not")]
    pub direct: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PackageRequest {
    /// A request carrying only a version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Default::default()
        }
    }

    /// Typed build variables, failing on anything but booleans and strings.
    pub fn build_variables(&self, package: &str) -> Result<IndexMap<String, VariableValue>> {
        self.variables
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::Bool(b) => VariableValue::Bool(*b),
                    Value::String(s) => VariableValue::String(s.clone()),
                    _ => {
                        return Err(Error::InvalidVariable {
                            package: package.to_string(),
                            variable: name.clone(),
                        })
                    }
                };
                Ok((name.clone(), value))
            })
            .collect()
    }
}

impl PackageEntry {
    /// Normalize to the full request form.
    pub fn request(&self) -> PackageRequest {
        match self {
            PackageEntry::Version(version) => PackageRequest::new(version.clone()),
            PackageEntry::Detailed(request) => request.clone(),
        }
    }

    pub fn version(&self) -> &str {
        match self {
            PackageEntry::Version(version) => version,
            PackageEntry::Detailed(request) => &request.version,
        }
    }

    /// Replace the version, keeping the declaration shape.
    pub fn set_version(&mut self, version: &str) {
        match self {
            PackageEntry::Version(v) => *v = version.to_string(),
            PackageEntry::Detailed(request) => request.version = version.to_string(),
        }
    }
}

/// Accept either a single string or a list of strings.
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(item) => vec![item],
        OneOrMany::Many(items) => items,
    })
}

/// Parse one package declaration, reporting shape errors against `name`.
pub fn parse_entry(name: &str, value: &Value) -> Result<PackageEntry> {
    match value {
        Value::String(version) => Ok(PackageEntry::Version(version.clone())),
        Value::Object(object) => {
            if !matches!(object.get("version"), Some(Value::String(_))) {
                return Err(Error::ConfigParse {
                    message: format!("Package {} needs a version field that is a string", name),
                    hint: Some(format!(
                        "Use \"{}\": {{ \"version\": \"\" }} to track the default branch",
                        name
                    )),
                });
            }
            let request: PackageRequest =
                serde_json::from_value(value.clone()).map_err(|e| Error::ConfigParse {
                    message: format!("Invalid declaration for package {}: {}", name, e),
                    hint: None,
                })?;
            request.build_variables(name)?;
            Ok(PackageEntry::Detailed(request))
        }
        _ => Err(Error::ConfigParse {
            message: format!(
                "Package {} must be a version string or an object with a version field",
                name
            ),
            hint: None,
        }),
    }
}

/// Parse a `packages`-shaped object. `field` names it in error messages.
pub fn parse_package_map(value: &Value, field: &str) -> Result<PackageMap> {
    let object = value.as_object().ok_or_else(|| Error::ConfigParse {
        message: format!("Expected {} to be an object", field),
        hint: None,
    })?;

    object
        .iter()
        .map(|(name, entry)| Ok((name.clone(), parse_entry(name, entry)?)))
        .collect()
}

/// Parse a `remote`/`remotes` value: a string or a list of strings.
pub fn parse_remotes(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::String(remote) => Ok(vec![remote.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| Error::ConfigParse {
                    message: "Expected every remote to be a string".to_string(),
                    hint: None,
                })
            })
            .collect(),
        _ => Err(Error::ConfigParse {
            message: "Expected remotes to be a string or a list of strings".to_string(),
            hint: None,
        }),
    }
}

/// The project manifest, `yacpm.json`.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Packages requested directly by the project.
    pub packages: PackageMap,
    /// Packages only required by other packages, maintained by the tool.
    pub dependency_packages: PackageMap,
    /// Remotes searched for package metadata, in order.
    pub remotes: Vec<String>,
    /// Echo every git command.
    pub verbose: bool,
    /// The document as read, used to keep unknown fields on write-back.
    raw: Map<String, Value>,
}

impl Manifest {
    /// Parse a manifest from its JSON text.
    pub fn parse(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content).map_err(|e| Error::ConfigParse {
            message: format!("Invalid JSON in yacpm.json: {}", e),
            hint: None,
        })?;
        let raw = match value {
            Value::Object(map) => map,
            _ => {
                return Err(Error::ConfigParse {
                    message: "Expected yacpm.json to contain a JSON object".to_string(),
                    hint: None,
                })
            }
        };

        let packages = match raw.get("packages") {
            Some(value @ Value::Object(_)) => parse_package_map(value, "packages")?,
            _ => {
                return Err(Error::ConfigParse {
                    message: "Expected yacpm.json to have a packages field that is an object"
                        .to_string(),
                    hint: Some("Add \"packages\": {} to yacpm.json".to_string()),
                })
            }
        };

        let dependency_packages = match raw.get("dependency_packages") {
            Some(value) => parse_package_map(value, "dependency_packages")?,
            None => PackageMap::new(),
        };

        let remotes = match raw.get("remotes").or_else(|| raw.get("remote")) {
            Some(value) => parse_remotes(value)?,
            None => vec![DEFAULT_REMOTE.to_string()],
        };

        let verbose = raw.get("verbose").and_then(Value::as_bool).unwrap_or(false);

        Ok(Self {
            packages,
            dependency_packages,
            remotes,
            verbose,
            raw,
        })
    }

    /// Read and parse a manifest file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Serialize the manifest, keeping unknown fields and key order.
    pub fn to_json_string(&self) -> Result<String> {
        let mut document = self.raw.clone();
        document.insert("packages".to_string(), serde_json::to_value(&self.packages)?);
        if self.dependency_packages.is_empty() {
            document.shift_remove("dependency_packages");
        } else {
            document.insert(
                "dependency_packages".to_string(),
                serde_json::to_value(&self.dependency_packages)?,
            );
        }
        to_pretty_json(&document)
    }

    /// Write the manifest back to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

/// JSON with four-space indentation, the layout used for every file yacpm writes.
pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    buffer.push(b'\n');
    // serde_json only ever emits valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
