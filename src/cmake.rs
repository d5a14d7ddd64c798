//! Generated CMake text: the per-package build descriptor and the
//! `packages.cmake` integration file.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::defaults::{CMAKE_FILE, DOWNLOADED_CMAKE_FILE};
use crate::error::Result;
use crate::manifest::VariableValue;

/// One `set(... CACHE ... FORCE)` line per variable, so the values override
/// whatever the package's own options default to.
pub fn variables_prelude(variables: &IndexMap<String, VariableValue>) -> String {
    let mut prelude = String::new();
    for (name, value) in variables {
        let line = match value {
            VariableValue::Bool(enabled) => format!(
                "set({} {} CACHE BOOL \"\" FORCE)\n",
                name,
                if *enabled { "ON" } else { "OFF" }
            ),
            VariableValue::String(text) => format!(
                "set({} \"{}\" CACHE STRING \"\" FORCE)\n",
                name,
                text.replace('\\', "\\\\").replace('"', "\\\"")
            ),
        };
        prelude.push_str(&line);
    }
    prelude
}

/// Write `CMakeLists.txt` as the prelude followed by the downloaded descriptor.
pub fn write_build_descriptor(
    package_dir: &Path,
    variables: &IndexMap<String, VariableValue>,
) -> Result<()> {
    let downloaded = fs::read_to_string(package_dir.join(DOWNLOADED_CMAKE_FILE))?;
    let content = variables_prelude(variables) + &downloaded;
    fs::write(package_dir.join(CMAKE_FILE), content)?;
    Ok(())
}

/// The integration file included by the consuming project.
///
/// Each package directory is only added when no target of that name exists
/// yet, so a project that also vendors one of the packages still configures.
pub fn render_integration_file<S: AsRef<str>>(names: &[S]) -> String {
    let names: Vec<&str> = names.iter().map(AsRef::as_ref).collect();
    let mut output = format!("set(YACPM_PKGS {})\n", names.join(" "));
    for name in names {
        output.push_str(&format!(
            "\nif(NOT TARGET {name})\n    add_subdirectory(${{CMAKE_CURRENT_LIST_DIR}}/{name})\nendif()\n"
        ));
    }
    output
}
