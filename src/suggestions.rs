//! # Error Suggestions
//!
//! Errors shown to the user should say what went wrong and how to fix it.
//! These helpers turn library errors into `anyhow` errors carrying `hint:`
//! lines.
//!
//! ```rust,ignore
//! // Instead of:
//! anyhow::bail!("Manifest not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::manifest_not_found(path));
//! ```

use std::path::Path;

use crate::defaults::DEFAULT_REMOTE;
use crate::error::Error;

/// The manifest file does not exist.
pub fn manifest_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Manifest not found: {path}\n\n\
         hint: Create a yacpm.json with a \"packages\" object in your project root\n\
         hint: Use -m/--manifest to specify a different path\n\
         hint: Set the YACPM_MANIFEST environment variable",
        path = path.display()
    )
}

/// No remote serves the package.
pub fn package_not_found(package: &str, remotes: &[String]) -> anyhow::Error {
    let remote_hint = if remotes.iter().any(|r| r.starts_with("http")) {
        "hint: Check the package name against the remote's packages directory"
    } else {
        "hint: Local remotes are resolved relative to the directory of yacpm.json"
    };
    anyhow::anyhow!(
        "Package {package} was not found on any remote\n\
         tried: {tried}\n\n\
         {remote_hint}\n\
         hint: Add a remote that has it with \"remotes\": [\"<url or path>\", \"{DEFAULT_REMOTE}\"]\n\
         hint: Or set both \"repository\" and \"cmake\" for {package} to skip the remotes",
        tried = remotes.join(", ")
    )
}

/// A git command failed.
pub fn git_failed(command: &str, dir: &str, stderr: &str) -> anyhow::Error {
    let hint = if stderr.contains("couldn't find remote ref") {
        "hint: The version does not name a branch, tag or commit of the repository"
    } else if stderr.contains("Authentication failed") {
        "hint: Check your SSH keys or git credentials for this repository"
    } else {
        "hint: Set \"verbose\": true in yacpm.json (or pass --verbose) to see every git command"
    };
    anyhow::anyhow!("git {command} failed in {dir}\n{stderr}\n\n{hint}")
}

/// Attach hints to a library error where there is something useful to say.
pub fn explain(error: Error) -> anyhow::Error {
    match error {
        Error::PackageNotFound { package, remotes } => package_not_found(&package, &remotes),
        Error::GitCommand {
            command,
            dir,
            stderr,
        } => git_failed(&command, &dir, &stderr),
        Error::MissingRepository { package } => anyhow::anyhow!(
            "No repository known for package {package}\n\n\
             hint: Add \"repository\" to {package} in yacpm.json\n\
             hint: Or delete yacpkgs/{package} to fetch its yacpkg.json again"
        ),
        other => anyhow::Error::new(other),
    }
}
