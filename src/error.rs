//! # Error Handling
//!
//! This module defines the centralized error type for `yacpm`. It uses the
//! `thiserror` library to build one `Error` enum covering every failure the
//! resolver can hit, with messages that name the package, remote, or command
//! involved.
//!
//! ## Taxonomy
//!
//! - **Configuration errors** (`ConfigParse`, `InvalidVariable`,
//!   `MissingRepository`): a manifest or package descriptor is malformed or
//!   lacks a required field. Fatal, reported before any work is done for the
//!   offending package.
//! - **Not found** (`NotFound`): a remote does not serve an artifact. Only the
//!   remote locator handles this variant; it moves on to the next remote.
//! - **Remote exhausted** (`PackageNotFound`): no remote served the package.
//! - **External failures** (`GitCommand`, `Network`): a `git` invocation exited
//!   non-zero or an HTTP request failed. Never retried.
//!
//! `Result<T>` is the alias used throughout the library.

use thiserror::Error;

/// Main error type for yacpm operations
#[derive(Error, Debug)]
pub enum Error {
    /// The manifest or a package descriptor could not be parsed, or it lacks a
    /// required field.
    ///
    /// Optionally carries a hint about how to fix the file.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A build variable was neither a boolean nor a string.
    #[error("Variable {variable} of package {package} needs to be a string or boolean")]
    InvalidVariable { package: String, variable: String },

    /// No repository URL could be determined for a package.
    #[error("No repository known for package {package}: set `repository` in yacpm.json or in its yacpkg.json")]
    MissingRepository { package: String },

    /// A remote does not serve the requested artifact.
    #[error("Not found: {location}")]
    NotFound { location: String },

    /// Every remote was tried and none served the package.
    #[error("{package} was not found on any remote (tried: {})", remotes.join(", "))]
    PackageNotFound {
        package: String,
        remotes: Vec<String>,
    },

    /// A git command exited with a non-zero status.
    #[error("Git command failed in {dir}: git {command}\n{stderr}")]
    GitCommand {
        command: String,
        dir: String,
        stderr: String,
    },

    /// An HTTP request failed for a reason other than "not found".
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means "the remote does not have it", as opposed to a
    /// failure that should abort the run.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
