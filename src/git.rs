use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;

use log::{debug, info};
use regex::Regex;

use crate::error::Error;

/// How a reference is known to the remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Branch,
    Tag,
    /// Neither a branch nor a tag, so taken to be a commit id.
    Commit,
}

/// Run `git <args>` in `dir` and return its stdout.
///
/// This uses the system git command, so SSH keys, credential helpers and
/// anything else configured in ~/.gitconfig apply to every call.
pub fn run(dir: &Path, args: &[&str], verbose: bool) -> Result<String, Error> {
    let command = args.join(" ");
    if verbose {
        info!("git {}", command);
    } else {
        debug!("git {} (in {})", command, dir.display());
    }

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|e| Error::GitCommand {
            command: command.clone(),
            dir: dir.display().to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Provide helpful error message for common auth failures
        let stderr = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            format!(
                "Authentication failed. Make sure you have access to the repository.\n\
                For private repos, ensure you have an SSH key in ssh-agent or git\n\
                credentials configured.\n\
                Error: {}",
                stderr.trim_end()
            )
        } else {
            stderr.trim_end().to_string()
        };

        return Err(Error::GitCommand {
            command,
            dir: dir.display().to_string(),
            stderr,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// `git init` followed by `git remote add origin <url>`.
pub fn init(dir: &Path, url: &str, verbose: bool) -> Result<(), Error> {
    run(dir, &["init"], verbose)?;
    run(dir, &["remote", "add", "origin", url], verbose)?;
    Ok(())
}

pub fn set_origin(dir: &Path, url: &str, verbose: bool) -> Result<(), Error> {
    run(dir, &["remote", "set-url", "origin", url], verbose)?;
    Ok(())
}

/// Ask the remote for its default branch.
pub fn default_branch(dir: &Path, url: &str, verbose: bool) -> Result<String, Error> {
    let output = run(dir, &["remote", "show", url], verbose)?;
    parse_head_branch(&output).ok_or_else(|| Error::GitCommand {
        command: format!("remote show {}", url),
        dir: dir.display().to_string(),
        stderr: "could not determine the default branch (no HEAD branch line)".to_string(),
    })
}

/// Fetch a single reference with depth 1 and no blobs.
pub fn fetch_shallow(dir: &Path, reference: &str, verbose: bool) -> Result<(), Error> {
    run(
        dir,
        &["fetch", "--depth", "1", "--filter=blob:none", "origin", reference],
        verbose,
    )?;
    Ok(())
}

pub fn sparse_checkout_init(dir: &Path, verbose: bool) -> Result<(), Error> {
    run(dir, &["sparse-checkout", "init"], verbose)?;
    Ok(())
}

pub fn checkout_fetch_head(dir: &Path, verbose: bool) -> Result<(), Error> {
    run(dir, &["checkout", "FETCH_HEAD"], verbose)?;
    Ok(())
}

pub fn sparse_checkout_set(dir: &Path, paths: &[String], verbose: bool) -> Result<(), Error> {
    let mut args = vec!["sparse-checkout", "set"];
    args.extend(paths.iter().map(String::as_str));
    run(dir, &args, verbose)?;
    Ok(())
}

/// Classify `reference` against the branches and tags of `origin`.
pub fn classify_reference(dir: &Path, reference: &str, verbose: bool) -> Result<RefKind, Error> {
    let output = run(
        dir,
        &["ls-remote", "--heads", "--tags", "origin", reference],
        verbose,
    )?;
    Ok(parse_ls_remote(&output, reference))
}

pub fn head_commit(dir: &Path, verbose: bool) -> Result<String, Error> {
    Ok(run(dir, &["rev-parse", "HEAD"], verbose)?.trim().to_string())
}

/// Extract the branch from the `HEAD branch: <name>` line of `git remote show`.
pub fn parse_head_branch(output: &str) -> Option<String> {
    static HEAD_BRANCH: OnceLock<Option<Regex>> = OnceLock::new();
    HEAD_BRANCH
        .get_or_init(|| Regex::new(r"(?m)HEAD branch:\s*(\S+)\s*$").ok())
        .as_ref()?
        .captures(output)
        .map(|captures| captures[1].to_string())
}

/// Decide what `reference` is from `git ls-remote` output.
///
/// ls-remote matches patterns against the tail of the ref name, so
/// `ls-remote origin main` also lists `refs/heads/feature/main`; only exact
/// matches count. A name that is both a branch and a tag is a branch.
pub fn parse_ls_remote(output: &str, reference: &str) -> RefKind {
    let short = reference
        .strip_prefix("refs/heads/")
        .or_else(|| reference.strip_prefix("refs/tags/"))
        .unwrap_or(reference);

    let mut kind = RefKind::Commit;
    for line in output.lines() {
        // Git ls-remote output format: <hash>\t<ref>
        let Some((_, name)) = line.split_once('\t') else {
            continue;
        };
        if name.strip_prefix("refs/heads/") == Some(short) {
            return RefKind::Branch;
        }
        let tag = name.strip_prefix("refs/tags/").map(|t| t.trim_end_matches("^{}"));
        if tag == Some(short) {
            kind = RefKind::Tag;
        }
    }
    kind
}
