//! # yacpm CLI
//!
//! The binary entry point for the `yacpm` command-line tool.
//!
//! It parses arguments with `clap`, runs the selected command, and turns
//! errors into readable output. All package management logic lives in the
//! library crate; the binary is a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
