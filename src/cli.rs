//! CLI argument parsing and command dispatch

use std::io::Write;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::Level;

use crate::commands;
use yacpm::output::OutputConfig;

/// yacpm - Yet Another CMake Package Manager
#[derive(Parser, Debug)]
#[command(name = "yacpm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Install the packages in yacpm.json and generate yacpkgs/packages.cmake
    Install(commands::install::InstallArgs),

    /// List installed packages with their versions
    Ls(commands::ls::LsArgs),

    /// Show which packages pulled in which dependencies
    Tree(commands::tree::TreeArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        let level = match &self.command {
            Commands::Install(args) if args.quiet => "warn",
            _ => self.log_level.as_str(),
        };
        init_logging(level);
        let output = OutputConfig::from_env_and_flag(&self.color);

        match self.command {
            Commands::Install(args) => commands::install::execute(args, &output),
            Commands::Ls(args) => commands::ls::execute(args, &output),
            Commands::Tree(args) => commands::tree::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Progress goes out as plain lines; warnings and errors get a prefix.
fn init_logging(filters: &str) {
    let _ = env_logger::Builder::new()
        .parse_filters(filters)
        .format(|buf, record| match record.level() {
            Level::Info => writeln!(buf, "{}", record.args()),
            Level::Warn => writeln!(buf, "warning: {}", record.args()),
            Level::Error => writeln!(buf, "error: {}", record.args()),
            level => writeln!(
                buf,
                "[{} {}] {}",
                level.as_str().to_lowercase(),
                record.target(),
                record.args()
            ),
        })
        .try_init();
}
