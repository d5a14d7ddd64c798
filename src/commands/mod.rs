//! # CLI Command Implementations
//!
//! One module per `yacpm` subcommand. Each has an `Args` struct derived with
//! `clap` and an `execute` function that calls into the `yacpm` library.

pub mod completions;
pub mod install;
pub mod ls;
pub mod tree;
