//! Command-line interface

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, ConfigCommands, OrgCommands, PackageCommands};
