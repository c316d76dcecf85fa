//! CLI command implementations

pub mod config;
pub mod org;
pub mod package;
