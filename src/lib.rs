//! orgbox - Scratch org provisioning and package install automation
//!
//! Wraps the Salesforce CLI to create temporary scratch orgs, check orgs out
//! of a shared pool, and install packages into them while deduplicating
//! install attempts across one session.

pub mod cli;
pub mod config;
pub mod error;
pub mod org;
pub mod packages;
pub mod sf;
pub mod ui;

pub use error::{OrgboxError, OrgboxResult};
