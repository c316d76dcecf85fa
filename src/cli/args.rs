//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// orgbox - Scratch org provisioning and package install automation
///
/// Wraps the Salesforce CLI to create temporary scratch orgs, check orgs out
/// of a shared pool, and install packages into them.
#[derive(Parser, Debug)]
#[command(name = "orgbox")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ORGBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .orgbox.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage scratch orgs
    #[command(subcommand)]
    Org(OrgCommands),

    /// Manage packages in an org
    #[command(subcommand)]
    Package(PackageCommands),

    /// Show or locate configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Org subcommands
#[derive(Subcommand, Debug)]
pub enum OrgCommands {
    /// Create a scratch org
    Create(OrgCreateArgs),

    /// Delete a scratch org and forget it
    Delete(OrgDeleteArgs),

    /// Generate a password for an org user
    Password(OrgPasswordArgs),

    /// Checkout an org from a pool
    Checkout(OrgCheckoutArgs),

    /// List known orgs
    List(OrgListArgs),
}

/// Package subcommands
#[derive(Subcommand, Debug)]
pub enum PackageCommands {
    /// Install one or more packages into an org
    Install(PackageInstallArgs),

    /// List packages installed in an org
    List(PackageListArgs),
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,
}

/// Arguments for org create
#[derive(Parser, Debug)]
pub struct OrgCreateArgs {
    /// Local alias for the new org
    pub name: String,

    /// Org definition file (overrides config)
    #[arg(short = 'f', long)]
    pub definition: Option<PathBuf>,

    /// Days before the org expires (overrides config)
    #[arg(short, long)]
    pub days: Option<u32>,

    /// Dev Hub username (overrides config)
    #[arg(long)]
    pub devhub: Option<String>,

    /// Set the org as the CLI default
    #[arg(long)]
    pub set_default: bool,

    /// Skip password generation
    #[arg(long)]
    pub no_password: bool,
}

/// Arguments for org delete
#[derive(Parser, Debug)]
pub struct OrgDeleteArgs {
    /// Alias of the org to delete
    pub name: String,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for org password
#[derive(Parser, Debug)]
pub struct OrgPasswordArgs {
    /// Alias of the org
    pub name: String,
}

/// Arguments for org checkout
#[derive(Parser, Debug)]
pub struct OrgCheckoutArgs {
    /// Local alias for the checked-out org
    pub name: String,

    /// Pool id (overrides config)
    #[arg(short, long)]
    pub pool: Option<String>,

    /// Set the org as the CLI default
    #[arg(long)]
    pub set_default: bool,
}

/// Arguments for org list
#[derive(Parser, Debug)]
pub struct OrgListArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for package install
#[derive(Parser, Debug)]
pub struct PackageInstallArgs {
    /// Alias of the target org
    pub org: String,

    /// Package specs: 04t version ids or namespace@version
    #[arg(required = true)]
    pub packages: Vec<String>,

    /// Who the packages are installed for
    #[arg(long, value_enum, default_value = "all-users")]
    pub security_type: SecurityTypeArg,

    /// Installation key for key-protected packages
    #[arg(short = 'k', long)]
    pub installation_key: Option<String>,

    /// Minutes to wait per install (overrides config)
    #[arg(short, long)]
    pub wait: Option<u32>,
}

/// Arguments for package list
#[derive(Parser, Debug)]
pub struct PackageListArgs {
    /// Alias of the target org
    pub org: String,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format for list commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON array
    Json,
    /// One entry per line, no decoration
    Plain,
}

/// Security type flag mapped onto the install option
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityTypeArg {
    /// All users in the org
    AllUsers,
    /// Admin profiles only
    AdminsOnly,
}

impl From<SecurityTypeArg> for crate::packages::SecurityType {
    fn from(value: SecurityTypeArg) -> Self {
        match value {
            SecurityTypeArg::AllUsers => Self::AllUsers,
            SecurityTypeArg::AdminsOnly => Self::AdminsOnly,
        }
    }
}
