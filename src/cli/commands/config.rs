//! Config commands: show, path

use crate::cli::args::ConfigCommands;
use crate::config::{Config, ConfigManager};
use crate::error::OrgboxResult;

/// Execute a config subcommand
pub async fn execute(
    command: ConfigCommands,
    config: &Config,
    manager: &ConfigManager,
) -> OrgboxResult<()> {
    match command {
        ConfigCommands::Show => {
            print!("{}", toml::to_string_pretty(config)?);
        }
        ConfigCommands::Path => {
            println!("{}", manager.config_path().display());
        }
    }
    Ok(())
}
