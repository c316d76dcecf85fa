//! orgbox CLI entry point

use clap::Parser;
use console::style;
use orgbox::cli::{commands, Cli, Commands, OrgCommands, PackageCommands};
use orgbox::config::ConfigManager;
use orgbox::error::OrgboxResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> OrgboxResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("orgbox=warn"),
        1 => EnvFilter::new("orgbox=info"),
        _ => EnvFilter::new("orgbox=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        debug!("Local config discovery disabled (--no-local)");
        None
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| orgbox::error::OrgboxError::io("getting current directory", e))?;
        let found = ConfigManager::find_local_config(&cwd);
        if let Some(ref path) = found {
            debug!("Found local config: {}", path.display());
        }
        found
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    ConfigManager::ensure_state_dirs().await?;

    match cli.command {
        Commands::Org(command) => match command {
            OrgCommands::Create(args) => commands::org::create(args, &config).await,
            OrgCommands::Delete(args) => commands::org::delete(args, &config).await,
            OrgCommands::Password(args) => commands::org::password(args, &config).await,
            OrgCommands::Checkout(args) => commands::org::checkout(args, &config).await,
            OrgCommands::List(args) => commands::org::list(args, &config).await,
        },
        Commands::Package(command) => match command {
            PackageCommands::Install(args) => commands::package::install(args, &config).await,
            PackageCommands::List(args) => commands::package::list(args, &config).await,
        },
        Commands::Config(command) => {
            commands::config::execute(command, &config, &config_manager).await
        }
    }
}
