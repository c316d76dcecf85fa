//! Package commands: install, list

use crate::cli::args::{OutputFormat, PackageInstallArgs, PackageListArgs};
use crate::config::Config;
use crate::error::OrgboxResult;
use crate::org::{into_shared, OrgManager, OrgPackages, SfPackageSource};
use crate::packages::{
    ensure_installed, InstallOutcome, PackageInstallOptions, PackageRef, SfPackageInstaller,
    SharedPackageState,
};
use crate::sf::SfCli;
use crate::ui;
use console::style;
use std::time::Duration;
use tracing::debug;

/// Execute package install.
///
/// All specs for one invocation share a package-state registry, so a package
/// appearing several times (or already satisfied by an earlier install in
/// the same run) is only installed once.
pub async fn install(args: PackageInstallArgs, config: &Config) -> OrgboxResult<()> {
    let packages: Vec<PackageRef> = args
        .packages
        .iter()
        .map(|spec| spec.parse())
        .collect::<OrgboxResult<_>>()?;

    let manager = OrgManager::new().await?;
    let record = manager.require(&args.org).await?;

    let cli = SfCli::with_binary(&config.cli.binary);
    cli.ensure_available().await?;

    let org = into_shared(OrgPackages::new(Box::new(SfPackageSource::new(
        cli.clone(),
        record.username.clone(),
    ))));

    let installer = SfPackageInstaller::new(cli, record.username.clone())
        .with_wait_minutes(args.wait.unwrap_or(config.install.wait_minutes))
        .with_attempts(config.install.attempts)
        .with_retry_delay(Duration::from_secs(config.install.retry_delay_secs));

    let options = PackageInstallOptions {
        security_type: args.security_type.into(),
        installation_key: args.installation_key.clone(),
    };

    let mut shared = SharedPackageState::new();
    shared.bind(org.clone()).await?;

    let mut installed = 0;
    for package in &packages {
        let pb = ui::spinner(&format!("Installing {}...", package));
        let outcome =
            ensure_installed(&org, &installer, package, &options, Some(&mut shared)).await;
        pb.finish_and_clear();

        match outcome? {
            InstallOutcome::Installed => {
                installed += 1;
                println!("{} Installed {}", style("✓").green(), style(package).cyan());
            }
            InstallOutcome::AlreadyPresent => {
                debug!("{} already present", package);
                println!(
                    "{} {} already present",
                    style("·").dim(),
                    style(package).cyan()
                );
            }
        }
    }

    println!(
        "{} {} installed, {} already present",
        style("✓").green(),
        installed,
        packages.len() - installed
    );
    Ok(())
}

/// Execute package list
pub async fn list(args: PackageListArgs, config: &Config) -> OrgboxResult<()> {
    let manager = OrgManager::new().await?;
    let record = manager.require(&args.org).await?;

    let cli = SfCli::with_binary(&config.cli.binary);
    cli.ensure_available().await?;

    let mut org = OrgPackages::new(Box::new(SfPackageSource::new(cli, record.username.clone())));
    let packages = org.installed_packages().await?;

    let mut keys: Vec<&String> = packages.keys().collect();
    keys.sort();

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(packages)?);
        }
        OutputFormat::Plain => {
            for key in keys {
                for version_record in &packages[key] {
                    println!("{}\t{}", key, version_record.version);
                }
            }
        }
        OutputFormat::Table => {
            if keys.is_empty() {
                println!("No packages installed in {}", record.username);
                return Ok(());
            }
            println!(
                "{:<40} {:<20} {:<20}",
                style("KEY").bold(),
                style("VERSION").bold(),
                style("VERSION ID").bold()
            );
            println!("{}", "-".repeat(80));
            for key in keys {
                for version_record in &packages[key] {
                    println!(
                        "{:<40} {:<20} {:<20}",
                        key, version_record.version, version_record.id
                    );
                }
            }
        }
    }
    Ok(())
}
