//! Org commands: create, delete, password, checkout, list

use crate::cli::args::{
    OrgCheckoutArgs, OrgCreateArgs, OrgDeleteArgs, OrgListArgs, OrgPasswordArgs, OutputFormat,
};
use crate::config::Config;
use crate::error::{OrgboxError, OrgboxResult};
use crate::org::{OrgKind, OrgManager, OrgPool, OrgRecord, ScratchOrgs};
use crate::sf::SfCli;
use crate::ui::{self, UiContext};
use console::style;
use tracing::debug;

/// Execute org create
pub async fn create(args: OrgCreateArgs, config: &Config) -> OrgboxResult<()> {
    let cli = SfCli::with_binary(&config.cli.binary);
    cli.ensure_available().await?;

    let manager = OrgManager::new().await?;
    if manager.get(&args.name).await?.is_some() {
        return Err(OrgboxError::OrgExists(args.name));
    }

    let mut scratch = config.scratch.clone();
    if let Some(definition) = args.definition {
        scratch.definition_file = definition;
    }
    if let Some(days) = args.days {
        scratch.days = days;
    }
    scratch.set_default = scratch.set_default || args.set_default;
    if args.no_password {
        scratch.set_password = false;
    }

    let devhub = args
        .devhub
        .as_deref()
        .or(config.devhub.username.as_deref());
    debug!("Creating scratch org {} (devhub: {:?})", args.name, devhub);

    let pb = ui::spinner("Creating scratch org...");
    let orgs = ScratchOrgs::new(cli);
    let record = orgs.create(&args.name, &scratch, devhub).await?;
    manager.create(&record).await?;
    pb.finish_and_clear();

    println!(
        "{} Created {} ({}) expiring in {} days",
        style("✓").green(),
        style(&record.name).cyan(),
        record.username,
        record.days
    );
    Ok(())
}

/// Execute org delete
pub async fn delete(args: OrgDeleteArgs, config: &Config) -> OrgboxResult<()> {
    let manager = OrgManager::new().await?;
    let record = manager.require(&args.name).await?;

    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let confirmed = ui::confirm(
        &ctx,
        &format!("Delete org {} ({})?", record.name, record.username),
        false,
    )
    .await?;
    if !confirmed {
        ui::step_info(&ctx, "Aborted");
        return Ok(());
    }

    if record.kind == OrgKind::Scratch {
        let cli = SfCli::with_binary(&config.cli.binary);
        ScratchOrgs::new(cli).delete(&record).await?;
    } else {
        // Pooled orgs go back to the pool on their own schedule; only the
        // local record is dropped.
        ui::step_info(&ctx, "Pooled org: removing local record only");
    }

    manager.remove(&args.name).await?;
    println!("{} Deleted {}", style("✓").green(), style(&args.name).cyan());
    Ok(())
}

/// Execute org password
pub async fn password(args: OrgPasswordArgs, config: &Config) -> OrgboxResult<()> {
    let manager = OrgManager::new().await?;
    let mut record = manager.require(&args.name).await?;

    let cli = SfCli::with_binary(&config.cli.binary);
    ScratchOrgs::new(cli).generate_password(&mut record).await?;
    manager.update(&record).await?;

    if record.password_failed {
        println!(
            "{} Password generation failed for {}; see the log for details",
            style("[WARN]").yellow(),
            record.username
        );
    } else {
        println!(
            "{} Password generated for {}",
            style("✓").green(),
            record.username
        );
    }
    Ok(())
}

/// Execute org checkout
pub async fn checkout(args: OrgCheckoutArgs, config: &Config) -> OrgboxResult<()> {
    let pool_id = args
        .pool
        .as_deref()
        .or(config.pool.id.as_deref())
        .ok_or(OrgboxError::PoolNotConfigured)?;

    let cli = SfCli::with_binary(&config.cli.binary);
    cli.ensure_available().await?;

    let manager = OrgManager::new().await?;
    if manager.get(&args.name).await?.is_some() {
        return Err(OrgboxError::OrgExists(args.name));
    }

    let pb = ui::spinner("Checking out org from pool...");
    let pool = OrgPool::new(cli);
    let record = pool.checkout(pool_id, &args.name, args.set_default).await?;
    manager.create(&record).await?;
    pb.finish_and_clear();

    println!(
        "{} Checked out {} ({}) from pool {}",
        style("✓").green(),
        style(&record.name).cyan(),
        record.username,
        pool_id
    );
    Ok(())
}

/// Execute org list
pub async fn list(args: OrgListArgs, _config: &Config) -> OrgboxResult<()> {
    let manager = OrgManager::new().await?;
    let records = manager.list().await?;

    if records.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                let ctx = UiContext::detect();
                ui::step_info(&ctx, "No orgs");
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&records),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&records)?),
        OutputFormat::Plain => {
            for record in &records {
                println!("{}\t{}", record.name, record.username);
            }
        }
    }
    Ok(())
}

fn print_table(records: &[OrgRecord]) {
    println!(
        "{:<16} {:<32} {:<8} {:<8} {:<10}",
        style("NAME").bold(),
        style("USERNAME").bold(),
        style("KIND").bold(),
        style("DAYS").bold(),
        style("STATUS").bold()
    );
    println!("{}", "-".repeat(78));

    for record in records {
        let kind = match record.kind {
            OrgKind::Scratch => "scratch",
            OrgKind::Pooled => "pooled",
        };
        let status = if record.expired() {
            style("expired").red()
        } else {
            style("active").green()
        };
        println!(
            "{:<16} {:<32} {:<8} {:<8} {:<10}",
            record.name,
            record.username,
            kind,
            record.format_org_days(),
            status
        );
    }
}
