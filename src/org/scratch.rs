//! Scratch org lifecycle via the `sf` CLI
//!
//! Create, delete and password generation are thin orchestration over
//! `sf org create scratch`, `sf org delete scratch` and
//! `sf org generate password`.

use crate::config::schema::ScratchConfig;
use crate::error::{OrgboxError, OrgboxResult};
use crate::org::record::{OrgKind, OrgRecord};
use crate::sf::SfCli;
use serde_json::Value;
use tokio::fs;
use tracing::{info, warn};

/// Minutes to wait for scratch org creation
const CREATE_WAIT_MINUTES: u32 = 120;

/// Scratch org operations
pub struct ScratchOrgs {
    cli: SfCli,
}

impl ScratchOrgs {
    pub fn new(cli: SfCli) -> Self {
        Self { cli }
    }

    /// Create a scratch org and return its record.
    ///
    /// The admin email flag is only passed when the definition file does not
    /// already carry an `adminEmail` of its own.
    pub async fn create(
        &self,
        alias: &str,
        scratch: &ScratchConfig,
        devhub: Option<&str>,
    ) -> OrgboxResult<OrgRecord> {
        let definition = &scratch.definition_file;
        if !definition.exists() {
            return Err(OrgboxError::OrgDefinitionNotFound(definition.clone()));
        }

        let definition_body = fs::read_to_string(definition)
            .await
            .map_err(|e| OrgboxError::io(format!("reading {}", definition.display()), e))?;
        let definition_json: Value = serde_json::from_str(&definition_body)?;
        let def_has_email = definition_json.get("adminEmail").is_some();

        let args = build_create_args(alias, scratch, devhub, def_has_email);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = self
            .cli
            .run_json(&arg_refs)
            .await
            .map_err(friendly_create_error)?;

        let (username, org_id) = parse_create_result(&output.result)?;
        info!("Created: OrgId: {}, Username: {}", org_id, username);

        let mut record = OrgRecord::new(alias, username, org_id, OrgKind::Scratch, scratch.days);
        record.instance_url = output
            .result
            .get("instanceUrl")
            .and_then(Value::as_str)
            .map(str::to_string);

        if scratch.set_password {
            self.generate_password(&mut record).await?;
        }

        Ok(record)
    }

    /// Generate an org password.
    ///
    /// Failure is not fatal: it is logged and flagged on the record so later
    /// attempts are skipped (original behavior).
    pub async fn generate_password(&self, record: &mut OrgRecord) -> OrgboxResult<()> {
        if record.password_failed {
            warn!("Skipping resetting password since last attempt failed");
            return Ok(());
        }

        let result = self
            .cli
            .run_json(&["org", "generate", "password", "-o", &record.username])
            .await;

        if let Err(e) = result {
            record.password_failed = true;
            warn!("Failed to set password: {}", e);
        }
        Ok(())
    }

    /// Delete the scratch org. Tolerates an org that is already gone.
    pub async fn delete(&self, record: &OrgRecord) -> OrgboxResult<()> {
        let result = self
            .cli
            .run_json(&["org", "delete", "scratch", "-p", "-o", &record.username])
            .await;

        match result {
            Ok(_) => {
                info!("Deleted scratch org: {}", record.username);
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                if message.contains("NamedOrgNotFound")
                    || message.contains("does not exist")
                    || message.contains("No authorization information found")
                {
                    warn!("Scratch org {} was already deleted", record.username);
                    Ok(())
                } else {
                    Err(OrgboxError::ScratchOrgDelete {
                        username: record.username.clone(),
                        reason: message,
                    })
                }
            }
        }
    }
}

/// Argument list for `sf org create scratch`
fn build_create_args(
    alias: &str,
    scratch: &ScratchConfig,
    devhub: Option<&str>,
    def_has_email: bool,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "org".into(),
        "create".into(),
        "scratch".into(),
        "-f".into(),
        scratch.definition_file.display().to_string(),
        "-w".into(),
        CREATE_WAIT_MINUTES.to_string(),
        "--duration-days".into(),
        scratch.days.to_string(),
        "-a".into(),
        alias.into(),
    ];

    if let Some(devhub) = devhub {
        args.push("--target-dev-hub".into());
        args.push(devhub.into());
    }
    if !scratch.namespaced {
        args.push("--no-namespace".into());
    }
    if scratch.noancestors {
        args.push("--no-ancestors".into());
    }
    if let Some(release) = &scratch.release {
        args.push(format!("--release={}", release));
    }
    if let Some(email) = &scratch.admin_email {
        if !def_has_email {
            args.push(format!("--admin-email={}", email));
        }
    }
    if scratch.set_default {
        args.push("--set-default".into());
    }

    args
}

/// Pull username and org id out of the create result
fn parse_create_result(result: &Value) -> OrgboxResult<(String, String)> {
    let username = result.get("username").and_then(Value::as_str);
    let org_id = result.get("orgId").and_then(Value::as_str);

    match (username, org_id) {
        (Some(username), Some(org_id)) => Ok((username.to_string(), org_id.to_string())),
        (None, Some(_)) => Err(OrgboxError::ScratchOrgCreate(
            "the CLI claimed success but returned no username".to_string(),
        )),
        _ => Err(OrgboxError::ScratchOrgCreate(format!(
            "unexpected create result: {}",
            result
        ))),
    }
}

/// Translate the CLI's opaque NOT_FOUND message into something actionable
fn friendly_create_error(error: OrgboxError) -> OrgboxError {
    let message = error.to_string();
    if message.contains("The requested resource does not exist") {
        OrgboxError::ScratchOrgCreate(
            "the Salesforce CLI was unable to create a scratch org. Ensure you are connected \
             using a valid API version on an active Dev Hub."
                .to_string(),
        )
    } else {
        OrgboxError::ScratchOrgCreate(message)
    }
}
