//! Configuration schema for orgbox
//!
//! Global configuration lives at `~/.config/orgbox/config.toml`; projects may
//! override it with a local `.orgbox.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Salesforce CLI settings
    pub cli: CliConfig,

    /// Dev Hub settings
    pub devhub: DevHubConfig,

    /// Scratch org creation defaults
    pub scratch: ScratchConfig,

    /// Org pool settings
    pub pool: PoolConfig,

    /// Package install defaults
    pub install: InstallConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Vendor CLI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Binary name or path of the Salesforce CLI
    pub binary: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            binary: "sf".to_string(),
        }
    }
}

/// Dev Hub settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DevHubConfig {
    /// Dev Hub username; when unset, the CLI's default target-dev-hub is used
    pub username: Option<String>,
}

/// Scratch org creation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Org definition file, relative to the project root
    pub definition_file: PathBuf,

    /// Days before the org expires
    pub days: u32,

    /// Create the org with the project namespace
    pub namespaced: bool,

    /// Create the org without ancestor package versions
    pub noancestors: bool,

    /// Set the created org as the CLI default
    pub set_default: bool,

    /// Generate a password after creation
    pub set_password: bool,

    /// Admin email, when the definition file does not carry one
    pub admin_email: Option<String>,

    /// Release channel override (`preview` or `previous`)
    pub release: Option<String>,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            definition_file: PathBuf::from("config/project-scratch-def.json"),
            days: 7,
            namespaced: false,
            noancestors: false,
            set_default: false,
            set_password: true,
            admin_email: None,
            release: None,
        }
    }
}

/// Org pool settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Pool id to checkout orgs from
    pub id: Option<String>,
}

/// Package install defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Minutes to wait for an install request to complete
    pub wait_minutes: u32,

    /// Attempts before a transient install failure becomes fatal
    pub attempts: u32,

    /// Seconds between install attempts
    pub retry_delay_secs: u64,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            wait_minutes: 30,
            attempts: 5,
            retry_delay_secs: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.cli.binary, "sf");
        assert_eq!(config.scratch.days, 7);
        assert!(config.scratch.set_password);
        assert_eq!(config.install.wait_minutes, 30);
        assert!(config.pool.id.is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [devhub]
            username = "devhub@example.com"

            [scratch]
            days = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.devhub.username.as_deref(), Some("devhub@example.com"));
        assert_eq!(config.scratch.days, 1);
        assert_eq!(config.cli.binary, "sf");
    }
}
