//! Configuration management for orgbox

pub mod schema;

pub use schema::Config;

use crate::error::{OrgboxError, OrgboxResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Project-local configuration file name
pub const LOCAL_CONFIG_NAME: &str = ".orgbox.toml";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the config path this manager reads from
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("orgbox")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("orgbox")
    }

    /// Get the org records directory path
    pub fn orgs_dir() -> PathBuf {
        Self::state_dir().join("orgs")
    }

    /// Ensure state directories exist
    pub async fn ensure_state_dirs() -> OrgboxResult<()> {
        let orgs = Self::orgs_dir();
        fs::create_dir_all(&orgs)
            .await
            .map_err(|e| OrgboxError::ConfigDirCreate {
                path: orgs.clone(),
                source: e,
            })?;
        Ok(())
    }

    /// Walk up from `start` looking for a project-local config file
    pub fn find_local_config(start: &Path) -> Option<PathBuf> {
        let mut dir = Some(start);
        while let Some(current) = dir {
            let candidate = current.join(LOCAL_CONFIG_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            dir = current.parent();
        }
        None
    }

    /// Load configuration, using defaults when no file exists
    pub async fn load(&self) -> OrgboxResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load the global config, then overlay a project-local one when present.
    /// The local file wins wholesale per top-level section it defines.
    pub async fn load_merged(&self, local: Option<&Path>) -> OrgboxResult<Config> {
        let mut config = self.load().await?;

        if let Some(local_path) = local {
            let local_config = self.load_from_file(local_path).await?;
            config = merge(config, local_config, local_path).await?;
            debug!("Merged local config from {}", local_path.display());
        }

        Ok(config)
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> OrgboxResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| OrgboxError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| OrgboxError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> OrgboxResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            OrgboxError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> OrgboxResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| OrgboxError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Section-level overlay: a section present in the local file replaces the
/// global one. Implemented through TOML tables to avoid per-field plumbing.
async fn merge(global: Config, local: Config, local_path: &Path) -> OrgboxResult<Config> {
    let mut global_value = toml::Table::try_from(&global)?;
    let local_value = toml::Table::try_from(&local)?;

    // Only overlay sections the local file actually wrote. Re-read the raw
    // file to know which keys were present (serialized defaults would
    // otherwise clobber everything).
    let raw_local = fs::read_to_string(local_path)
        .await
        .map_err(|e| OrgboxError::io(format!("reading config from {}", local_path.display()), e))?;
    let raw_table: toml::Table =
        toml::from_str(&raw_local).map_err(|e| OrgboxError::ConfigInvalid {
            path: local_path.to_path_buf(),
            reason: e.to_string(),
        })?;

    for key in raw_table.keys() {
        if let Some(section) = local_value.get(key) {
            global_value.insert(key.clone(), section.clone());
        }
    }

    let merged: Config = global_value.try_into().map_err(|e: toml::de::Error| {
        OrgboxError::ConfigInvalid {
            path: local_path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nope.toml"));
        let config = manager.load().await.unwrap();
        assert_eq!(config.cli.binary, "sf");
    }

    #[tokio::test]
    async fn save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.toml"));

        let mut config = Config::default();
        config.devhub.username = Some("devhub@example.com".to_string());
        manager.save(&config).await.unwrap();

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.devhub.username.as_deref(), Some("devhub@example.com"));
    }

    #[tokio::test]
    async fn invalid_toml_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not = [valid").unwrap();

        let manager = ConfigManager::with_path(path);
        let err = manager.load().await.unwrap_err();
        assert!(matches!(err, OrgboxError::ConfigInvalid { .. }));
    }

    #[tokio::test]
    async fn local_config_overlays_by_section() {
        let dir = tempfile::tempdir().unwrap();
        let global_path = dir.path().join("config.toml");
        let local_path = dir.path().join(LOCAL_CONFIG_NAME);

        std::fs::write(
            &global_path,
            "[devhub]\nusername = \"global@example.com\"\n[scratch]\ndays = 14\n",
        )
        .unwrap();
        std::fs::write(&local_path, "[scratch]\ndays = 1\n").unwrap();

        let manager = ConfigManager::with_path(global_path);
        let config = manager.load_merged(Some(&local_path)).await.unwrap();

        assert_eq!(config.scratch.days, 1);
        // Untouched sections keep the global values.
        assert_eq!(config.devhub.username.as_deref(), Some("global@example.com"));
    }

    #[test]
    fn find_local_config_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let mut file = std::fs::File::create(dir.path().join(LOCAL_CONFIG_NAME)).unwrap();
        writeln!(file, "[general]").unwrap();

        let found = ConfigManager::find_local_config(&nested).unwrap();
        assert_eq!(found, dir.path().join(LOCAL_CONFIG_NAME));
    }
}
