//! Org record lifecycle management

use crate::config::ConfigManager;
use crate::error::{OrgboxError, OrgboxResult};
use crate::org::record::OrgRecord;
use tracing::{debug, info};

/// Handles org record CRUD over the state directory
pub struct OrgManager;

impl OrgManager {
    /// Create a new org manager
    pub async fn new() -> OrgboxResult<Self> {
        ConfigManager::ensure_state_dirs().await?;
        Ok(Self)
    }

    /// Register a new org record
    pub async fn create(&self, record: &OrgRecord) -> OrgboxResult<()> {
        if OrgRecord::load(&record.name).await?.is_some() {
            return Err(OrgboxError::OrgExists(record.name.clone()));
        }

        record.save().await?;
        info!("Registered org: {} ({})", record.name, record.username);
        Ok(())
    }

    /// Get a record by alias
    pub async fn get(&self, name: &str) -> OrgboxResult<Option<OrgRecord>> {
        OrgRecord::load(name).await
    }

    /// Get a record by alias, failing when absent
    pub async fn require(&self, name: &str) -> OrgboxResult<OrgRecord> {
        self.get(name)
            .await?
            .ok_or_else(|| OrgboxError::OrgNotFound(name.to_string()))
    }

    /// List all records
    pub async fn list(&self) -> OrgboxResult<Vec<OrgRecord>> {
        OrgRecord::list_all().await
    }

    /// Persist an updated record
    pub async fn update(&self, record: &OrgRecord) -> OrgboxResult<()> {
        record.save().await?;
        debug!("Updated org record: {}", record.name);
        Ok(())
    }

    /// Remove a record
    pub async fn remove(&self, name: &str) -> OrgboxResult<()> {
        let record = self.require(name).await?;
        record.delete().await?;
        info!("Removed org record: {}", name);
        Ok(())
    }
}
