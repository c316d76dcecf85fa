//! Org record persistence
//!
//! Each org orgbox knows about is one JSON file under the state dir, named
//! after its local alias.

use crate::config::ConfigManager;
use crate::error::{OrgboxError, OrgboxResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

/// How the org was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgKind {
    /// Created fresh via `sf org create scratch`
    Scratch,
    /// Checked out of a shared pool
    Pooled,
}

/// A tracked org
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgRecord {
    /// Unique record id
    pub id: Uuid,

    /// Local alias the org is addressed by
    pub name: String,

    /// Org username
    pub username: String,

    /// Remote org id (`00D...`)
    pub org_id: String,

    /// Instance URL, when known
    pub instance_url: Option<String>,

    /// How the org was obtained
    pub kind: OrgKind,

    /// Lifetime in days
    pub days: u32,

    /// When the org was created or checked out
    pub created_at: DateTime<Utc>,

    /// Pool the org came from, for pooled orgs
    pub pool_id: Option<String>,

    /// Set when the last password generation attempt failed; further
    /// attempts are skipped until cleared
    pub password_failed: bool,
}

impl OrgRecord {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        org_id: impl Into<String>,
        kind: OrgKind,
        days: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            username: username.into(),
            org_id: org_id.into(),
            instance_url: None,
            kind,
            days,
            created_at: Utc::now(),
            pool_id: None,
            password_failed: false,
        }
    }

    /// When the org expires
    pub fn expires(&self) -> DateTime<Utc> {
        self.created_at + Duration::days(i64::from(self.days))
    }

    /// Whether the org has already expired
    pub fn expired(&self) -> bool {
        self.expires() < Utc::now()
    }

    /// Days the org has been alive, 1-based, or None once expired
    pub fn days_alive(&self) -> Option<u32> {
        if self.expired() {
            return None;
        }
        let alive = (Utc::now() - self.created_at).num_days();
        Some(alive as u32 + 1)
    }

    /// Display form of the org's age: `alive/total` or just `total`
    pub fn format_org_days(&self) -> String {
        match self.days_alive() {
            Some(alive) => format!("{}/{}", alive, self.days),
            None => self.days.to_string(),
        }
    }

    /// Get the record's file path
    pub fn file_path(&self) -> PathBuf {
        ConfigManager::orgs_dir().join(format!("{}.json", self.name))
    }

    /// Load a record by alias
    pub async fn load(name: &str) -> OrgboxResult<Option<Self>> {
        let path = ConfigManager::orgs_dir().join(format!("{}.json", name));

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| OrgboxError::io(format!("reading org record {}", path.display()), e))?;

        let record: OrgRecord = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    /// Save the record
    pub async fn save(&self) -> OrgboxResult<()> {
        let path = self.file_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| OrgboxError::io("creating orgs directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .await
            .map_err(|e| OrgboxError::io(format!("writing org record {}", path.display()), e))?;

        Ok(())
    }

    /// Delete the record file
    pub async fn delete(&self) -> OrgboxResult<()> {
        let path = self.file_path();
        if path.exists() {
            fs::remove_file(&path)
                .await
                .map_err(|e| OrgboxError::io(format!("deleting org record {}", path.display()), e))?;
        }
        Ok(())
    }

    /// List all saved records
    pub async fn list_all() -> OrgboxResult<Vec<Self>> {
        let dir = ConfigManager::orgs_dir();
        if !dir.exists() {
            return Ok(vec![]);
        }

        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| OrgboxError::io(format!("reading orgs directory {}", dir.display()), e))?;

        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| OrgboxError::io("iterating orgs directory", e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| OrgboxError::io(format!("reading org record {}", path.display()), e))?;
            match serde_json::from_str::<OrgRecord>(&content) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping unreadable org record {}: {}", path.display(), e)
                }
            }
        }

        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }
}
