//! Error types for orgbox
//!
//! All modules use `OrgboxResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for orgbox operations
pub type OrgboxResult<T> = Result<T, OrgboxError>;

/// All errors that can occur in orgbox
#[derive(Error, Debug)]
pub enum OrgboxError {
    // Environment errors
    #[error("Salesforce CLI not found: {binary}. Install from https://developer.salesforce.com/tools/salesforcecli")]
    SfCliNotFound { binary: String },

    #[error("Dev Hub not configured. Set [devhub] username in config or run: sf org login web --set-default-dev-hub")]
    DevHubNotConfigured,

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Org definition file not found: {0}")]
    OrgDefinitionNotFound(PathBuf),

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Org errors
    #[error("Org not found: {0}")]
    OrgNotFound(String),

    #[error("Org already exists: {0}")]
    OrgExists(String),

    #[error("Failed to create scratch org: {0}")]
    ScratchOrgCreate(String),

    #[error("Failed to delete scratch org {username}: {reason}")]
    ScratchOrgDelete { username: String, reason: String },

    #[error("No pool id configured. Pass --pool or set [pool] id in config")]
    PoolNotConfigured,

    #[error("Failed to checkout org from pool {pool}: {reason}")]
    PoolCheckout { pool: String, reason: String },

    // Package errors
    #[error("Failed to install package {package}: {reason}")]
    PackageInstall { package: String, reason: String },

    #[error("Failed to query installed packages for {username}: {reason}")]
    PackageQuery { username: String, reason: String },

    #[error("Invalid package version {value:?}: {reason}")]
    VersionParse { value: String, reason: String },

    // CLI process errors
    #[error("Command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command returned an error: {command}: {message}")]
    CommandExecution { command: String, message: String },

    #[error("Command returned unparsable JSON: {command}: {reason}")]
    CommandJson { command: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl OrgboxError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::SfCliNotFound { .. } => Some("Run: npm install -g @salesforce/cli"),
            Self::DevHubNotConfigured => Some("Run: sf org login web --set-default-dev-hub"),
            Self::PoolNotConfigured => Some("Pass --pool <id> or add [pool] id to .orgbox.toml"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = OrgboxError::OrgNotFound("dev".to_string());
        assert!(err.to_string().contains("Org not found: dev"));
    }

    #[test]
    fn error_hint() {
        let err = OrgboxError::DevHubNotConfigured;
        assert_eq!(
            err.hint(),
            Some("Run: sf org login web --set-default-dev-hub")
        );
        assert_eq!(OrgboxError::OrgNotFound("x".into()).hint(), None);
    }

    #[test]
    fn command_exec_helper() {
        let err = OrgboxError::command_exec("sf org list", "boom");
        assert!(err.to_string().contains("sf org list"));
        assert!(err.to_string().contains("boom"));
    }
}
