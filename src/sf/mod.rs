//! Salesforce CLI wrapper
//!
//! All remote interaction goes through the `sf` binary. Commands are run with
//! `--json` appended and the standard `{"status": N, "result": {...}}`
//! envelope is parsed; non-zero exits surface the CLI's own message.

use crate::error::{OrgboxError, OrgboxResult};
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Handle to the `sf` binary
#[derive(Debug, Clone)]
pub struct SfCli {
    binary: String,
}

/// Parsed output of an `sf ... --json` invocation
#[derive(Debug)]
pub struct SfJsonOutput {
    /// The `result` payload (null when the CLI omitted it)
    pub result: Value,
    /// Raw stderr, which `sf` uses for warnings even on success
    pub stderr: String,
}

impl SfCli {
    /// Create a wrapper around the default `sf` binary
    pub fn new() -> Self {
        Self::with_binary("sf")
    }

    /// Create a wrapper around a custom binary name or path
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Check that the binary is on the PATH and runnable
    pub async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    /// Error unless the binary is available
    pub async fn ensure_available(&self) -> OrgboxResult<()> {
        if self.is_available().await {
            Ok(())
        } else {
            Err(OrgboxError::SfCliNotFound {
                binary: self.binary.clone(),
            })
        }
    }

    /// Run an `sf` command without JSON parsing, returning the raw output
    pub async fn run(&self, args: &[&str]) -> OrgboxResult<std::process::Output> {
        debug!("Executing: {} {:?}", self.binary, args);

        Command::new(&self.binary)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OrgboxError::SfCliNotFound {
                        binary: self.binary.clone(),
                    }
                } else {
                    OrgboxError::command_failed(self.describe(args), e)
                }
            })
    }

    /// Run an `sf` command with `--json` appended and parse the envelope.
    ///
    /// On a non-zero exit the CLI still usually prints a JSON body with a
    /// `message` field; that message is surfaced in the error when present.
    pub async fn run_json(&self, args: &[&str]) -> OrgboxResult<SfJsonOutput> {
        let mut full_args: Vec<&str> = args.to_vec();
        full_args.push("--json");

        let output = self.run(&full_args).await?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let command = self.describe(args);

        if !output.status.success() {
            return Err(OrgboxError::command_exec(
                command,
                error_message(&stdout, &stderr),
            ));
        }

        let body: Value =
            serde_json::from_str(&stdout).map_err(|e| OrgboxError::CommandJson {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        // Some plugin commands report failure through the envelope status
        // while still exiting zero.
        if body.get("status").and_then(Value::as_i64).unwrap_or(0) != 0 {
            return Err(OrgboxError::command_exec(
                command,
                error_message(&stdout, &stderr),
            ));
        }

        if !stderr.trim().is_empty() {
            warn!("{}: {}", command, stderr.trim());
        }

        let result = body.get("result").cloned().unwrap_or(Value::Null);
        Ok(SfJsonOutput { result, stderr })
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }
}

impl Default for SfCli {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull the most useful error message out of a failed invocation: the JSON
/// `message` field when the body parses, otherwise raw stdout+stderr.
fn error_message(stdout: &str, stderr: &str) -> String {
    if let Ok(body) = serde_json::from_str::<Value>(stdout) {
        if let Some(message) = body.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
    }
    let combined = format!("{}\n{}", stdout.trim(), stderr.trim());
    combined.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_json_message() {
        let stdout = r#"{"status":1,"message":"The requested resource does not exist","name":"NOT_FOUND"}"#;
        assert_eq!(
            error_message(stdout, "ignored"),
            "The requested resource does not exist"
        );
    }

    #[test]
    fn error_message_falls_back_to_raw_output() {
        assert_eq!(error_message("not json", "some stderr"), "not json\nsome stderr");
        assert_eq!(error_message("", "only stderr"), "only stderr");
    }

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let cli = SfCli::with_binary("definitely-not-a-real-sf-binary");
        assert!(!cli.is_available().await);
        let err = cli.ensure_available().await.unwrap_err();
        assert!(matches!(err, OrgboxError::SfCliNotFound { .. }));
    }
}
