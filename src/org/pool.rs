//! Org pool checkout via the `clariti` CLI plugin
//!
//! The plugin's JSON output is loosely specified and has shifted between
//! releases, so field extraction probes several known locations instead of
//! deserializing a fixed shape.

use crate::error::{OrgboxError, OrgboxResult};
use crate::org::record::{OrgKind, OrgRecord};
use crate::sf::SfCli;
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use tracing::info;

/// Locations the username has been observed at across plugin releases
const USERNAME_PATHS: &[&[&str]] = &[
    &["username"],
    &["orgUsername"],
    &["org", "username"],
    &["org", "userName"],
    &["user", "username"],
];

const ORG_ID_PATHS: &[&[&str]] = &[&["orgId"], &["org", "orgId"], &["org", "id"]];

const INSTANCE_URL_PATHS: &[&[&str]] = &[&["instanceUrl"], &["org", "instanceUrl"]];

/// Pool checkout operations
pub struct OrgPool {
    cli: SfCli,
}

impl OrgPool {
    pub fn new(cli: SfCli) -> Self {
        Self { cli }
    }

    /// Checkout an org from `pool_id` under the local alias `alias`
    pub async fn checkout(
        &self,
        pool_id: &str,
        alias: &str,
        set_default: bool,
    ) -> OrgboxResult<OrgRecord> {
        let mut args = vec!["clariti", "org", "checkout", "-p", pool_id, "-n", alias];
        if set_default {
            args.push("-s");
        }

        let output = self
            .cli
            .run_json(&args)
            .await
            .map_err(|e| OrgboxError::PoolCheckout {
                pool: pool_id.to_string(),
                reason: e.to_string(),
            })?;

        let username = find_string(&output.result, USERNAME_PATHS).ok_or_else(|| {
            OrgboxError::PoolCheckout {
                pool: pool_id.to_string(),
                reason: "checkout result did not include a username".to_string(),
            }
        })?;
        let org_id = find_string(&output.result, ORG_ID_PATHS).unwrap_or_default();
        let days = calculate_org_days(&output.result);

        info!("Checked out {} from pool {}", username, pool_id);

        let mut record = OrgRecord::new(alias, username, org_id, OrgKind::Pooled, days);
        record.instance_url = find_string(&output.result, INSTANCE_URL_PATHS);
        record.pool_id = Some(pool_id.to_string());
        Ok(record)
    }
}

/// Probe `value` at each path, returning the first non-empty string found
fn find_string(value: &Value, paths: &[&[&str]]) -> Option<String> {
    for path in paths {
        let mut current = value;
        let mut matched = true;
        for key in *path {
            match current.get(key) {
                Some(next) => current = next,
                None => {
                    matched = false;
                    break;
                }
            }
        }
        if matched {
            if let Some(s) = current.as_str() {
                if !s.is_empty() {
                    return Some(s.to_string());
                }
            }
        }
    }
    None
}

/// Days between checkout creation and expiration dates; 1 when unknown.
///
/// `createdDate` is ISO 8601, `expirationDate` is a bare `YYYY-MM-DD`.
fn calculate_org_days(result: &Value) -> u32 {
    let created = find_string(result, &[&["createdDate"], &["org", "createdDate"]])
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.date_naive());
    let expires = find_string(result, &[&["expirationDate"], &["org", "expirationDate"]])
        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok());

    match (created, expires) {
        (Some(created), Some(expires)) => {
            let days = (expires - created).num_days().unsigned_abs();
            days.max(1) as u32
        }
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_string_probes_nested_paths() {
        let value: Value = serde_json::from_str(
            r#"{"org": {"username": "pooled@example.com", "orgId": "00D000000000002"}}"#,
        )
        .unwrap();

        assert_eq!(
            find_string(&value, USERNAME_PATHS).as_deref(),
            Some("pooled@example.com")
        );
        assert_eq!(
            find_string(&value, ORG_ID_PATHS).as_deref(),
            Some("00D000000000002")
        );
    }

    #[test]
    fn find_string_skips_empty_values() {
        let value: Value =
            serde_json::from_str(r#"{"username": "", "org": {"username": "real@example.com"}}"#)
                .unwrap();
        assert_eq!(
            find_string(&value, USERNAME_PATHS).as_deref(),
            Some("real@example.com")
        );
    }

    #[test]
    fn org_days_from_dates() {
        let value: Value = serde_json::from_str(
            r#"{"createdDate": "2026-08-20T12:00:00.000+00:00", "expirationDate": "2026-08-27"}"#,
        )
        .unwrap();
        assert_eq!(calculate_org_days(&value), 7);
    }

    #[test]
    fn org_days_defaults_to_one() {
        let value: Value = serde_json::from_str(r#"{"username": "x@example.com"}"#).unwrap();
        assert_eq!(calculate_org_days(&value), 1);
    }
}
