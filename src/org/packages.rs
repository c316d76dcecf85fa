//! Installed-package view of an org
//!
//! `OrgPackages` is the authoritative accessor for what is installed in one
//! org. The mapping is fetched lazily from an [`InstalledPackageSource`] and
//! cached until someone calls `reset_installed_packages`, at which point the
//! next read re-derives it from the remote.
//!
//! Every installed package is indexed under up to three key forms so callers
//! can look it up however they addressed it: the `04t` subscriber package
//! version id, the bare namespace, and `namespace@versionNumber`.

use crate::error::{OrgboxError, OrgboxResult};
use crate::packages::version::{version_satisfied, PackageVersion, VersionRecord};
use crate::sf::SfCli;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Installed-package mapping: key form -> version observations
pub type InstalledPackages = HashMap<String, Vec<VersionRecord>>;

/// Where the installed-package mapping comes from
#[async_trait]
pub trait InstalledPackageSource: Send + Sync {
    /// Fetch the current installed-package mapping from the org
    async fn fetch(&self) -> OrgboxResult<InstalledPackages>;
}

/// Production source backed by `sf package installed list`
pub struct SfPackageSource {
    cli: SfCli,
    username: String,
}

impl SfPackageSource {
    pub fn new(cli: SfCli, username: impl Into<String>) -> Self {
        Self {
            cli,
            username: username.into(),
        }
    }
}

#[async_trait]
impl InstalledPackageSource for SfPackageSource {
    async fn fetch(&self) -> OrgboxResult<InstalledPackages> {
        let output = self
            .cli
            .run_json(&["package", "installed", "list", "-o", &self.username])
            .await
            .map_err(|e| OrgboxError::PackageQuery {
                username: self.username.clone(),
                reason: e.to_string(),
            })?;

        Ok(parse_installed_list(&output.result))
    }
}

/// Build the keyed mapping from the `sf package installed list` result array.
///
/// Records with an unparsable version number are skipped with a warning
/// rather than failing the whole query.
fn parse_installed_list(result: &Value) -> InstalledPackages {
    let mut packages: InstalledPackages = HashMap::new();

    let Some(entries) = result.as_array() else {
        return packages;
    };

    for entry in entries {
        let Some(version_id) = entry
            .get("SubscriberPackageVersionId")
            .and_then(Value::as_str)
        else {
            continue;
        };
        let Some(number) = entry
            .get("SubscriberPackageVersionNumber")
            .and_then(Value::as_str)
        else {
            continue;
        };

        let version = match PackageVersion::parse(number) {
            Ok(version) => version,
            Err(e) => {
                warn!("Skipping installed package {}: {}", version_id, e);
                continue;
            }
        };

        let record = VersionRecord::new(version_id, version);

        packages
            .entry(version_id.to_string())
            .or_default()
            .push(record.clone());

        let namespace = entry
            .get("SubscriberPackageNamespace")
            .and_then(Value::as_str)
            .unwrap_or("");
        if !namespace.is_empty() {
            packages
                .entry(namespace.to_string())
                .or_default()
                .push(record.clone());
            packages
                .entry(format!("{}@{}", namespace, number))
                .or_default()
                .push(record);
        }
    }

    packages
}

/// Lazily-cached installed-package accessor for one org
pub struct OrgPackages {
    source: Box<dyn InstalledPackageSource>,
    cache: Option<InstalledPackages>,
}

impl OrgPackages {
    pub fn new(source: Box<dyn InstalledPackageSource>) -> Self {
        Self {
            source,
            cache: None,
        }
    }

    /// The installed-package mapping, fetching from the source on first read
    /// or after a reset
    pub async fn installed_packages(&mut self) -> OrgboxResult<&InstalledPackages> {
        if self.cache.is_none() {
            debug!("Fetching installed packages from org");
            self.cache = Some(self.source.fetch().await?);
        }
        Ok(self.cache.get_or_insert_with(InstalledPackages::new))
    }

    /// Discard the cached view; the next read re-derives it from the remote
    pub fn reset_installed_packages(&mut self) {
        self.cache = None;
    }

    /// Authoritative check that `identifier` is installed at `version` or
    /// newer. `identifier` may be any key form the mapping indexes.
    pub async fn has_minimum_package_version(
        &mut self,
        identifier: &str,
        version: &str,
    ) -> OrgboxResult<bool> {
        let required = PackageVersion::parse(version)?;
        let packages = self.installed_packages().await?;
        let installed = packages.get(identifier).map(Vec::as_slice).unwrap_or(&[]);
        Ok(version_satisfied(installed, Some(&required)))
    }
}

/// One org accessor shared across a session.
///
/// The intended call graph is sequential; the mutex marks the boundary a
/// concurrent caller must respect: hold it across a check-then-install
/// sequence to keep installs at-most-once.
pub type SharedOrg = Arc<Mutex<OrgPackages>>;

/// Wrap an accessor for session-wide sharing
pub fn into_shared(org: OrgPackages) -> SharedOrg {
    Arc::new(Mutex::new(org))
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Stub source returning a fixed mapping and counting fetches
    pub(crate) struct StaticSource {
        packages: InstalledPackages,
        fetches: Arc<AtomicUsize>,
    }

    impl StaticSource {
        pub(crate) fn new(packages: InstalledPackages) -> (Self, Arc<AtomicUsize>) {
            let fetches = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    packages,
                    fetches: fetches.clone(),
                },
                fetches,
            )
        }
    }

    #[async_trait]
    impl InstalledPackageSource for StaticSource {
        async fn fetch(&self) -> OrgboxResult<InstalledPackages> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.packages.clone())
        }
    }
}
