//! Session-scoped shared package-installation state
//!
//! One `SharedPackageState` lives per orchestration session and is passed
//! explicitly through the dependency-resolution call chain. It deduplicates
//! install attempts across resolution passes: the install gate consults it
//! before issuing a slow, rate-limited remote install for a package the
//! session already knows is present.
//!
//! Keys are taken at face value. The same install fact may be recorded under
//! a bare namespace, a version id, and a `namespace@version` composite;
//! callers query and record every key form they care about.

use crate::error::OrgboxResult;
use crate::org::packages::{InstalledPackages, SharedOrg};
use crate::packages::version::{version_satisfied, PackageVersion, VersionRecord};
use tracing::debug;

/// Registry of packages known to be installed during this session
#[derive(Default)]
pub struct SharedPackageState {
    packages: Option<InstalledPackages>,
    org: Option<SharedOrg>,
}

impl SharedPackageState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to an org accessor and seed the registry from its current
    /// installed-package mapping. Must be called before the other operations
    /// give useful answers; an unbound registry reports everything absent.
    pub async fn bind(&mut self, org: SharedOrg) -> OrgboxResult<()> {
        let snapshot = org.lock().await.installed_packages().await?.clone();
        debug!("Seeded shared package state with {} keys", snapshot.len());
        self.packages = Some(snapshot);
        self.org = Some(org);
        Ok(())
    }

    /// Check whether `identifier` is known installed, optionally at
    /// `version` or newer.
    ///
    /// With a version requirement and exactly one stored record, the record's
    /// version is compared against it. With multiple stored records the
    /// answer degrades to a presence check (documented coarsening, see
    /// [`version_satisfied`]). An unparsable requirement string also degrades
    /// to a presence check; this operation never fails.
    pub fn has_package(&self, identifier: &str, version: Option<&str>) -> bool {
        let Some(packages) = &self.packages else {
            return false;
        };
        let installed = packages.get(identifier).map(Vec::as_slice).unwrap_or(&[]);

        let required = version.and_then(|v| PackageVersion::parse(v).ok());
        version_satisfied(installed, required.as_ref())
    }

    /// Record a newly installed package under `identifier`.
    ///
    /// Appends rather than overwrites: a key accumulates every version
    /// observation made during the session. The bound org accessor's cached
    /// view is discarded because an install can change answers under other
    /// key forms too; the next authoritative read re-derives from the remote.
    pub async fn add_package(&mut self, identifier: &str, record: VersionRecord) {
        self.packages
            .get_or_insert_with(InstalledPackages::new)
            .entry(identifier.to_string())
            .or_default()
            .push(record);
        debug!("Recorded install under key {:?}", identifier);

        if let Some(org) = &self.org {
            org.lock().await.reset_installed_packages();
        }
    }

    /// All version observations stored under `identifier`, in discovery
    /// order, or None when the key is unseen (or the registry was never
    /// bound).
    pub fn get_package_info(&self, identifier: &str) -> Option<&[VersionRecord]> {
        self.packages
            .as_ref()
            .and_then(|packages| packages.get(identifier))
            .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::org::packages::{into_shared, testutil::StaticSource, OrgPackages};

    fn record(id: &str, version: &str) -> VersionRecord {
        VersionRecord::new(id, version.parse().unwrap())
    }

    async fn bound_state() -> SharedPackageState {
        let (source, _) = StaticSource::new(InstalledPackages::new());
        let org = into_shared(OrgPackages::new(Box::new(source)));
        let mut state = SharedPackageState::new();
        state.bind(org).await.unwrap();
        state
    }

    #[tokio::test]
    async fn unseen_key_is_absent() {
        let state = bound_state().await;
        assert!(!state.has_package("test", None));
        assert!(state.get_package_info("test").is_none());
    }

    #[tokio::test]
    async fn added_package_is_present_regardless_of_version() {
        let mut state = bound_state().await;
        state.add_package("test", record("04t000000000001", "1.0")).await;
        assert!(state.has_package("test", None));
    }

    #[tokio::test]
    async fn single_record_version_check() {
        let mut state = bound_state().await;
        state
            .add_package("test", record("04t000000000001", "1.0.1"))
            .await;
        assert!(state.has_package("test", Some("1.0")));
        assert!(state.has_package("test", Some("1.0.1")));
        assert!(!state.has_package("test", Some("1.1")));
    }

    #[tokio::test]
    async fn multiple_records_degrade_to_presence() {
        // Documented behavior: more than one record under a key means
        // "present, version unknown", so any requirement is reported met.
        let mut state = bound_state().await;
        state.add_package("test", record("04t000000000001", "1.0")).await;
        state.add_package("test", record("04t000000000002", "1.5")).await;
        assert!(state.has_package("test", Some("99.0")));
    }

    #[tokio::test]
    async fn add_accumulates_in_order() {
        let mut state = bound_state().await;
        let first = record("04t000000000001", "1.0");
        let second = record("04t000000000002", "1.5");
        state.add_package("test", first.clone()).await;
        state.add_package("test", second.clone()).await;

        assert_eq!(state.get_package_info("test"), Some(&[first, second][..]));
    }

    #[tokio::test]
    async fn bind_seeds_from_accessor() {
        let mut seed = InstalledPackages::new();
        seed.insert("seeded".to_string(), vec![record("04t000000000009", "2.0")]);
        let (source, _) = StaticSource::new(seed);
        let org = into_shared(OrgPackages::new(Box::new(source)));

        let mut state = SharedPackageState::new();
        state.bind(org).await.unwrap();
        assert!(state.has_package("seeded", Some("2.0")));
        assert!(!state.has_package("unseeded", None));
    }

    #[tokio::test]
    async fn add_invalidates_org_accessor() {
        let (source, fetches) = StaticSource::new(InstalledPackages::new());
        let org = into_shared(OrgPackages::new(Box::new(source)));

        let mut state = SharedPackageState::new();
        state.bind(org.clone()).await.unwrap();
        assert_eq!(fetches.load(std::sync::atomic::Ordering::SeqCst), 1);

        state.add_package("test", record("04t000000000001", "1.0")).await;

        // Invalidation is lazy: no fetch yet, one on the next read.
        assert_eq!(fetches.load(std::sync::atomic::Ordering::SeqCst), 1);
        org.lock().await.installed_packages().await.unwrap();
        assert_eq!(fetches.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn unbound_registry_never_panics() {
        let state = SharedPackageState::new();
        assert!(!state.has_package("anything", None));
        assert!(!state.has_package("anything", Some("1.0")));
        assert!(state.get_package_info("anything").is_none());
    }

    #[tokio::test]
    async fn unparsable_requirement_degrades_to_presence() {
        let mut state = bound_state().await;
        state.add_package("test", record("04t000000000001", "1.0")).await;
        assert!(state.has_package("test", Some("not-a-version")));
    }
}
