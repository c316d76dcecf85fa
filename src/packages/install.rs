//! Package installation gate
//!
//! `ensure_installed` sits in front of the remote install command. It checks
//! the session's shared package state first, then the org's authoritative
//! installed-package view, and only then performs the actual install. With
//! several dependency-resolution passes in one session this turns repeated
//! remote round-trips per package into one install per distinct package.

use crate::error::{OrgboxError, OrgboxResult};
use crate::packages::state::SharedPackageState;
use crate::packages::version::{version_satisfied, PackageVersion, VersionRecord};
use crate::org::packages::{InstalledPackageSource, SfPackageSource, SharedOrg};
use crate::sf::SfCli;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Transient install failures worth retrying, matched against the CLI's
/// error message. Mostly replication lag after a package version is released.
const RETRYABLE_INSTALL_ERRORS: &[&str] = &[
    "This package is not yet available",
    "InstalledPackage version number",
    "unable to obtain exclusive access to this record",
    "invalid cross reference id",
];

/// Default number of install attempts before giving up
const DEFAULT_INSTALL_ATTEMPTS: u32 = 5;

/// Default delay between install attempts
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Default minutes to wait for the install request to complete
const DEFAULT_WAIT_MINUTES: u32 = 30;

/// A requested package, addressed by version id or by namespace + version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageRef {
    /// An explicit `04t` subscriber package version id
    VersionId(String),
    /// A namespace at a specific version number
    Namespace { namespace: String, version: String },
}

impl PackageRef {
    pub fn version_id(id: impl Into<String>) -> Self {
        Self::VersionId(id.into())
    }

    pub fn namespace_version(namespace: impl Into<String>, version: impl Into<String>) -> Self {
        Self::Namespace {
            namespace: namespace.into(),
            version: version.into(),
        }
    }

    /// Every shared-state key form this reference should be recorded under
    fn record_keys(&self) -> Vec<String> {
        match self {
            Self::VersionId(id) => vec![id.clone()],
            Self::Namespace { namespace, version } => {
                vec![namespace.clone(), format!("{}@{}", namespace, version)]
            }
        }
    }
}

impl std::str::FromStr for PackageRef {
    type Err = OrgboxError;

    /// Parse a package spec: an `04t` version id, or `namespace@version`
    fn from_str(s: &str) -> OrgboxResult<Self> {
        let trimmed = s.trim();
        if let Some((namespace, version)) = trimmed.split_once('@') {
            if namespace.is_empty() || version.is_empty() {
                return Err(OrgboxError::User(format!(
                    "Invalid package spec {:?}: expected namespace@version",
                    s
                )));
            }
            return Ok(Self::namespace_version(namespace, version));
        }
        if trimmed.starts_with("04t") {
            return Ok(Self::version_id(trimmed));
        }
        Err(OrgboxError::User(format!(
            "Invalid package spec {:?}: expected an 04t version id or namespace@version",
            s
        )))
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VersionId(id) => write!(f, "{}", id),
            Self::Namespace { namespace, version } => write!(f, "{}@{}", namespace, version),
        }
    }
}

/// Who can access the installed package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityType {
    /// All users in the org (`--security-type AllUsers`)
    #[default]
    AllUsers,
    /// Admin profiles only (`--security-type AdminsOnly`)
    AdminsOnly,
}

impl SecurityType {
    fn as_flag(self) -> &'static str {
        match self {
            Self::AllUsers => "AllUsers",
            Self::AdminsOnly => "AdminsOnly",
        }
    }
}

/// Options forwarded to the install command
#[derive(Debug, Clone, Default)]
pub struct PackageInstallOptions {
    pub security_type: SecurityType,
    /// Installation key for key-protected packages
    pub installation_key: Option<String>,
}

/// What the gate decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Requirement already satisfied; no remote command issued
    AlreadyPresent,
    /// The package was installed during this call
    Installed,
}

/// The remote install collaborator. Implementations retry transient failures
/// under their own policy and report the installed version on success.
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    async fn install(
        &self,
        package: &PackageRef,
        options: &PackageInstallOptions,
    ) -> OrgboxResult<VersionRecord>;
}

/// Production installer driving `sf package install`
pub struct SfPackageInstaller {
    cli: SfCli,
    username: String,
    wait_minutes: u32,
    attempts: u32,
    retry_delay: Duration,
}

impl SfPackageInstaller {
    pub fn new(cli: SfCli, username: impl Into<String>) -> Self {
        Self {
            cli,
            username: username.into(),
            wait_minutes: DEFAULT_WAIT_MINUTES,
            attempts: DEFAULT_INSTALL_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_wait_minutes(mut self, minutes: u32) -> Self {
        self.wait_minutes = minutes;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    async fn install_once(
        &self,
        package: &PackageRef,
        options: &PackageInstallOptions,
    ) -> OrgboxResult<Value> {
        let target = package.to_string();
        let wait = self.wait_minutes.to_string();
        let mut args: Vec<&str> = vec![
            "package",
            "install",
            "--package",
            &target,
            "-o",
            &self.username,
            "--wait",
            &wait,
            "--no-prompt",
            "--security-type",
            options.security_type.as_flag(),
        ];
        if let Some(key) = &options.installation_key {
            args.push("--installation-key");
            args.push(key);
        }

        Ok(self.cli.run_json(&args).await?.result)
    }

    /// Resolve the installed version record after a successful install.
    ///
    /// The install result carries the version id but not the version number.
    /// For namespace references the number comes from the reference itself;
    /// for id references it is looked up in the org's installed list.
    async fn resolve_record(&self, package: &PackageRef, result: &Value) -> VersionRecord {
        let result_id = result
            .get("SubscriberPackageVersionKey")
            .and_then(Value::as_str);

        match package {
            PackageRef::Namespace { version, .. } => {
                let id = result_id.unwrap_or_default().to_string();
                let version = version
                    .parse()
                    .unwrap_or_else(|_| PackageVersion::new(0, 0, 0, 0));
                VersionRecord::new(id, version)
            }
            PackageRef::VersionId(id) => {
                let id = result_id.unwrap_or(id).to_string();
                let source = SfPackageSource::new(self.cli.clone(), self.username.clone());
                let version = match source.fetch().await {
                    Ok(packages) => packages
                        .get(&id)
                        .and_then(|records| records.first())
                        .map(|record| record.version),
                    Err(e) => {
                        warn!("Could not confirm installed version for {}: {}", id, e);
                        None
                    }
                };
                // Version id lookups are presence checks, so an undetermined
                // number is recorded as 0.0 rather than failing the install.
                VersionRecord::new(id, version.unwrap_or(PackageVersion::new(0, 0, 0, 0)))
            }
        }
    }
}

#[async_trait]
impl PackageInstaller for SfPackageInstaller {
    async fn install(
        &self,
        package: &PackageRef,
        options: &PackageInstallOptions,
    ) -> OrgboxResult<VersionRecord> {
        let mut attempt = 0;
        let result = loop {
            attempt += 1;
            match self.install_once(package, options).await {
                Ok(result) => break result,
                Err(e) if attempt < self.attempts && is_retryable_install_error(&e) => {
                    warn!(
                        "Install of {} failed (attempt {}/{}), retrying: {}",
                        package, attempt, self.attempts, e
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    return Err(OrgboxError::PackageInstall {
                        package: package.to_string(),
                        reason: e.to_string(),
                    })
                }
            }
        };

        info!("Installed {}", package);
        Ok(self.resolve_record(package, &result).await)
    }
}

fn is_retryable_install_error(error: &OrgboxError) -> bool {
    let message = error.to_string();
    RETRYABLE_INSTALL_ERRORS
        .iter()
        .any(|marker| message.contains(marker))
}

/// Ensure `package` is installed in the org, installing it if needed.
///
/// Consults `shared` first when provided (cheap, session-local), then the
/// org's authoritative view, and only then invokes the installer. A
/// successful install is recorded back into `shared` under every key form of
/// the reference so later lookups under either form short-circuit. Installer
/// failures propagate unchanged and leave the shared state untouched.
pub async fn ensure_installed(
    org: &SharedOrg,
    installer: &dyn PackageInstaller,
    package: &PackageRef,
    options: &PackageInstallOptions,
    mut shared: Option<&mut SharedPackageState>,
) -> OrgboxResult<InstallOutcome> {
    if let Some(state) = &shared {
        let known = match package {
            PackageRef::VersionId(id) => state.has_package(id, None),
            PackageRef::Namespace { namespace, version } => {
                state.has_package(&format!("{}@{}", namespace, version), None)
                    || state.has_package(namespace, Some(version.as_str()))
            }
        };
        if known {
            debug!("{} already recorded in shared package state", package);
            return Ok(InstallOutcome::AlreadyPresent);
        }
    }

    let satisfied = {
        let mut org = org.lock().await;
        match package {
            PackageRef::VersionId(id) => {
                let packages = org.installed_packages().await?;
                let installed = packages.get(id).map(Vec::as_slice).unwrap_or(&[]);
                version_satisfied(installed, None)
            }
            PackageRef::Namespace { namespace, version } => {
                org.has_minimum_package_version(namespace, version).await?
            }
        }
    };
    if satisfied {
        debug!("{} already installed in org", package);
        return Ok(InstallOutcome::AlreadyPresent);
    }

    let record = installer.install(package, options).await?;

    if let Some(state) = shared.as_mut() {
        for key in package.record_keys() {
            state.add_package(&key, record.clone()).await;
        }
    }

    Ok(InstallOutcome::Installed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::org::packages::{into_shared, testutil::StaticSource, InstalledPackages, OrgPackages};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Installer stub that counts invocations
    struct CountingInstaller {
        record: VersionRecord,
        installs: Arc<AtomicUsize>,
    }

    impl CountingInstaller {
        fn new(record: VersionRecord) -> (Self, Arc<AtomicUsize>) {
            let installs = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    record,
                    installs: installs.clone(),
                },
                installs,
            )
        }
    }

    #[async_trait]
    impl PackageInstaller for CountingInstaller {
        async fn install(
            &self,
            _package: &PackageRef,
            _options: &PackageInstallOptions,
        ) -> OrgboxResult<VersionRecord> {
            self.installs.fetch_add(1, Ordering::SeqCst);
            Ok(self.record.clone())
        }
    }

    /// Installer stub that always fails
    struct FailingInstaller;

    #[async_trait]
    impl PackageInstaller for FailingInstaller {
        async fn install(
            &self,
            package: &PackageRef,
            _options: &PackageInstallOptions,
        ) -> OrgboxResult<VersionRecord> {
            Err(OrgboxError::PackageInstall {
                package: package.to_string(),
                reason: "install request failed".to_string(),
            })
        }
    }

    fn empty_org() -> SharedOrg {
        let (source, _) = StaticSource::new(InstalledPackages::new());
        into_shared(OrgPackages::new(Box::new(source)))
    }

    fn record(id: &str, version: &str) -> VersionRecord {
        VersionRecord::new(id, version.parse().unwrap())
    }

    #[tokio::test]
    async fn version_id_gate_short_circuits_on_shared_state() {
        let org = empty_org();
        let package = PackageRef::version_id("04t000000000000");
        let (installer, installs) = CountingInstaller::new(record("04t000000000000", "1.0"));
        let options = PackageInstallOptions::default();

        // First call without shared state: one real install.
        let outcome = ensure_installed(&org, &installer, &package, &options, None)
            .await
            .unwrap();
        assert_eq!(outcome, InstallOutcome::Installed);
        assert_eq!(installs.load(Ordering::SeqCst), 1);

        // Second call with a shared state that already recorded the id:
        // no further installs.
        let mut shared = SharedPackageState::new();
        shared.bind(org.clone()).await.unwrap();
        shared
            .add_package("04t000000000000", record("04t000000000000", "1.0"))
            .await;

        let outcome = ensure_installed(&org, &installer, &package, &options, Some(&mut shared))
            .await
            .unwrap();
        assert_eq!(outcome, InstallOutcome::AlreadyPresent);
        assert_eq!(installs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn namespace_gate_records_both_key_forms() {
        let org = empty_org();
        let package = PackageRef::namespace_version("testns", "1.0");
        let (installer, installs) = CountingInstaller::new(record("04t000000000001", "1.0"));
        let options = PackageInstallOptions::default();

        let mut shared = SharedPackageState::new();
        shared.bind(org.clone()).await.unwrap();

        let outcome = ensure_installed(&org, &installer, &package, &options, Some(&mut shared))
            .await
            .unwrap();
        assert_eq!(outcome, InstallOutcome::Installed);
        assert_eq!(installs.load(Ordering::SeqCst), 1);
        assert!(shared.get_package_info("testns").is_some());
        assert!(shared.get_package_info("testns@1.0").is_some());

        // Same reference again with the same shared state: short-circuits.
        let outcome = ensure_installed(&org, &installer, &package, &options, Some(&mut shared))
            .await
            .unwrap();
        assert_eq!(outcome, InstallOutcome::AlreadyPresent);
        assert_eq!(installs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn org_satisfied_requirement_skips_install() {
        let mut seed = InstalledPackages::new();
        seed.insert(
            "testns".to_string(),
            vec![record("04t000000000001", "1.2")],
        );
        let (source, _) = StaticSource::new(seed);
        let org = into_shared(OrgPackages::new(Box::new(source)));

        let package = PackageRef::namespace_version("testns", "1.0");
        let (installer, installs) = CountingInstaller::new(record("04t000000000001", "1.2"));

        let outcome = ensure_installed(
            &org,
            &installer,
            &package,
            &PackageInstallOptions::default(),
            None,
        )
        .await
        .unwrap();
        assert_eq!(outcome, InstallOutcome::AlreadyPresent);
        assert_eq!(installs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn install_failure_propagates_and_leaves_state_untouched() {
        let org = empty_org();
        let package = PackageRef::namespace_version("testns", "1.0");
        let mut shared = SharedPackageState::new();
        shared.bind(org.clone()).await.unwrap();

        let err = ensure_installed(
            &org,
            &FailingInstaller,
            &package,
            &PackageInstallOptions::default(),
            Some(&mut shared),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, OrgboxError::PackageInstall { .. }));
        assert!(shared.get_package_info("testns").is_none());
        assert!(shared.get_package_info("testns@1.0").is_none());
    }

    #[test]
    fn retryable_error_classification() {
        let transient = OrgboxError::command_exec(
            "sf package install",
            "This package is not yet available in your org",
        );
        assert!(is_retryable_install_error(&transient));

        let fatal = OrgboxError::command_exec("sf package install", "invalid installation key");
        assert!(!is_retryable_install_error(&fatal));
    }

    #[test]
    fn package_spec_parsing() {
        assert_eq!(
            "04t000000000000".parse::<PackageRef>().unwrap(),
            PackageRef::version_id("04t000000000000")
        );
        assert_eq!(
            "testns@1.0".parse::<PackageRef>().unwrap(),
            PackageRef::namespace_version("testns", "1.0")
        );
        assert!("@1.0".parse::<PackageRef>().is_err());
        assert!("testns@".parse::<PackageRef>().is_err());
        assert!("not-a-package".parse::<PackageRef>().is_err());
    }

    #[test]
    fn record_keys_per_reference_form() {
        assert_eq!(
            PackageRef::version_id("04t000000000000").record_keys(),
            vec!["04t000000000000".to_string()]
        );
        assert_eq!(
            PackageRef::namespace_version("testns", "1.0").record_keys(),
            vec!["testns".to_string(), "testns@1.0".to_string()]
        );
    }
}
