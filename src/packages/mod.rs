//! Package installation tracking and gating
//!
//! The shared package state deduplicates install attempts across the
//! dependency-resolution passes of one session; the gate in [`install`]
//! consults it before issuing real install commands.

pub mod install;
pub mod state;
pub mod version;

pub use install::{
    ensure_installed, InstallOutcome, PackageInstallOptions, PackageInstaller, PackageRef,
    SecurityType, SfPackageInstaller,
};
pub use state::SharedPackageState;
pub use version::{version_satisfied, PackageVersion, VersionRecord};
