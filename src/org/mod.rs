//! Org provisioning and state
//!
//! Scratch org lifecycle, pool checkout, local org records, and the
//! installed-package accessor.

pub mod manager;
pub mod packages;
pub mod pool;
pub mod record;
pub mod scratch;

pub use manager::OrgManager;
pub use packages::{
    into_shared, InstalledPackageSource, InstalledPackages, OrgPackages, SfPackageSource, SharedOrg,
};
pub use pool::OrgPool;
pub use record::{OrgKind, OrgRecord};
pub use scratch::ScratchOrgs;
