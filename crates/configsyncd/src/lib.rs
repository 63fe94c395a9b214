//! configsyncd: mirrors line-card configuration from CONFIG_DB into APPL_DB.
//!
//! One [`ConfigSync`] per object table copies the configured rows and
//! follows later changes; the OCM and OTDR syncs additionally run the
//! periodic scans configured for them.

pub mod daemon;
mod error;
pub mod ocm;
pub mod otdr;
pub mod scan;
pub mod sync;
pub mod tables;

pub use daemon::{SyncDaemon, SyncDaemonConfig};
pub use error::{ConfigSyncError, Result};
pub use sync::{ConfigSync, SyncDatabases, SyncService};
