//! Table names and fields used by linecardmgrd.

/// Same name in CONFIG_DB, APPL_DB and STATE_DB.
pub const LINECARD_TABLE: &str = "LINECARD";

pub const POWER_ADMIN_STATE: &str = "power-admin-state";
pub const POWER_ENABLED: &str = "POWER_ENABLED";
