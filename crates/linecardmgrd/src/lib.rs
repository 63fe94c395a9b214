//! linecardmgrd: hands the configured linecard to the orchestration agent.
//!
//! The CONFIG_DB `LINECARD` row is copied into APPL_DB only after the
//! platform reports the linecard as powered in STATE_DB. Until then the
//! row stays pending and is retried.

pub mod linecard_mgr;
pub mod tables;

pub use linecard_mgr::{LinecardMgr, LinecardMgrConfig};
