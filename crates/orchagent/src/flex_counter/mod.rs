//! Flexible counters.
//!
//! Objects are registered for polling by writing their counter-ID lists into
//! FLEX_COUNTER_DB:
//! - [`FlexCounterManager`]: one polling group (gauge, counter or status)
//! - [`FlexCounterRegistry`]: manifest-backed ID lists plus the three managers
//! - [`FlexCounterOrch`]: live group interval and enable/disable changes

mod group;
mod manager;
mod orch;
mod registry;

pub use group::{CounterGroup, CounterType, ParseCounterGroupError, StatsMode};
pub use manager::FlexCounterManager;
pub use orch::{fields, FlexCounterError, FlexCounterOrch, FlexCounterOrchConfig, Result};
pub use registry::FlexCounterRegistry;
