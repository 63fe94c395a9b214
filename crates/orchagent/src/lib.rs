//! Line-card orchestration agent.
//!
//! The agent translates declarative object rows from APPL_DB into OTAI HAL
//! calls and reflects state and counter registration back into STATE_DB and
//! FLEX_COUNTER_DB.
//!
//! # Structure
//!
//! - [`fsm`]: process-wide readiness state machine
//! - [`object`]: generic object orchestrator shared by every object type
//! - [`linecard`]: root object orchestrator driving the readiness FSM
//! - [`objects`]: descriptors and capabilities of the concrete object types
//! - [`flex_counter`]: counter-ID list registry, group managers and their orch
//! - [`diag`]: diagnostic state query channel
//! - [`daemon`]: the two-phase event loop

pub mod audit;
pub mod context;
pub mod daemon;
pub mod diag;
pub mod flex_counter;
pub mod fsm;
pub mod linecard;
pub mod object;
pub mod objects;
pub mod tables;

pub use context::SharedRuntimeContext;
pub use daemon::{OrchDaemon, OrchDaemonConfig, StopHandle};
pub use fsm::{OrchFsm, OrchState};
