//! The orchestration daemon: registration of every orchestrator and the
//! two-phase select loop.

mod orchdaemon;

pub use orchdaemon::{OrchDaemon, OrchDaemonConfig, StopHandle};
