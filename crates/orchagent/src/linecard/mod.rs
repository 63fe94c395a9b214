//! The linecard: root HAL object and owner of the pre-configuration phase.

mod orch;
mod progress;

pub use orch::{linecard_key, LinecardOrch, LinecardOrchConfig};
pub use progress::ConfigProgress;

use crate::info_log;

/// Hook run when the linecard finishes pre-configuration or turns ACTIVE.
pub(crate) fn on_linecard_active() {
    info_log!("LinecardOrch", "Linecard is active");
}
