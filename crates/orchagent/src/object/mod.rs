//! Generic object orchestration.
//!
//! Every HAL object type except the linecard is driven by one [`ObjectOrch`]
//! built from a static [`ObjectDescriptor`] and optional [`Capabilities`].

mod capability;
mod core;
mod descriptor;
mod error;
mod orch;

pub use capability::{
    Capabilities, CounterAware, ExtraAttrsOnCreate, PresenceAware, SideChannel, SideChannelContext, StaticCounters,
};
pub use core::ObjectCore;
pub use descriptor::{AttrClassification, ObjectDescriptor, RequestStyle};
pub use error::{ObjectOrchError, Result};
pub use orch::{ConfigState, ObjectOrch, PRESENCE_PURGE_INTERVAL};
