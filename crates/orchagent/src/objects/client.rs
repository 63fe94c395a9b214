use sonic_otai::attrs::{assignment, interface, lldp};
use sonic_otai::ObjectType;

use crate::flex_counter::CounterType;
use crate::object::{Capabilities, ObjectDescriptor, StaticCounters};

pub static INTERFACE: ObjectDescriptor = ObjectDescriptor::new(
    "InterfaceOrch",
    ObjectType::Interface,
    &[interface::INTERFACE_TYPE, interface::INTERFACE_ID],
)
.auxiliary(&["type", "name", "transceiver", "hardware-port"])
.with_presence();

pub static LLDP: ObjectDescriptor =
    ObjectDescriptor::new("LldpOrch", ObjectType::Lldp, &[lldp::CHANNEL_ID, lldp::ENABLED]);

pub static ASSIGNMENT: ObjectDescriptor = ObjectDescriptor::new(
    "AssignmentOrch",
    ObjectType::Assignment,
    &[assignment::CHANNEL_ID, assignment::ID],
)
.auxiliary(&["assignment-type", "logical-channel"]);

pub(super) fn interface_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[
        CounterType::InterfaceStatus,
        CounterType::InterfaceCounter,
    ]))
}

pub(super) fn lldp_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[CounterType::LldpStatus]))
}

pub(super) fn assignment_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[CounterType::AssignmentStatus]))
}
