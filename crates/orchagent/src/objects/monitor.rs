//! Channel monitors and OTDRs. Both are driven by external scanners through
//! the request channel, which answers UNAVAILABLE until the linecard works.

use sonic_otai::attrs::{ocm, otdr};
use sonic_otai::ObjectType;

use crate::flex_counter::CounterType;
use crate::object::{Capabilities, ObjectDescriptor, RequestStyle, StaticCounters};

pub static OCM: ObjectDescriptor = ObjectDescriptor::new(
    "OcmOrch",
    ObjectType::Ocm,
    &[ocm::ID, ocm::FREQUENCY_GRANULARITY, ocm::SCAN],
)
.auxiliary(&["name", "parent-port"])
.request_style(RequestStyle::Scan);

pub static OTDR: ObjectDescriptor = ObjectDescriptor::new(
    "OtdrOrch",
    ObjectType::Otdr,
    &[
        otdr::ID,
        otdr::REFRACTIVE_INDEX,
        otdr::BACKSCATTER_INDEX,
        otdr::REFLECTION_THRESHOLD,
        otdr::SPLICE_LOSS_THRESHOLD,
        otdr::END_OF_FIBER_THRESHOLD,
        otdr::DISTANCE_RANGE,
        otdr::PULSE_WIDTH,
        otdr::AVERAGE_TIME,
        otdr::OUTPUT_FREQUENCY,
        otdr::SCAN,
    ],
)
.auxiliary(&["name", "parent-port", "parent", "enable", "start-time", "period"])
.self_processed(&["name", "enable", "start-time", "period", "parent-port"])
.request_style(RequestStyle::Scan);

pub(super) fn ocm_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[CounterType::OcmStatus]))
}

pub(super) fn otdr_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[CounterType::OtdrStatus]))
}
