//! Amplifiers, optical supervisory channels and variable attenuators.

use sonic_otai::attrs::{attenuator, oa, osc};
use sonic_otai::ObjectType;

use crate::flex_counter::CounterType;
use crate::object::{Capabilities, ObjectDescriptor, StaticCounters};

pub static OA: ObjectDescriptor = ObjectDescriptor::new(
    "OaOrch",
    ObjectType::Oa,
    &[
        oa::ID,
        oa::TARGET_GAIN,
        oa::TARGET_GAIN_TILT,
        oa::AMP_MODE,
        oa::TARGET_OUTPUT_POWER,
        oa::MAX_OUTPUT_POWER,
        oa::ENABLED,
        oa::FIBER_TYPE_PROFILE,
        oa::WORKING_STATE,
        oa::INPUT_LOS_THRESHOLD,
        oa::INPUT_LOS_HYSTERESIS,
        oa::OUTPUT_LOS_THRESHOLD,
        oa::OUTPUT_LOS_HYSTERESIS,
        oa::GAIN_LOW_THRESHOLD,
        oa::GAIN_LOW_HYSTERESIS,
        oa::INPUT_LOW_THRESHOLD,
        oa::OUTPUT_LOW_THRESHOLD,
        oa::LOS_ASE_DELAY,
        oa::APR_NODE_ENABLE,
        oa::APR_NODE_REFLECTION_THRESHOLD,
        oa::APR_LINE_ENABLE,
        oa::APR_LINE_VALID_LLDP,
    ],
)
.auxiliary(&["name", "location", "component", "parent", "subcomponents"]);

pub static OSC: ObjectDescriptor = ObjectDescriptor::new(
    "OscOrch",
    ObjectType::Osc,
    &[
        osc::ID,
        osc::ENABLED,
        osc::RX_LOW_THRESHOLD,
        osc::RX_HIGH_THRESHOLD,
        osc::TX_LOW_THRESHOLD,
    ],
)
.auxiliary(&["name", "location", "interface", "parent"]);

pub static ATTENUATOR: ObjectDescriptor = ObjectDescriptor::new(
    "AttenuatorOrch",
    ObjectType::Attenuator,
    &[
        attenuator::ID,
        attenuator::ATTENUATION_MODE,
        attenuator::TARGET_OUTPUT_POWER,
        attenuator::ATTENUATION,
        attenuator::ENABLED,
    ],
)
.auxiliary(&["name", "component"]);

pub(super) fn oa_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[CounterType::OaStatus, CounterType::OaGauge]))
}

pub(super) fn osc_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[CounterType::OscStatus, CounterType::OscGauge]))
}

pub(super) fn attenuator_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[
        CounterType::AttenuatorStatus,
        CounterType::AttenuatorGauge,
    ]))
}
