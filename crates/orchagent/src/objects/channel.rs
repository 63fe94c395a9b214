//! Channels hosted by a transceiver. All of them follow the presence of
//! their module through their STATE rows.

use sonic_otai::attrs::{ethernet, logical_channel, och, otn, physical_channel};
use sonic_otai::ObjectType;

use crate::flex_counter::CounterType;
use crate::object::{Capabilities, ObjectDescriptor, StaticCounters};

pub static LOGICAL_CHANNEL: ObjectDescriptor = ObjectDescriptor::new(
    "LogicalChannelOrch",
    ObjectType::LogicalChannel,
    &[
        logical_channel::CHANNEL_ID,
        logical_channel::ADMIN_STATE,
        logical_channel::LOOPBACK_MODE,
        logical_channel::TEST_SIGNAL_PATTERN,
        logical_channel::TX_TEST_SIGNAL_PATTERN,
        logical_channel::RX_TEST_SIGNAL_PATTERN,
        logical_channel::LINK_DOWN_DELAY_MODE,
        logical_channel::LINK_DOWN_DELAY_HOLD_OFF,
        logical_channel::LINK_UP_DELAY_MODE,
        logical_channel::LINK_UP_DELAY_HOLD_OFF,
        logical_channel::LINK_UP_DELAY_ACTIVE_THRESHOLD,
    ],
)
.auxiliary(&["description", "transceiver"])
.with_presence();

pub static PHYSICAL_CHANNEL: ObjectDescriptor = ObjectDescriptor::new(
    "PhysicalChannelOrch",
    ObjectType::PhysicalChannel,
    &[
        physical_channel::PORT_TYPE,
        physical_channel::PORT_ID,
        physical_channel::LANE_ID,
    ],
)
.with_presence();

pub static OTN: ObjectDescriptor = ObjectDescriptor::new(
    "OtnOrch",
    ObjectType::Otn,
    &[
        otn::CHANNEL_ID,
        otn::TTI_MSG_EXPECTED,
        otn::TTI_MSG_TRANSMIT,
        otn::TTI_MSG_AUTO,
        otn::DELAY_MEASUREMENT_ENABLED,
        otn::DELAY_MEASUREMENT_MODE,
        otn::MAINTENANCE,
    ],
)
.with_presence();

pub static ETHERNET: ObjectDescriptor = ObjectDescriptor::new(
    "EthernetOrch",
    ObjectType::Ethernet,
    &[
        ethernet::CHANNEL_ID,
        ethernet::CLIENT_ALS,
        ethernet::ALS_DELAY,
        ethernet::CLIENT_RX_ALS,
        ethernet::CLIENT_RX_ALS_DELAY,
        ethernet::MAINTENANCE,
        ethernet::CLEAR_RMON,
    ],
)
.with_presence();

/// Frequency and target power are mirrored into STATE so the line side can
/// be read back without polling.
pub static OCH: ObjectDescriptor = ObjectDescriptor::new(
    "OchOrch",
    ObjectType::Och,
    &[
        och::PORT_TYPE,
        och::PORT_ID,
        och::OPERATIONAL_MODE,
        och::FREQUENCY,
        och::TARGET_OUTPUT_POWER,
    ],
)
.auxiliary(&["parent", "line-port"])
.cached(&["frequency", "target-output-power"])
.with_presence();

pub(super) fn logical_channel_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[
        CounterType::LogicalChCounter,
        CounterType::LogicalChStatus,
    ]))
}

pub(super) fn physical_channel_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[
        CounterType::PhysicalChCounter,
        CounterType::PhysicalChGauge,
        CounterType::PhysicalChStatus,
    ]))
}

pub(super) fn otn_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[
        CounterType::OtnCounter,
        CounterType::OtnGauge,
        CounterType::OtnStatus,
    ]))
}

pub(super) fn ethernet_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[
        CounterType::EthernetCounter,
        CounterType::EthernetStatus,
    ]))
}

pub(super) fn och_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[
        CounterType::OpticalChStatus,
        CounterType::OpticalChGauge,
        CounterType::OpticalChCounter,
    ]))
}
