use std::sync::Arc;

use sonic_otai::attrs::{aps, aps_port};
use sonic_otai::value::ApsSwitchInfoFn;
use sonic_otai::{AttrValue, Attribute, NotificationHandler, ObjectType};

use crate::flex_counter::CounterType;
use crate::info_log;
use crate::object::{Capabilities, ExtraAttrsOnCreate, ObjectDescriptor, StaticCounters};

pub static APS: ObjectDescriptor = ObjectDescriptor::new(
    "ApsOrch",
    ObjectType::Aps,
    &[
        aps::ID,
        aps::TYPE,
        aps::REVERTIVE,
        aps::WAIT_TO_RESTORE_TIME,
        aps::HOLD_OFF_TIME,
        aps::PRIMARY_SWITCH_THRESHOLD,
        aps::PRIMARY_SWITCH_HYSTERESIS,
        aps::SECONDARY_SWITCH_THRESHOLD,
        aps::RELATIVE_SWITCH_THRESHOLD,
        aps::RELATIVE_SWITCH_THRESHOLD_OFFSET,
        aps::FORCE_TO_PORT,
        aps::ALARM_HYSTERESIS,
    ],
)
.read_only(&[aps::ACTIVE_PATH])
.auxiliary(&["name", "location", "parent", "subcomponents"]);

pub static APS_PORT: ObjectDescriptor = ObjectDescriptor::new(
    "ApsPortOrch",
    ObjectType::ApsPort,
    &[
        aps_port::ID,
        aps_port::PORT_TYPE,
        aps_port::ENABLED,
        aps_port::TARGET_ATTENUATION,
        aps_port::POWER_LOW_THRESHOLD,
    ],
);

/// Registers the switch-info callback on every protection group.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApsSwitchInfo;

impl ExtraAttrsOnCreate for ApsSwitchInfo {
    fn extra_attrs(&self, _key: &str) -> Vec<Attribute> {
        let on_switch: ApsSwitchInfoFn = Arc::new(|oid, info| {
            info_log!("ApsOrch", "Switch info notify, aps {}: {}", oid, info);
        });
        vec![
            Attribute::new(
                aps::SWITCH_INFO_NOTIFY,
                AttrValue::Notification(NotificationHandler::ApsSwitchInfo(on_switch)),
            ),
            Attribute::new(aps::COLLECT_SWITCH_INFO, AttrValue::Bool(true)),
        ]
    }
}

pub(super) fn aps_capabilities() -> Capabilities {
    Capabilities::new()
        .with_counters(StaticCounters(&[CounterType::ApsStatus]))
        .with_extra_attrs(ApsSwitchInfo)
}

pub(super) fn aps_port_capabilities() -> Capabilities {
    Capabilities::new().with_counters(StaticCounters(&[
        CounterType::ApsPortStatus,
        CounterType::ApsPortGauge,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_switch_info_attrs() {
        let attrs = ApsSwitchInfo.extra_attrs("APS-1-1-1");
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].id, aps::SWITCH_INFO_NOTIFY);
        assert!(matches!(
            attrs[0].value,
            AttrValue::Notification(NotificationHandler::ApsSwitchInfo(_))
        ));
        assert_eq!(attrs[1], Attribute::new(aps::COLLECT_SWITCH_INFO, AttrValue::Bool(true)));
    }
}
