//! Automatic protection switching attributes.

use crate::metadata::EnumMetadata;

pub static APS_PATH: EnumMetadata = EnumMetadata {
    name: "OTAI_APS_PATH",
    values: &[(0, "NONE"), (1, "PRIMARY"), (2, "SECONDARY")],
};

pub static APS_TYPE: EnumMetadata = EnumMetadata {
    name: "OTAI_APS_TYPE",
    values: &[(0, "OLP"), (1, "OCP")],
};

pub mod aps {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::Aps, "OTAI_APS_ATTR_";
        ID = 0, "id", U32, CreateOnly, mandatory;
        TYPE = 1, "type", Enum(&super::APS_TYPE), CreateOnly;
        REVERTIVE = 2, "revertive", Bool, CreateAndSet;
        WAIT_TO_RESTORE_TIME = 3, "wait-to-restore-time", U32, CreateAndSet;
        HOLD_OFF_TIME = 4, "hold-off-time", U32, CreateAndSet;
        PRIMARY_SWITCH_THRESHOLD = 5, "primary-switch-threshold", Double, CreateAndSet;
        PRIMARY_SWITCH_HYSTERESIS = 6, "primary-switch-hysteresis", Double, CreateAndSet;
        SECONDARY_SWITCH_THRESHOLD = 7, "secondary-switch-threshold", Double, CreateAndSet;
        RELATIVE_SWITCH_THRESHOLD = 8, "relative-switch-threshold", Double, CreateAndSet;
        RELATIVE_SWITCH_THRESHOLD_OFFSET = 9, "relative-switch-threshold-offset", Double, CreateAndSet;
        FORCE_TO_PORT = 10, "force-to-port", Enum(&super::APS_PATH), CreateAndSet;
        ALARM_HYSTERESIS = 11, "alarm-hysteresis", Double, CreateAndSet;
        COLLECT_SWITCH_INFO = 12, "collect-switch-info", Bool, CreateAndSet;
        ACTIVE_PATH = 13, "active-path", Enum(&super::APS_PATH), ReadOnly;
        SWITCH_INFO_NOTIFY = 14, "switch-info-notify", Pointer, CreateAndSet;
    }
}

pub mod aps_port {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::ApsPort, "OTAI_APSPORT_ATTR_";
        ID = 0, "id", U32, CreateOnly, mandatory;
        PORT_TYPE = 1, "port-type", Enum(&crate::attrs::PORT_TYPE), CreateOnly, mandatory;
        ENABLED = 2, "enabled", Bool, CreateAndSet;
        TARGET_ATTENUATION = 3, "target-attenuation", Double, CreateAndSet;
        POWER_LOW_THRESHOLD = 4, "power-low-threshold", Double, CreateAndSet;
    }
}
