//! Pluggable transceiver attributes.

use crate::metadata::EnumMetadata;
use crate::types::ObjectType;

pub static FLASH_PARTITION_ENUM: EnumMetadata = EnumMetadata {
    name: "OTAI_TRANSCEIVER_FLASH_PARTITION",
    values: &[(0, "A"), (1, "B")],
};

pub static UPGRADE_STATE_ENUM: EnumMetadata = EnumMetadata {
    name: "OTAI_TRANSCEIVER_UPGRADE_STATE",
    values: &[
        (0, "IDLE"),
        (1, "DOWNLOADING"),
        (2, "DOWNLOAD_OK"),
        (3, "DOWNLOAD_FAIL"),
        (4, "SWITCHING"),
        (5, "SWITCH_OK"),
        (6, "SWITCH_FAIL"),
        (7, "BACKUP_OK"),
        (8, "BACKUP_FAIL"),
    ],
};

pub static PRESENT_ENUM: EnumMetadata = EnumMetadata {
    name: "OTAI_TRANSCEIVER_PRESENT",
    values: &[(0, "PRESENT"), (1, "NOT_PRESENT")],
};

pub static FEC_MODE_ENUM: EnumMetadata = EnumMetadata {
    name: "OTAI_TRANSCEIVER_FEC_MODE",
    values: &[(0, "AUTO"), (1, "ENABLED"), (2, "DISABLED")],
};

pub static POWER_MODE_ENUM: EnumMetadata = EnumMetadata {
    name: "OTAI_TRANSCEIVER_POWER_MODE",
    values: &[(0, "NORMAL"), (1, "LOW")],
};

otai_attributes! {
    ObjectType::Transceiver, "OTAI_TRANSCEIVER_ATTR_";
    PORT_TYPE = 0, "port-type", Enum(&super::PORT_TYPE), CreateOnly, mandatory;
    PORT_ID = 1, "port-id", U32, CreateOnly, mandatory;
    ENABLED = 2, "enabled", Bool, CreateAndSet;
    VENDOR_EXPECT = 3, "vendor-expect", Chardata, CreateAndSet;
    FEC_MODE = 4, "fec-mode", Enum(&FEC_MODE_ENUM), CreateAndSet;
    UPGRADE_DOWNLOAD = 5, "upgrade-download", Bool, SetOnly, irrecoverable;
    SWITCH_FLASH_PARTITION = 6, "switch-flash-partition", Enum(&FLASH_PARTITION_ENUM), SetOnly, irrecoverable;
    BACKUP_FLASH_PARTITION = 7, "backup-flash-partition", Enum(&FLASH_PARTITION_ENUM), SetOnly, irrecoverable;
    ETHERNET_PMD_PRECONF = 8, "ethernet-pmd-preconf", Chardata, CreateAndSet;
    POWER_MODE = 9, "power-mode", Enum(&POWER_MODE_ENUM), CreateAndSet;
    RESET = 10, "reset", Bool, SetOnly, irrecoverable;
    UPGRADE_STATE = 11, "upgrade-state", Enum(&UPGRADE_STATE_ENUM), ReadOnly;
    PRESENT = 12, "present", Enum(&PRESENT_ENUM), ReadOnly;
}
