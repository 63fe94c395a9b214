//! Linecard attributes.

use crate::metadata::EnumMetadata;
use crate::types::ObjectType;

pub static LINECARD_TYPE_ENUM: EnumMetadata = EnumMetadata {
    name: "OTAI_LINECARD_TYPE",
    values: &[(0, "P230C"), (1, "E110C"), (2, "E120C"), (3, "E220C"), (4, "OA")],
};

pub static BOARD_MODE_ENUM: EnumMetadata = EnumMetadata {
    name: "OTAI_LINECARD_BOARD_MODE",
    values: &[
        (0, "L1_400G_CA_100GE"),
        (1, "L2_400G_CA_100GE"),
        (2, "L1_200G_CA_100GE"),
        (3, "L1_100G_CA_100GE"),
    ],
};

pub static UPGRADE_STATE_ENUM: EnumMetadata = EnumMetadata {
    name: "OTAI_LINECARD_UPGRADE_STATE",
    values: &[
        (0, "IDLE"),
        (1, "DOWNLOADING"),
        (2, "DOWNLOAD_OK"),
        (3, "DOWNLOAD_FAIL"),
        (4, "COMMITTING"),
        (5, "COMMIT_OK"),
        (6, "COMMIT_FAIL"),
        (7, "ROLLBACK_OK"),
        (8, "ROLLBACK_FAIL"),
    ],
};

otai_attributes! {
    ObjectType::Linecard, "OTAI_LINECARD_ATTR_";
    LINECARD_TYPE = 0, "linecard-type", Enum(&LINECARD_TYPE_ENUM), CreateOnly, mandatory;
    BOARD_MODE = 1, "board-mode", Enum(&BOARD_MODE_ENUM), CreateAndSet;
    RESET = 2, "reset", Bool, SetOnly, irrecoverable;
    HOSTNAME = 3, "hostname", Chardata, CreateAndSet;
    BAUD_RATE = 4, "baud-rate", U32, CreateAndSet;
    COLLECT_LINECARD_LOG = 5, "collect-linecard-log", Bool, SetOnly, irrecoverable;
    HOST_IP = 6, "host-ip", Chardata, CreateAndSet;
    USER_NAME = 7, "user-name", Chardata, CreateAndSet;
    USER_PASSWORD = 8, "user-password", Chardata, CreateAndSet;
    UPGRADE_FILE_NAME = 9, "upgrade-file-name", Chardata, CreateAndSet;
    UPGRADE_FILE_PATH = 10, "upgrade-file-path", Chardata, CreateAndSet;
    UPGRADE_DOWNLOAD = 11, "upgrade-download", Bool, SetOnly, irrecoverable;
    UPGRADE_AUTO = 12, "upgrade-auto", Bool, SetOnly, irrecoverable;
    UPGRADE_COMMIT = 13, "upgrade-commit", Bool, SetOnly, irrecoverable;
    UPGRADE_COMMIT_PAUSE = 14, "upgrade-commit-pause", Bool, SetOnly, irrecoverable;
    UPGRADE_COMMIT_RESUME = 15, "upgrade-commit-resume", Bool, SetOnly, irrecoverable;
    UPGRADE_ROLLBACK = 16, "upgrade-rollback", Bool, SetOnly, irrecoverable;
    UPGRADE_REBOOT = 17, "upgrade-reboot", Bool, SetOnly, irrecoverable;
    LED_MODE = 18, "led-mode", Enum(&super::LED_MODE), CreateAndSet;
    LED_FLASH_INTERVAL = 19, "led-flash-interval", U32, CreateAndSet;
    UPGRADE_STATE = 20, "upgrade-state", Enum(&UPGRADE_STATE_ENUM), ReadOnly;
    OPER_STATUS = 21, "oper-status", Enum(&super::OPER_STATUS), ReadOnly;
    START_PRE_CONFIGURATION = 22, "start-pre-configuration", Bool, SetOnly;
    STOP_PRE_CONFIGURATION = 23, "stop-pre-configuration", Bool, SetOnly;
    LINECARD_ALARM_NOTIFY = 24, "linecard-alarm-notify", Pointer, CreateAndSet;
    LINECARD_STATE_CHANGE_NOTIFY = 25, "linecard-state-change-notify", Pointer, CreateAndSet;
    COLLECT_LINECARD_ALARM = 26, "collect-linecard-alarm", Bool, CreateAndSet;
}
