//! Optical port attributes.

use crate::types::ObjectType;

otai_attributes! {
    ObjectType::Port, "OTAI_PORT_ATTR_";
    PORT_TYPE = 0, "port-type", Enum(&super::PORT_TYPE), CreateOnly, mandatory;
    PORT_ID = 1, "port-id", U32, CreateOnly, mandatory;
    ADMIN_STATE = 2, "admin-state", Enum(&super::ADMIN_STATE), CreateAndSet;
    RX_CD_RANGE = 3, "rx-cd-range", Chardata, CreateAndSet;
    ROLL_OFF = 4, "roll-off", Double, CreateAndSet;
    LOS_THRESHOLD = 5, "los-threshold", Double, CreateAndSet;
    LOW_THRESHOLD = 6, "low-threshold", Double, CreateAndSet;
    HIGH_THRESHOLD = 7, "high-threshold", Double, CreateAndSet;
    LED_MODE = 8, "led-mode", Enum(&super::LED_MODE), CreateAndSet;
    LED_FLASH_INTERVAL = 9, "led-flash-interval", U32, CreateAndSet;
    OPER_STATUS = 10, "oper-status", Enum(&super::OPER_STATUS), ReadOnly;
}
