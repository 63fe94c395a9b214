//! Table, channel and field names shared by the orchestrators.

use sonic_otai::ObjectType;

/// Sentinel key announcing the number of declared objects of a table.
pub const CONFIG_DONE_KEY: &str = "ConfigDone";

pub const FLEX_COUNTER_TABLE: &str = "FLEX_COUNTER_TABLE";
pub const FLEX_COUNTER_GROUP_TABLE: &str = "FLEX_COUNTER_GROUP_TABLE";
/// CONFIG_DB table carrying group interval/status reconfiguration.
pub const CFG_FLEX_COUNTER_GROUP_TABLE: &str = "FLEX_COUNTER_GROUP";
pub const CFG_FLEX_COUNTER_TABLE: &str = "FLEX_COUNTER";

pub const SWSS_DIAG_CHANNEL: &str = "SWSS_DIAG_CHANNEL";
pub const SWSS_DIAG_REPLY: &str = "SWSS_DIAG_REPLY";
pub const UPGRADE_TRANSCEIVER_CHANNEL: &str = "UPGRADE_TRANSCEIVER";
pub const UPGRADE_TRANSCEIVER_REPLY: &str = "UPGRADE_TRANSCEIVER_REPLY";

/// Field names carried on APPL/STATE rows.
pub mod fields {
    pub const INDEX: &str = "index";
    pub const OPERATION_ID: &str = "operation-id";
    pub const COUNT: &str = "count";
    pub const PRESENT: &str = "present";
    pub const OBJECT_COUNT: &str = "object-count";
    pub const OPER_STATUS: &str = "oper-status";
    pub const NAME: &str = "name";
}

/// Values of the `present` field.
pub mod presence {
    pub const PRESENT: &str = "PRESENT";
    pub const NOT_PRESENT: &str = "NOT_PRESENT";
}

/// Replies on imperative channels.
pub mod reply {
    pub const SUCCESS: &str = "SUCCESS";
    pub const FAILED: &str = "FAILED";
    pub const UNAVAILABLE: &str = "UNAVAILABLE";
}

/// APPL_DB table holding the declarative rows of an object type.
pub fn appl_table(object_type: ObjectType) -> &'static str {
    object_type.short_name()
}

pub fn state_table(object_type: ObjectType) -> &'static str {
    object_type.short_name()
}

/// COUNTERS_DB table holding the polled values of an object type.
pub fn counters_table(object_type: ObjectType) -> &'static str {
    object_type.short_name()
}

/// COUNTERS_DB table mapping serialized oids back to their keys.
pub fn name_map_table(object_type: ObjectType) -> String {
    format!("COUNTERS_{}_NAME_MAP", object_type.short_name())
}

pub fn notification_channel(object_type: ObjectType) -> String {
    format!("{}_NOTIFICATION", object_type.short_name())
}

pub fn reply_channel(object_type: ObjectType) -> String {
    format!("{}_REPLY", object_type.short_name())
}

/// Channel on which the result of a declarative write of `field` is published.
pub fn operation_result_channel(field: &str, operation_id: &str) -> String {
    format!("{}-{}", field, operation_id)
}
