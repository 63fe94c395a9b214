//! Table, channel and field names shared with the orchestration agent.

pub const CONFIG_DONE_KEY: &str = "ConfigDone";

pub const LINECARD_TABLE: &str = "LINECARD";
pub const OCM_TABLE: &str = "OCM";
pub const OTDR_TABLE: &str = "OTDR";
pub const OCM_GROUP_TABLE: &str = "OCM_GROUP";

pub const OCM_NOTIFICATION: &str = "OCM_NOTIFICATION";
pub const OCM_REPLY: &str = "OCM_REPLY";
pub const OTDR_NOTIFICATION: &str = "OTDR_NOTIFICATION";
pub const OTDR_REPLY: &str = "OTDR_REPLY";

/// `(service, table)` of every sync that only mirrors rows. CONFIG_DB and
/// APPL_DB use the same table name.
pub const PLAIN_SYNCS: &[(&str, &str)] = &[
    ("apsportsync", "APSPORT"),
    ("apssync", "APS"),
    ("assignmentsync", "ASSIGNMENT"),
    ("attenuatorsync", "ATTENUATOR"),
    ("ethernetsync", "ETHERNET"),
    ("interfacesync", "INTERFACE"),
    ("lldpsync", "LLDP"),
    ("logicalchannelsync", "LOGICALCHANNEL"),
    ("oasync", "OA"),
    ("ochsync", "OCH"),
    ("oscsync", "OSC"),
    ("otnsync", "OTN"),
    ("physicalchannelsync", "PHYSICALCHANNEL"),
    ("portsync", "PORT"),
    ("transceiversync", "TRANSCEIVER"),
];

pub mod fields {
    pub const INDEX: &str = "index";
    pub const COUNT: &str = "count";
    pub const OBJECT_COUNT: &str = "object-count";
    pub const OPERATION_ID: &str = "operation-id";

    pub const ENABLE: &str = "enable";
    pub const START_TIME: &str = "start-time";
    pub const PERIOD: &str = "period";
    pub const SCANNING_STATUS: &str = "scanning-status";
    pub const SCAN: &str = "scan";

    pub const OCM_LIST: &str = "ocm-list";
    pub const FREQUENCY_GRANULARITY: &str = "frequency-granularity";
}

/// Channel on which the result of a declarative write of `field` is published.
pub fn operation_result_channel(field: &str, operation_id: &str) -> String {
    format!("{}-{}", field, operation_id)
}
