//! Channel facets of a transceiver: logical, physical, OTN, Ethernet and
//! optical channels.

use crate::metadata::EnumMetadata;

pub static LOOPBACK_MODE: EnumMetadata = EnumMetadata {
    name: "OTAI_LOOPBACK_MODE",
    values: &[(0, "NONE"), (1, "FACILITY"), (2, "TERMINAL")],
};

pub static TEST_SIGNAL_PATTERN: EnumMetadata = EnumMetadata {
    name: "OTAI_TEST_SIGNAL_PATTERN",
    values: &[(0, "NONE"), (1, "PRBS_X7"), (2, "PRBS_X9"), (3, "PRBS_X15"), (4, "PRBS_X23"), (5, "PRBS_X31")],
};

pub static DELAY_MEASUREMENT_MODE: EnumMetadata = EnumMetadata {
    name: "OTAI_OTN_DELAY_MEASUREMENT_MODE",
    values: &[(0, "NORMAL"), (1, "LOOPBACK")],
};

pub mod logical_channel {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::LogicalChannel, "OTAI_LOGICALCHANNEL_ATTR_";
        CHANNEL_ID = 0, "channel-id", U32, CreateOnly, mandatory;
        ADMIN_STATE = 1, "admin-state", Enum(&crate::attrs::ADMIN_STATE), CreateAndSet;
        LOOPBACK_MODE = 2, "loopback-mode", Enum(&super::LOOPBACK_MODE), CreateAndSet;
        TEST_SIGNAL_PATTERN = 3, "test-signal-pattern", Enum(&super::TEST_SIGNAL_PATTERN), CreateAndSet;
        TX_TEST_SIGNAL_PATTERN = 4, "tx-test-signal-pattern", Enum(&super::TEST_SIGNAL_PATTERN), CreateAndSet;
        RX_TEST_SIGNAL_PATTERN = 5, "rx-test-signal-pattern", Enum(&super::TEST_SIGNAL_PATTERN), CreateAndSet;
        LINK_DOWN_DELAY_MODE = 6, "link-down-delay-mode", Bool, CreateAndSet;
        LINK_DOWN_DELAY_HOLD_OFF = 7, "link-down-delay-hold-off", U32, CreateAndSet;
        LINK_UP_DELAY_MODE = 8, "link-up-delay-mode", Bool, CreateAndSet;
        LINK_UP_DELAY_HOLD_OFF = 9, "link-up-delay-hold-off", U32, CreateAndSet;
        LINK_UP_DELAY_ACTIVE_THRESHOLD = 10, "link-up-delay-active-threshold", U32, CreateAndSet;
    }
}

pub mod physical_channel {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::PhysicalChannel, "OTAI_PHYSICALCHANNEL_ATTR_";
        PORT_TYPE = 0, "port-type", Enum(&crate::attrs::PORT_TYPE), CreateOnly, mandatory;
        PORT_ID = 1, "port-id", U32, CreateOnly, mandatory;
        LANE_ID = 2, "lane-id", U32, CreateOnly, mandatory;
    }
}

pub mod otn {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::Otn, "OTAI_OTN_ATTR_";
        CHANNEL_ID = 0, "channel-id", U32, CreateOnly, mandatory;
        TTI_MSG_EXPECTED = 1, "tti-msg-expected", Chardata, CreateAndSet;
        TTI_MSG_TRANSMIT = 2, "tti-msg-transmit", Chardata, CreateAndSet;
        TTI_MSG_AUTO = 3, "tti-msg-auto", Bool, CreateAndSet;
        DELAY_MEASUREMENT_ENABLED = 4, "delay-measurement-enabled", Bool, CreateAndSet;
        DELAY_MEASUREMENT_MODE = 5, "delay-measurement-mode", Enum(&super::DELAY_MEASUREMENT_MODE), CreateAndSet;
        MAINTENANCE = 6, "maintenance", Chardata, CreateAndSet;
    }
}

pub mod ethernet {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::Ethernet, "OTAI_ETHERNET_ATTR_";
        CHANNEL_ID = 0, "channel-id", U32, CreateOnly, mandatory;
        CLIENT_ALS = 1, "client-als", Chardata, CreateAndSet;
        ALS_DELAY = 2, "als-delay", U32, CreateAndSet;
        CLIENT_RX_ALS = 3, "client-rx-als", Bool, CreateAndSet;
        CLIENT_RX_ALS_DELAY = 4, "client-rx-als-delay", U32, CreateAndSet;
        MAINTENANCE = 5, "maintenance", Chardata, CreateAndSet;
        CLEAR_RMON = 6, "clear-rmon", Bool, SetOnly, irrecoverable;
    }
}

pub mod och {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::Och, "OTAI_OCH_ATTR_";
        PORT_TYPE = 0, "port-type", Enum(&crate::attrs::PORT_TYPE), CreateOnly, mandatory;
        PORT_ID = 1, "port-id", U32, CreateOnly, mandatory;
        OPERATIONAL_MODE = 2, "operational-mode", U32, CreateAndSet;
        FREQUENCY = 3, "frequency", U64, CreateAndSet;
        TARGET_OUTPUT_POWER = 4, "target-output-power", Double, CreateAndSet;
    }
}
