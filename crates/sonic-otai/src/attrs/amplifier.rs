//! Optical amplifier, OSC and variable optical attenuator attributes.

use crate::metadata::EnumMetadata;

pub static AMP_MODE: EnumMetadata = EnumMetadata {
    name: "OTAI_OA_AMP_MODE",
    values: &[(0, "CONSTANT_POWER"), (1, "CONSTANT_GAIN"), (2, "DYNAMIC_GAIN")],
};

pub static ATTENUATION_MODE: EnumMetadata = EnumMetadata {
    name: "OTAI_ATTENUATION_MODE",
    values: &[(0, "CONSTANT_POWER"), (1, "CONSTANT_ATTENUATION")],
};

pub mod oa {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::Oa, "OTAI_OA_ATTR_";
        ID = 0, "id", U32, CreateOnly, mandatory;
        TARGET_GAIN = 1, "target-gain", Double, CreateAndSet;
        TARGET_GAIN_TILT = 2, "target-gain-tilt", Double, CreateAndSet;
        AMP_MODE = 3, "amp-mode", Enum(&super::AMP_MODE), CreateAndSet;
        TARGET_OUTPUT_POWER = 4, "target-output-power", Double, CreateAndSet;
        MAX_OUTPUT_POWER = 5, "max-output-power", Double, CreateAndSet;
        ENABLED = 6, "enabled", Bool, CreateAndSet;
        FIBER_TYPE_PROFILE = 7, "fiber-type-profile", Chardata, CreateAndSet;
        WORKING_STATE = 8, "working-state", Chardata, CreateAndSet;
        INPUT_LOS_THRESHOLD = 9, "input-los-threshold", Double, CreateAndSet;
        INPUT_LOS_HYSTERESIS = 10, "input-los-hysteresis", Double, CreateAndSet;
        OUTPUT_LOS_THRESHOLD = 11, "output-los-threshold", Double, CreateAndSet;
        OUTPUT_LOS_HYSTERESIS = 12, "output-los-hysteresis", Double, CreateAndSet;
        GAIN_LOW_THRESHOLD = 13, "gain-low-threshold", Double, CreateAndSet;
        GAIN_LOW_HYSTERESIS = 14, "gain-low-hysteresis", Double, CreateAndSet;
        INPUT_LOW_THRESHOLD = 15, "input-low-threshold", Double, CreateAndSet;
        OUTPUT_LOW_THRESHOLD = 16, "output-low-threshold", Double, CreateAndSet;
        LOS_ASE_DELAY = 17, "los-ase-delay", U32, CreateAndSet;
        APR_NODE_ENABLE = 18, "apr-node-enable", Bool, CreateAndSet;
        APR_NODE_REFLECTION_THRESHOLD = 19, "apr-node-reflection-threshold", Double, CreateAndSet;
        APR_LINE_ENABLE = 20, "apr-line-enable", Bool, CreateAndSet;
        APR_LINE_VALID_LLDP = 21, "apr-line-valid-lldp", Bool, CreateAndSet;
    }
}

pub mod osc {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::Osc, "OTAI_OSC_ATTR_";
        ID = 0, "id", U32, CreateOnly, mandatory;
        ENABLED = 1, "enabled", Bool, CreateAndSet;
        RX_LOW_THRESHOLD = 2, "rx-low-threshold", Double, CreateAndSet;
        RX_HIGH_THRESHOLD = 3, "rx-high-threshold", Double, CreateAndSet;
        TX_LOW_THRESHOLD = 4, "tx-low-threshold", Double, CreateAndSet;
    }
}

pub mod attenuator {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::Attenuator, "OTAI_ATTENUATOR_ATTR_";
        ID = 0, "id", U32, CreateOnly, mandatory;
        ATTENUATION_MODE = 1, "attenuation-mode", Enum(&super::ATTENUATION_MODE), CreateAndSet;
        TARGET_OUTPUT_POWER = 2, "target-output-power", Double, CreateAndSet;
        ATTENUATION = 3, "attenuation", Double, CreateAndSet;
        ENABLED = 4, "enabled", Bool, CreateAndSet;
    }
}
