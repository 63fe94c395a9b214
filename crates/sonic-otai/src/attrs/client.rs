//! Client-side facets: LLDP, channel assignment and interfaces.

pub mod lldp {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::Lldp, "OTAI_LLDP_ATTR_";
        CHANNEL_ID = 0, "channel-id", U32, CreateOnly, mandatory;
        ENABLED = 1, "enabled", Bool, CreateAndSet;
    }
}

pub mod assignment {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::Assignment, "OTAI_ASSIGNMENT_ATTR_";
        CHANNEL_ID = 0, "channel-id", U32, CreateOnly, mandatory;
        ID = 1, "id", U32, CreateOnly, mandatory;
    }
}

pub mod interface {
    use crate::types::ObjectType;

    otai_attributes! {
        ObjectType::Interface, "OTAI_INTERFACE_ATTR_";
        INTERFACE_TYPE = 0, "interface-type", Chardata, CreateOnly, mandatory;
        INTERFACE_ID = 1, "interface-id", U32, CreateOnly, mandatory;
    }
}
