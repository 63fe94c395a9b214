//! Static attribute tables, one module per object type.
//!
//! Each module exports one `AttrId` constant per attribute and a `METADATA`
//! slice consumed by [`crate::metadata::get_attr_metadata`].

use crate::metadata::EnumMetadata;

/// Declares attribute id constants and the metadata table of an object type.
macro_rules! otai_attributes {
    (
        $object_type:expr, $prefix:literal;
        $( $id:ident = $value:literal, $kebab:literal, $ty:expr, $access:ident $(, $flag:ident)* ; )*
    ) => {
        use $crate::metadata::{Access, AttrId, AttrMetadata};
        #[allow(unused_imports)]
        use $crate::metadata::AttrValueType::*;

        $( pub const $id: AttrId = $value; )*

        pub static METADATA: &[AttrMetadata] = &[
            $(
                AttrMetadata::new(
                    $object_type,
                    $id,
                    concat!($prefix, stringify!($id)),
                    $kebab,
                    $ty,
                    Access::$access,
                )
                $( .$flag() )*,
            )*
        ];
    };
}

mod amplifier;
mod channel;
mod client;
pub mod linecard;
mod monitor;
pub mod port;
mod protection;
pub mod transceiver;

pub use amplifier::{attenuator, oa, osc};
pub use channel::{ethernet, och, otn, physical_channel, logical_channel};
pub use client::{assignment, interface, lldp};
pub use monitor::{ocm, otdr};
pub use protection::{aps, aps_port};

pub static PORT_TYPE: EnumMetadata = EnumMetadata {
    name: "OTAI_PORT_TYPE",
    values: &[
        (0, "INVALID"),
        (1, "CLIENT"),
        (2, "LINE"),
        (3, "LINE_IN"),
        (4, "LINE_OUT"),
        (5, "EDFA_IN"),
        (6, "EDFA_OUT"),
        (7, "OSC_IN"),
        (8, "OSC_OUT"),
        (9, "OCM_IN"),
        (10, "OTDR_IN"),
        (11, "APS_IN"),
        (12, "APS_OUT"),
        (13, "MUX_IN"),
        (14, "DEMUX_OUT"),
    ],
};

pub static ADMIN_STATE: EnumMetadata = EnumMetadata {
    name: "OTAI_ADMIN_STATE",
    values: &[(0, "ENABLED"), (1, "DISABLED"), (2, "MAINT")],
};

pub static OPER_STATUS: EnumMetadata = EnumMetadata {
    name: "OTAI_OPER_STATUS",
    values: &[(0, "UNKNOWN"), (1, "ACTIVE"), (2, "INACTIVE")],
};

pub static LED_MODE: EnumMetadata = EnumMetadata {
    name: "OTAI_LED_MODE",
    values: &[(0, "AUTO"), (1, "ON"), (2, "OFF"), (3, "FLASH")],
};
