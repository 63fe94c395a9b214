//! Concrete object types.
//!
//! Each submodule declares the static [`ObjectDescriptor`] of one or more HAL
//! object types together with the capabilities their orchestrator is built
//! with. [`build_object_orchs`] instantiates all of them in registration
//! order.

mod amplifier;
mod channel;
mod client;
mod monitor;
mod port;
mod protection;
mod transceiver;

use sonic_orch_common::DbResult;

use crate::context::SharedRuntimeContext;
use crate::info_log;
use crate::object::{Capabilities, ObjectDescriptor, ObjectOrch};

pub use amplifier::{ATTENUATOR, OA, OSC};
pub use channel::{ETHERNET, LOGICAL_CHANNEL, OCH, OTN, PHYSICAL_CHANNEL};
pub use client::{ASSIGNMENT, INTERFACE, LLDP};
pub use monitor::{OCM, OTDR};
pub use port::{PortCounters, PORT};
pub use protection::{ApsSwitchInfo, APS, APS_PORT};
pub use transceiver::{SubObjectPresence, TransceiverCounters, UpgradeChannel, TRANSCEIVER};

/// One object type ready to be instantiated.
pub struct ObjectKind {
    pub descriptor: &'static ObjectDescriptor,
    pub capabilities: fn() -> Capabilities,
}

/// Every object type driven by a generic orchestrator, in the order the
/// daemon registers them.
pub fn object_kinds() -> Vec<ObjectKind> {
    vec![
        ObjectKind {
            descriptor: &PORT,
            capabilities: port::capabilities,
        },
        ObjectKind {
            descriptor: &TRANSCEIVER,
            capabilities: transceiver::capabilities,
        },
        ObjectKind {
            descriptor: &OTN,
            capabilities: channel::otn_capabilities,
        },
        ObjectKind {
            descriptor: &ETHERNET,
            capabilities: channel::ethernet_capabilities,
        },
        ObjectKind {
            descriptor: &OCH,
            capabilities: channel::och_capabilities,
        },
        ObjectKind {
            descriptor: &LOGICAL_CHANNEL,
            capabilities: channel::logical_channel_capabilities,
        },
        ObjectKind {
            descriptor: &PHYSICAL_CHANNEL,
            capabilities: channel::physical_channel_capabilities,
        },
        ObjectKind {
            descriptor: &INTERFACE,
            capabilities: client::interface_capabilities,
        },
        ObjectKind {
            descriptor: &ASSIGNMENT,
            capabilities: client::assignment_capabilities,
        },
        ObjectKind {
            descriptor: &OA,
            capabilities: amplifier::oa_capabilities,
        },
        ObjectKind {
            descriptor: &OSC,
            capabilities: amplifier::osc_capabilities,
        },
        ObjectKind {
            descriptor: &APS,
            capabilities: protection::aps_capabilities,
        },
        ObjectKind {
            descriptor: &APS_PORT,
            capabilities: protection::aps_port_capabilities,
        },
        ObjectKind {
            descriptor: &ATTENUATOR,
            capabilities: amplifier::attenuator_capabilities,
        },
        ObjectKind {
            descriptor: &OCM,
            capabilities: monitor::ocm_capabilities,
        },
        ObjectKind {
            descriptor: &OTDR,
            capabilities: monitor::otdr_capabilities,
        },
        ObjectKind {
            descriptor: &LLDP,
            capabilities: client::lldp_capabilities,
        },
    ]
}

/// Builds one orchestrator per object type.
pub async fn build_object_orchs(ctx: &SharedRuntimeContext) -> DbResult<Vec<ObjectOrch>> {
    let kinds = object_kinds();
    let mut orchs = Vec::with_capacity(kinds.len());
    for kind in kinds {
        orchs.push(ObjectOrch::new(ctx, kind.descriptor, (kind.capabilities)()).await?);
    }
    info_log!("OrchDaemon", "Built {} object orchestrators", orchs.len());
    Ok(orchs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextOptions, Databases};
    use crate::object::AttrClassification;
    use sonic_otai::{ObjectApi, ObjectType, OtaiApi, VirtualOtai};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    #[test]
    fn test_every_object_type_registered_once() {
        let types: BTreeSet<ObjectType> = object_kinds().iter().map(|s| s.descriptor.object_type).collect();
        assert_eq!(types.len(), 17);
        assert!(!types.contains(&ObjectType::Linecard));
    }

    #[test]
    fn test_every_config_attr_classified() {
        let hal: Arc<dyn OtaiApi> = Arc::new(VirtualOtai::new());
        for kind in object_kinds() {
            let desc = kind.descriptor;
            let api = ObjectApi::new(desc.object_type, Arc::clone(&hal));
            let attrs = AttrClassification::build(desc.orch_name, &api, desc.config_attrs, desc.read_only_attrs);
            for &id in desc.config_attrs {
                let meta = api.metadata(id).unwrap();
                assert!(
                    attrs.is_config_field(meta.kebab_name),
                    "{} {} not configurable",
                    desc.orch_name,
                    meta.kebab_name
                );
            }
            for &id in desc.read_only_attrs {
                let meta = api.metadata(id).unwrap();
                assert!(attrs.read_only_id(meta.kebab_name).is_some());
            }
        }
    }

    #[tokio::test]
    async fn test_build_object_orchs() {
        let hal = Arc::new(VirtualOtai::new());
        let ctx = SharedRuntimeContext::new(hal, Databases::in_memory(), ContextOptions::default())
            .await
            .unwrap();
        let orchs = build_object_orchs(&ctx).await.unwrap();
        assert_eq!(orchs.len(), 17);
        assert_eq!(orchs[0].name(), "PortOrch");
        assert_eq!(orchs[16].name(), "LldpOrch");
    }
}
