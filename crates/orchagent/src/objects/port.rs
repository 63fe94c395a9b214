use std::collections::BTreeMap;

use async_trait::async_trait;
use sonic_orch_common::DbResult;
use sonic_otai::attrs::port;
use sonic_otai::{ObjectType, OtaiObjectId};

use crate::flex_counter::{CounterType, FlexCounterRegistry};
use crate::object::{Capabilities, CounterAware, ObjectDescriptor};

pub static PORT: ObjectDescriptor = ObjectDescriptor::new(
    "PortOrch",
    ObjectType::Port,
    &[
        port::PORT_TYPE,
        port::PORT_ID,
        port::ADMIN_STATE,
        port::RX_CD_RANGE,
        port::ROLL_OFF,
        port::LOS_THRESHOLD,
        port::LOW_THRESHOLD,
        port::HIGH_THRESHOLD,
        port::LED_MODE,
        port::LED_FLASH_INTERVAL,
    ],
)
.read_only(&[port::OPER_STATUS])
.auxiliary(&["subcomponents", "location", "parent"]);

/// Status counters for every port, plus the gauge list matching the
/// direction of its port type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PortCounters;

impl PortCounters {
    pub fn gauge_type(port_type: &str) -> CounterType {
        if port_type.ends_with("_IN") {
            CounterType::InportGauge
        } else if port_type.ends_with("_OUT") {
            CounterType::OutportGauge
        } else {
            CounterType::PortGauge
        }
    }
}

#[async_trait]
impl CounterAware for PortCounters {
    fn counter_types(&self) -> &[CounterType] {
        &[
            CounterType::PortStatus,
            CounterType::PortGauge,
            CounterType::InportGauge,
            CounterType::OutportGauge,
        ]
    }

    async fn install(
        &self,
        counters: &FlexCounterRegistry,
        oid: OtaiObjectId,
        create_only: &BTreeMap<String, String>,
    ) -> DbResult<()> {
        let port_type = create_only.get("port-type").map(String::as_str).unwrap_or_default();
        counters.install(oid, CounterType::PortStatus).await?;
        counters.install(oid, Self::gauge_type(port_type)).await
    }
}

pub(super) fn capabilities() -> Capabilities {
    Capabilities::new().with_counters(PortCounters)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_type_follows_direction() {
        assert_eq!(PortCounters::gauge_type("LINE_IN"), CounterType::InportGauge);
        assert_eq!(PortCounters::gauge_type("EDFA_OUT"), CounterType::OutportGauge);
        assert_eq!(PortCounters::gauge_type("CLIENT"), CounterType::PortGauge);
        assert_eq!(PortCounters::gauge_type(""), CounterType::PortGauge);
    }
}
