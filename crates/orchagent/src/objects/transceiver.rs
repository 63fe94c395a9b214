//! Transceivers: presence propagation to the channels they host, a reduced
//! counter set while unplugged and the firmware upgrade channel.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use sonic_orch_common::{DbConnector, DbResult, FieldValue, KeyOpFieldsValues, NotificationMessage, NotificationProducer};
use sonic_otai::attrs::transceiver;
use sonic_otai::{
    deserialize_attr_value, serialize_attr_value, AttrValue, Attribute, ObjectApi, ObjectType, OtaiError,
    OtaiObjectId, OtaiResult,
};

use crate::flex_counter::{CounterType, FlexCounterRegistry};
use crate::object::{
    Capabilities, CounterAware, ObjectDescriptor, PresenceAware, SideChannel, SideChannelContext, StaticCounters,
};
use crate::tables::{fields, reply, state_table, UPGRADE_TRANSCEIVER_CHANNEL, UPGRADE_TRANSCEIVER_REPLY};
use crate::{error_log, info_log, warn_log};

const NAME: &str = "TransceiverOrch";

pub static TRANSCEIVER: ObjectDescriptor = ObjectDescriptor::new(
    NAME,
    ObjectType::Transceiver,
    &[
        transceiver::PORT_TYPE,
        transceiver::PORT_ID,
        transceiver::ENABLED,
        transceiver::VENDOR_EXPECT,
        transceiver::FEC_MODE,
        transceiver::UPGRADE_DOWNLOAD,
        transceiver::SWITCH_FLASH_PARTITION,
        transceiver::BACKUP_FLASH_PARTITION,
        transceiver::ETHERNET_PMD_PRECONF,
        transceiver::POWER_MODE,
        transceiver::RESET,
    ],
)
.read_only(&[transceiver::UPGRADE_STATE, transceiver::PRESENT])
.auxiliary(&[
    "parent",
    "physical-channel",
    "logical-channel",
    "ethernet",
    "otn",
    "och",
    "interface",
])
.with_presence();

/// Status attribute still polled while the module is unplugged.
pub const PRESENT_STATUS_ID: &str = "OTAI_TRANSCEIVER_ATTR_PRESENT";

const COUNTER_TYPES: &[CounterType] = &[
    CounterType::TransceiverGauge,
    CounterType::TransceiverCounter,
    CounterType::TransceiverStatus,
];

/// Full counter set while present; only the presence status while absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransceiverCounters;

#[async_trait]
impl CounterAware for TransceiverCounters {
    fn counter_types(&self) -> &[CounterType] {
        COUNTER_TYPES
    }

    async fn install(
        &self,
        counters: &FlexCounterRegistry,
        oid: OtaiObjectId,
        create_only: &BTreeMap<String, String>,
    ) -> DbResult<()> {
        StaticCounters(COUNTER_TYPES).install(counters, oid, create_only).await
    }

    async fn on_absent(&self, counters: &FlexCounterRegistry, oid: OtaiObjectId) -> DbResult<()> {
        counters.uninstall(oid, COUNTER_TYPES).await?;
        let ids = BTreeSet::from([PRESENT_STATUS_ID.to_string()]);
        counters.install_with(oid, CounterType::TransceiverStatus, &ids).await
    }
}

/// Auxiliary field of a transceiver row and the STATE table of the
/// sub-objects it lists.
const SUB_OBJECTS: &[(&str, ObjectType)] = &[
    ("physical-channel", ObjectType::PhysicalChannel),
    ("logical-channel", ObjectType::LogicalChannel),
    ("ethernet", ObjectType::Ethernet),
    ("otn", ObjectType::Otn),
    ("och", ObjectType::Och),
    ("interface", ObjectType::Interface),
];

/// Copies the transceiver's `present` value onto the STATE rows of the
/// channels it hosts, so their orchestrators follow the module.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubObjectPresence;

#[async_trait]
impl PresenceAware for SubObjectPresence {
    async fn propagate(
        &self,
        state_db: &Arc<dyn DbConnector>,
        key: &str,
        auxiliary: &[FieldValue],
        present: &str,
    ) -> DbResult<()> {
        for (field, value) in auxiliary {
            let Some((_, object_type)) = SUB_OBJECTS.iter().find(|(f, _)| f == field) else {
                continue;
            };
            let table = state_table(*object_type);
            for sub_key in value.split(',').map(str::trim).filter(|k| !k.is_empty()) {
                let fvs = vec![(fields::PRESENT.to_string(), present.to_string())];
                state_db.hset(table, sub_key, &fvs).await?;
                state_db.push_change(table, KeyOpFieldsValues::set(sub_key, fvs)).await?;
            }
            info_log!(NAME, "{} {}: {} set to {}", key, field, value, present);
        }
        Ok(())
    }
}

/// Firmware download, partition switch/backup and upgrade-state queries on
/// `UPGRADE_TRANSCEIVER`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeChannel;

impl UpgradeChannel {
    fn partition_attr(api: &ObjectApi, id: sonic_otai::AttrId, partition: Option<&str>) -> OtaiResult<Attribute> {
        let partition = partition.ok_or_else(|| OtaiError::invalid_parameter("missing partition"))?;
        let meta = api
            .metadata(id)
            .ok_or_else(|| OtaiError::internal(format!("Unable to get transceiver metadata, attr={}", id)))?;
        Ok(Attribute::new(id, deserialize_attr_value(partition, meta)?))
    }

    fn upgrade_state(api: &ObjectApi, oid: OtaiObjectId) -> OtaiResult<String> {
        let meta = api
            .metadata(transceiver::UPGRADE_STATE)
            .ok_or_else(|| OtaiError::internal("Failed to get metadata for transceiver"))?;
        let attr = api
            .get(oid, &[transceiver::UPGRADE_STATE])?
            .into_iter()
            .next()
            .ok_or_else(|| OtaiError::not_found(format!("upgrade-state of {}", oid)))?;
        Ok(serialize_attr_value(meta, &attr.value))
    }
}

#[async_trait]
impl SideChannel for UpgradeChannel {
    fn channel(&self) -> &'static str {
        UPGRADE_TRANSCEIVER_CHANNEL
    }

    async fn handle(&self, request: NotificationMessage, ctx: SideChannelContext<'_>) -> DbResult<()> {
        let producer = NotificationProducer::new(Arc::clone(ctx.appl_db), UPGRADE_TRANSCEIVER_REPLY);
        info_log!(NAME, "UPGRADE_TRANSCEIVER notification for {}", request.op);

        let key = request.get_field("key").unwrap_or_default();
        let Some(&oid) = ctx.key2oid.get(key) else {
            error_log!(NAME, "Failed to find oid, key={}", key);
            producer.send(&request.op, reply::FAILED, request.values).await?;
            return Ok(());
        };
        let partition = request.get_field("partition");

        let attr = match request.op.as_str() {
            "download" => Ok(Attribute::new(transceiver::UPGRADE_DOWNLOAD, AttrValue::Bool(true))),
            "switch" => Self::partition_attr(ctx.api, transceiver::SWITCH_FLASH_PARTITION, partition),
            "backup" => Self::partition_attr(ctx.api, transceiver::BACKUP_FLASH_PARTITION, partition),
            "state" => {
                match Self::upgrade_state(ctx.api, oid) {
                    Ok(state) => {
                        let values = vec![("UPGRADE_STATE".to_string(), state)];
                        producer.send("state", reply::SUCCESS, values).await?;
                    }
                    Err(e) => {
                        error_log!(NAME, "Failed to get transceiver upgrade state, rv:{}", e);
                        producer.send("state", reply::FAILED, Vec::new()).await?;
                    }
                }
                return Ok(());
            }
            other => Err(OtaiError::invalid_parameter(format!("unknown upgrade operation {}", other))),
        };

        let data = match attr.and_then(|attr| ctx.api.set(oid, &attr).map(|_| attr.id)) {
            Ok(id) => {
                info_log!(NAME, "Upgrade {} op={} attr_id={}", key, request.op, id);
                reply::SUCCESS
            }
            Err(e) => {
                warn_log!(NAME, "Failed to upgrade transceiver, op={}, status={}", request.op, e);
                reply::FAILED
            }
        };
        producer.send(&request.op, data, request.values).await?;
        Ok(())
    }
}

pub(super) fn capabilities() -> Capabilities {
    Capabilities::new()
        .with_counters(TransceiverCounters)
        .with_presence(SubObjectPresence)
        .with_side_channel(UpgradeChannel)
}
