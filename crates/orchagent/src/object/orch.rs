//! The generic object orchestrator.
//!
//! One [`ObjectOrch`] runs per HAL object type. It consumes the APPL table of
//! its type, creates every declared object once the `ConfigDone` sentinel
//! has been seen, reports completion of the type to the linecard, and
//! afterwards pushes attribute updates to the HAL. Optional capabilities add
//! counter registration, presence tracking, extra create attributes and an
//! extra request channel.
//!
//! Every pass over the APPL table first retries the creation of declared
//! keys still lacking an oid, so a failed HAL create recovers without new
//! input. A DEL drops the key from the declared set and the reconciliation
//! that follows removes the HAL object; it is not only logged.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sonic_orch_common::{
    ConsumerConfig, DbConnector, DbResult, Executor, ExecutorSet, FieldValue, KeyOpFieldsValues,
    NotificationConsumer, NotificationMessage, NotificationProducer, Operation, Orch, OrchResult,
    SelectableTimer, Table, TableConsumer,
};
use sonic_otai::{OtaiObjectId, OtaiStatus};

use super::capability::{Capabilities, SideChannelContext};
use super::core::ObjectCore;
use super::descriptor::{AttrClassification, ObjectDescriptor, RequestStyle};
use super::error::Result;
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::context::SharedRuntimeContext;
use crate::flex_counter::FlexCounterRegistry;
use crate::fsm::{OrchFsm, OrchState};
use crate::linecard::ConfigProgress;
use crate::tables::{
    appl_table, counters_table, fields, name_map_table, notification_channel, operation_result_channel, presence,
    reply, reply_channel, state_table, CONFIG_DONE_KEY,
};
use crate::{audit_log, debug_log, error_log, info_log, warn_log};

/// Interval after which an object still marked NOT_PRESENT loses its
/// COUNTERS and STATE rows.
pub const PRESENCE_PURGE_INTERVAL: Duration = Duration::from_secs(5);

const APPL_TABLE: usize = 0;
const STATE_TABLE: usize = 1;
const REQUEST_CHANNEL: usize = 0;
const SIDE_CHANNEL: usize = 1;

/// Bootstrap progress of one object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigState {
    /// No sentinel seen yet.
    Missing,
    /// Sentinel seen, expected object count known.
    Received,
    /// Every expected object exists; becomes `Done` at the end of the pass.
    Created,
    /// Updates are applied to the HAL.
    Done,
}

/// Attribute snapshot of one declared key.
#[derive(Debug, Clone, Default)]
struct ManagedObject {
    create_only: BTreeMap<String, String>,
    create_and_set: BTreeMap<String, String>,
    auxiliary: Vec<FieldValue>,
}

impl ManagedObject {
    fn merge(&mut self, update: &FieldUpdate) {
        self.create_only.extend(update.create_only.clone());
        self.create_and_set.extend(update.create_and_set.clone());
        for (field, value) in &update.auxiliary {
            match self.auxiliary.iter_mut().find(|(f, _)| f == field) {
                Some(existing) => existing.1 = value.clone(),
                None => self.auxiliary.push((field.clone(), value.clone())),
            }
        }
    }
}

/// Fields of one SET entry sorted by class.
#[derive(Debug, Default)]
struct FieldUpdate {
    index: Option<u32>,
    operation_id: String,
    create_only: BTreeMap<String, String>,
    create_and_set: BTreeMap<String, String>,
    auxiliary: Vec<FieldValue>,
}

impl FieldUpdate {
    fn partition(orch: &str, desc: &ObjectDescriptor, attrs: &AttrClassification, fvs: &[FieldValue]) -> Self {
        let mut update = FieldUpdate::default();
        for (field, value) in fvs {
            if field == fields::INDEX {
                match value.parse::<u32>() {
                    Ok(index) => update.index = Some(index),
                    Err(_) => warn_log!(orch, "Invalid index {}", value),
                }
            } else if field == fields::OPERATION_ID {
                update.operation_id = value.clone();
            } else if attrs.create_only_id(field).is_some() {
                update.create_only.insert(field.clone(), value.clone());
            } else if attrs.create_and_set_id(field).is_some() {
                update.create_and_set.insert(field.clone(), value.clone());
            }

            if desc.is_auxiliary(field) {
                update.auxiliary.push((field.clone(), value.clone()));
            }
        }
        update
    }
}

/// Declarative and imperative handling of one HAL object type.
pub struct ObjectOrch {
    desc: &'static ObjectDescriptor,
    core: ObjectCore,
    caps: Capabilities,
    fsm: Arc<OrchFsm>,
    counters: Arc<FlexCounterRegistry>,
    progress: Arc<ConfigProgress>,
    appl_db: Arc<dyn DbConnector>,
    counters_db: Arc<dyn DbConnector>,
    name_map: Table,
    executors: ExecutorSet,
    reply: NotificationProducer,
    batch_size: usize,

    config_state: ConfigState,
    count: usize,
    objects: BTreeMap<String, ManagedObject>,
    key2oid: BTreeMap<String, OtaiObjectId>,
    key2present: HashMap<String, String>,
    pre_clear: BTreeSet<String>,
    ready_to_clear: BTreeSet<String>,
}

impl ObjectOrch {
    pub async fn new(
        ctx: &SharedRuntimeContext,
        desc: &'static ObjectDescriptor,
        caps: Capabilities,
    ) -> DbResult<Self> {
        let object_type = desc.object_type;
        let api = ctx.api(object_type);
        let attrs = AttrClassification::build(desc.orch_name, &api, desc.config_attrs, desc.read_only_attrs);
        let core = ObjectCore::new(
            desc.orch_name,
            api,
            attrs,
            Arc::clone(&ctx.fsm),
            Arc::clone(&ctx.dbs.state),
            desc.cached_fields,
        );

        let mut executors = ExecutorSet::new();
        executors.add_table(TableConsumer::new(
            Arc::clone(&ctx.dbs.appl),
            ConsumerConfig::new(appl_table(object_type)).with_batch_size(ctx.batch_size),
        ));
        if desc.watch_presence {
            executors.add_table(TableConsumer::new(
                Arc::clone(&ctx.dbs.state),
                ConsumerConfig::new(state_table(object_type)).with_batch_size(ctx.batch_size),
            ));
            executors.add_timer(SelectableTimer::new(PRESENCE_PURGE_INTERVAL));
        }
        executors.add_notification(NotificationConsumer::new(&ctx.dbs.appl, &notification_channel(object_type)).await?);
        if let Some(side) = &caps.side_channel {
            executors.add_notification(NotificationConsumer::new(&ctx.dbs.appl, side.channel()).await?);
        }

        Ok(Self {
            desc,
            core,
            caps,
            fsm: Arc::clone(&ctx.fsm),
            counters: Arc::clone(&ctx.counters),
            progress: Arc::clone(&ctx.progress),
            appl_db: Arc::clone(&ctx.dbs.appl),
            counters_db: Arc::clone(&ctx.dbs.counters),
            name_map: Table::new(Arc::clone(&ctx.dbs.counters), name_map_table(object_type)),
            executors,
            reply: NotificationProducer::new(Arc::clone(&ctx.dbs.appl), reply_channel(object_type)),
            batch_size: ctx.batch_size,
            config_state: ConfigState::Missing,
            count: 0,
            objects: BTreeMap::new(),
            key2oid: BTreeMap::new(),
            key2present: HashMap::new(),
            pre_clear: BTreeSet::new(),
            ready_to_clear: BTreeSet::new(),
        })
    }

    pub fn name(&self) -> &'static str {
        self.desc.orch_name
    }

    pub fn descriptor(&self) -> &'static ObjectDescriptor {
        self.desc
    }

    pub fn config_state(&self) -> ConfigState {
        self.config_state
    }

    pub fn oid(&self, key: &str) -> Option<OtaiObjectId> {
        self.key2oid.get(key).copied()
    }

    /// Number of objects that currently exist in the HAL.
    pub fn object_count(&self) -> usize {
        self.key2oid.len()
    }

    /// Keys registered through an `index` field.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn present(&self, key: &str) -> Option<&str> {
        self.key2present.get(key).map(String::as_str)
    }

    /// Keys waiting for the presence purge timer.
    pub fn pending_purge(&self) -> impl Iterator<Item = &str> {
        self.pre_clear.iter().chain(self.ready_to_clear.iter()).map(String::as_str)
    }

    fn is_ready(&self) -> bool {
        self.fsm.get() > OrchState::Ready && self.counters.is_initialized()
    }

    async fn do_config_task(&mut self) -> Result<()> {
        if !self.is_ready() {
            return Ok(());
        }
        let Some(table) = self.executors.table(APPL_TABLE) else {
            return Ok(());
        };
        let entries = table.drain();
        let pending = self.process_config_entries(entries).await?;
        if !pending.is_empty() {
            if let Some(table) = self.executors.table(APPL_TABLE) {
                table.requeue(pending);
            }
        }
        Ok(())
    }

    /// Runs one pass over declarative entries; returns the ones to retry.
    async fn process_config_entries(&mut self, entries: Vec<KeyOpFieldsValues>) -> Result<Vec<KeyOpFieldsValues>> {
        let mut pending = Vec::new();

        if self.config_state != ConfigState::Missing && self.has_uncreated() {
            self.reconcile().await?;
            self.check_created();
        }

        for entry in entries {
            info_log!(
                self.name(),
                "doTask: Table = {}, key = {}, op = {}",
                self.name(),
                entry.key,
                entry.op
            );

            if entry.key == CONFIG_DONE_KEY {
                self.process_sentinel(&entry).await?;
                continue;
            }

            match entry.op {
                Operation::Del => self.process_del(&entry.key).await?,
                Operation::Set => {
                    if self.process_set(&entry).await? {
                        pending.push(entry);
                    }
                }
            }
        }

        if self.config_state == ConfigState::Created {
            self.config_state = ConfigState::Done;
        }
        Ok(pending)
    }

    async fn process_sentinel(&mut self, entry: &KeyOpFieldsValues) -> Result<()> {
        if self.config_state != ConfigState::Missing {
            debug_log!(self.name(), "Drop duplicate {}", CONFIG_DONE_KEY);
            return Ok(());
        }
        if entry.op == Operation::Del {
            return Ok(());
        }

        self.config_state = ConfigState::Received;
        if let Some(count) = entry.get_field(fields::COUNT) {
            match count.parse::<usize>() {
                Ok(count) => self.count = count,
                Err(_) => warn_log!(self.name(), "Malformed {} count {}", CONFIG_DONE_KEY, count),
            }
        }
        info_log!(self.name(), "{} declares {} objects", CONFIG_DONE_KEY, self.count);

        self.reconcile().await?;
        self.check_created();
        Ok(())
    }

    async fn process_del(&mut self, key: &str) -> Result<()> {
        info_log!(self.name(), "Deleting {}", key);
        self.objects.remove(key);
        if self.config_state != ConfigState::Missing {
            self.reconcile().await?;
        }
        Ok(())
    }

    /// Returns true when the entry must be retried on a later pass.
    async fn process_set(&mut self, entry: &KeyOpFieldsValues) -> Result<bool> {
        let key = entry.key.as_str();
        let update = FieldUpdate::partition(self.name(), self.desc, self.core.attrs(), &entry.fvs);

        if self.key2oid.contains_key(key) {
            if self.config_state != ConfigState::Done {
                return Ok(true);
            }
            if let Some(object) = self.objects.get_mut(key) {
                object.merge(&update);
            }
            self.apply_update(key, &update).await?;
            return Ok(false);
        }

        match self.objects.get_mut(key) {
            Some(object) => object.merge(&update),
            None if update.index.is_some() => {
                let mut object = ManagedObject::default();
                object.merge(&update);
                self.objects.insert(key.to_string(), object);
            }
            None => {
                warn_log!(self.name(), "Drop {}, key was never declared with an index", key);
                return Ok(false);
            }
        }

        if self.config_state == ConfigState::Missing {
            return Ok(false);
        }
        let created_before = self.key2oid.contains_key(key);
        self.reconcile().await?;
        self.check_created();

        // An object created after bootstrap already got its snapshot applied.
        if self.config_state == ConfigState::Done && !created_before && self.key2oid.contains_key(key) {
            self.self_process(key, &update.auxiliary, &update.operation_id).await?;
        }
        Ok(false)
    }

    async fn apply_update(&mut self, key: &str, update: &FieldUpdate) -> Result<()> {
        if !update.create_only.is_empty() {
            debug_log!(self.name(), "Ignore create-only fields of existing {}", key);
        }
        if !update.create_and_set.is_empty() {
            let oid = self.oid(key);
            let ok = self
                .core
                .set_attrs(key, oid, &update.create_and_set, &update.operation_id)
                .await?;
            if !ok {
                error_log!(self.name(), "Failed to set attributes, {}", key);
            }
        }
        self.self_process(key, &update.auxiliary, &update.operation_id).await
    }

    /// Writes self-processed auxiliary fields to STATE and acknowledges them.
    async fn self_process(&self, key: &str, auxiliary: &[FieldValue], operation_id: &str) -> Result<()> {
        for (field, value) in auxiliary {
            if !self.desc.self_process_fields.contains(&field.as_str()) {
                continue;
            }
            self.core.state_table().hset(key, field, value).await?;
            self.core
                .publish_operation_result(
                    &operation_result_channel(field, operation_id),
                    OtaiStatus::Success,
                    &format!("Set {} {} to {}", key, field, value),
                )
                .await?;
        }
        Ok(())
    }

    fn has_uncreated(&self) -> bool {
        self.objects.keys().any(|key| !self.key2oid.contains_key(key))
    }

    fn check_created(&mut self) {
        if self.count != 0 && self.key2oid.len() == self.count {
            info_log!(self.name(), "Finish initialize {}", self.name());
            self.progress.inc_config_num();
            self.count = 0;
            self.config_state = ConfigState::Created;
        }
    }

    /// Removes objects whose keys vanished and creates the ones without oid.
    async fn reconcile(&mut self) -> Result<()> {
        let stale: Vec<String> = self
            .key2oid
            .keys()
            .filter(|key| !self.objects.contains_key(*key))
            .cloned()
            .collect();
        for key in stale {
            self.remove_object(&key).await?;
        }

        let missing: Vec<String> = self
            .objects
            .keys()
            .filter(|key| !self.key2oid.contains_key(*key))
            .cloned()
            .collect();
        for key in missing {
            self.create_object(&key).await?;
        }
        Ok(())
    }

    async fn create_object(&mut self, key: &str) -> Result<bool> {
        let Some(object) = self.objects.get(key).cloned() else {
            return Ok(false);
        };

        let mut attrs = Vec::with_capacity(object.create_only.len());
        for (field, value) in &object.create_only {
            match self.core.translate(field, value) {
                Ok(attr) => attrs.push(attr),
                Err(e) => error_log!(self.name(), "Failed to translate attr, {}|{}: {}", self.name(), field, e),
            }
        }
        if let Some(extra) = &self.caps.extra_attrs {
            attrs.extend(extra.extra_attrs(key));
        }

        let oid = match self.core.api().create(self.progress.linecard_oid(), &attrs) {
            Ok(oid) => oid,
            Err(e) => {
                error_log!(self.name(), "Failed to create {}|{}, rv={}", self.name(), key, e);
                let record = AuditRecord::new(AuditCategory::ResourceCreate, self.name(), "create_object")
                    .with_outcome(AuditOutcome::Failure)
                    .with_object_id(key)
                    .with_object_type(self.desc.object_type.short_name())
                    .with_error(e.to_string());
                audit_log!(record);
                return Ok(false);
            }
        };
        info_log!(self.name(), "Create {}|{} oid:{}", self.name(), key, oid);
        self.key2oid.insert(key.to_string(), oid);

        if !self.core.set_attrs(key, Some(oid), &object.create_and_set, "").await? {
            error_log!(self.name(), "Failed to set fields, {}", key);
        }
        if !object.auxiliary.is_empty() {
            self.core.state_table().set(key, &object.auxiliary).await?;
        }
        self.name_map.hset("", &oid.serialize(), key).await?;
        if let Some(counters) = &self.caps.counters {
            counters.install(&self.counters, oid, &object.create_only).await?;
        }

        let record = AuditRecord::new(AuditCategory::ResourceCreate, self.name(), "create_object")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(oid.serialize())
            .with_object_type(self.desc.object_type.short_name())
            .with_details(serde_json::json!({
                "key": key,
                "attributes": attrs.len(),
            }));
        audit_log!(record);
        Ok(true)
    }

    async fn remove_object(&mut self, key: &str) -> Result<()> {
        let Some(oid) = self.oid(key) else {
            return Ok(());
        };

        let record = AuditRecord::new(AuditCategory::ResourceDelete, self.name(), "remove_object")
            .with_object_id(oid.serialize())
            .with_object_type(self.desc.object_type.short_name());
        if let Err(e) = self.core.api().remove(oid) {
            error_log!(self.name(), "Failed to remove {}|{}, rv={}", self.name(), key, e);
            audit_log!(record.with_outcome(AuditOutcome::Failure).with_error(e.to_string()));
            return Ok(());
        }
        info_log!(self.name(), "Remove {}|{} oid:{}", self.name(), key, oid);

        self.key2oid.remove(key);
        self.key2present.remove(key);
        self.pre_clear.remove(key);
        self.ready_to_clear.remove(key);
        if let Some(counters) = &self.caps.counters {
            counters.uninstall(&self.counters, oid).await?;
        }
        self.name_map.hdel("", &oid.serialize()).await?;
        self.core.state_table().del(key).await?;

        audit_log!(record.with_outcome(AuditOutcome::Success).with_details(serde_json::json!({ "key": key })));
        Ok(())
    }

    async fn do_state_task(&mut self) -> Result<()> {
        if !self.is_ready() {
            return Ok(());
        }
        let Some(table) = self.executors.table(STATE_TABLE) else {
            return Ok(());
        };
        let entries = table.drain();

        for entry in entries {
            debug_log!(self.name(), "{}, key = {}, op = {}", self.name(), entry.key, entry.op);
            let Some(oid) = self.oid(&entry.key) else {
                continue;
            };
            let Some(present) = entry.get_field(fields::PRESENT) else {
                continue;
            };
            if self.present(&entry.key) == Some(present) {
                continue;
            }
            self.on_presence_change(&entry.key, oid, present).await?;
        }
        Ok(())
    }

    async fn on_presence_change(&mut self, key: &str, oid: OtaiObjectId, present: &str) -> Result<()> {
        match present {
            presence::PRESENT => {
                info_log!(self.name(), "setCounterIdList {}, key = {}", oid, key);
                if let Some(counters) = &self.caps.counters {
                    let create_only = self.objects.get(key).map(|o| o.create_only.clone()).unwrap_or_default();
                    counters.install(&self.counters, oid, &create_only).await?;
                }
                self.pre_clear.remove(key);
                self.ready_to_clear.remove(key);
            }
            presence::NOT_PRESENT => {
                info_log!(self.name(), "clearCounterIdList {}, key = {}", oid, key);
                if let Some(counters) = &self.caps.counters {
                    counters.on_absent(&self.counters, oid).await?;
                }
                self.pre_clear.insert(key.to_string());
            }
            other => warn_log!(self.name(), "Unknown presence {} of {}", other, key),
        }

        if let Some(hook) = &self.caps.presence {
            let auxiliary = self.objects.get(key).map(|o| o.auxiliary.as_slice()).unwrap_or_default();
            hook.propagate(self.core.state_db(), key, auxiliary, present).await?;
        }
        self.key2present.insert(key.to_string(), present.to_string());
        Ok(())
    }

    /// Purges keys that stayed NOT_PRESENT for a whole timer period.
    async fn do_purge_timer(&mut self) -> Result<()> {
        for key in mem::take(&mut self.ready_to_clear) {
            self.clear_counters_table(&key).await?;
            self.clear_state_table(&key).await?;
        }
        self.ready_to_clear = mem::take(&mut self.pre_clear);
        Ok(())
    }

    async fn clear_counters_table(&self, key: &str) -> DbResult<()> {
        let pattern = self
            .counters_db
            .row_name(counters_table(self.desc.object_type), &format!("{}*", key));
        let n = self.counters_db.del_pattern(&pattern).await?;
        info_log!(self.name(), "clear counter-table pattern={}, {} rows", pattern, n);
        Ok(())
    }

    async fn clear_state_table(&self, key: &str) -> DbResult<()> {
        let db = self.core.state_db();
        let pattern = db.row_name(state_table(self.desc.object_type), &format!("{}*", key));
        let n = db.del_pattern(&pattern).await?;
        info_log!(self.name(), "clear state-table pattern={}, {} rows", pattern, n);
        Ok(())
    }

    /// Handles one imperative request and sends the reply.
    async fn do_request(&mut self, request: NotificationMessage) -> DbResult<()> {
        let NotificationMessage { op, data: key, mut values } = request;
        debug_log!(self.name(), "{} request {} {}", self.name(), op, key);

        let op_ret = if !self.fsm.is_working() {
            self.desc.not_ready_reply()
        } else {
            match self.oid(&key) {
                None => {
                    error_log!(self.name(), "Failed to get oid, key={}", key);
                    reply::FAILED
                }
                Some(oid) => match op.as_str() {
                    "set" => self.core.request_set(&key, oid, &values),
                    "get" if self.desc.request_style == RequestStyle::Generic => self.core.request_get(oid, &mut values),
                    _ => {
                        error_log!(self.name(), "Unsupported operation {}", op);
                        reply::FAILED
                    }
                },
            }
        };

        self.reply.send(op_ret, &key, values).await?;
        Ok(())
    }

    async fn do_side_channel(&mut self, request: NotificationMessage) -> DbResult<()> {
        let Some(side) = &self.caps.side_channel else {
            return Ok(());
        };
        let ctx = SideChannelContext {
            api: self.core.api(),
            key2oid: &self.key2oid,
            appl_db: &self.appl_db,
        };
        side.handle(request, ctx).await
    }

    async fn run_table(&mut self, index: usize) -> Result<()> {
        match index {
            APPL_TABLE => self.do_config_task().await,
            _ => self.do_state_task().await,
        }
    }
}

#[async_trait]
impl Orch for ObjectOrch {
    fn name(&self) -> &str {
        self.desc.orch_name
    }

    async fn ready_executor(&self) -> Option<Executor> {
        self.executors.ready().await
    }

    async fn execute(&mut self, executor: Executor) -> OrchResult<()> {
        match executor {
            Executor::Table(index) => {
                let batch_size = self.batch_size;
                if let Some(table) = self.executors.table(index) {
                    let popped = table.pops(batch_size).await?;
                    debug_log!(self.desc.orch_name, "Popped {} entries from {}", popped, table.table_name());
                }
                self.run_table(index).await?;
            }
            Executor::Notification(index) => {
                if let Some(request) = self.executors.pop_notification(index) {
                    match index {
                        REQUEST_CHANNEL => self.do_request(request).await?,
                        SIDE_CHANNEL => self.do_side_channel(request).await?,
                        _ => {}
                    }
                }
            }
            Executor::Timer(index) => {
                self.executors.fire_timer(index);
                self.do_purge_timer().await?;
            }
        }
        Ok(())
    }

    async fn do_task(&mut self) -> OrchResult<()> {
        for index in 0..self.executors.tables.len() {
            self.run_table(index).await?;
        }
        Ok(())
    }

    fn has_pending_tasks(&self) -> bool {
        self.executors.has_pending()
    }

    fn dump_pending_tasks(&self) -> Vec<String> {
        self.executors.dump()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextOptions, Databases};
    use crate::flex_counter::CounterType;
    use crate::object::capability::StaticCounters;
    use crate::tables::FLEX_COUNTER_TABLE;
    use pretty_assertions::assert_eq;
    use sonic_otai::attrs::{linecard, port};
    use sonic_otai::{AttrValue, Attribute, HalCall, ObjectType, OtaiApi, VirtualOtai};

    static PORT: ObjectDescriptor = ObjectDescriptor::new(
        "PortOrch",
        ObjectType::Port,
        &[port::PORT_TYPE, port::PORT_ID, port::ADMIN_STATE, port::LOS_THRESHOLD],
    )
    .read_only(&[port::OPER_STATUS])
    .auxiliary(&["location", "name"])
    .with_presence();

    struct Fixture {
        hal: Arc<VirtualOtai>,
        ctx: SharedRuntimeContext,
        orch: ObjectOrch,
    }

    async fn fixture() -> Fixture {
        let hal = Arc::new(VirtualOtai::new());
        let ctx = SharedRuntimeContext::new(hal.clone(), Databases::in_memory(), ContextOptions::default())
            .await
            .unwrap();
        let linecard_oid = hal
            .create_object(
                ObjectType::Linecard,
                OtaiObjectId::NULL,
                &[Attribute::new(linecard::LINECARD_TYPE, AttrValue::Enum(0))],
            )
            .unwrap();
        ctx.progress.set_linecard_oid(linecard_oid);
        ctx.counters.init_counter_table(None);
        ctx.fsm.set(OrchState::Work);

        let caps = Capabilities::new().with_counters(StaticCounters(&[CounterType::PortStatus]));
        let orch = ObjectOrch::new(&ctx, &PORT, caps).await.unwrap();
        Fixture { hal, ctx, orch }
    }

    fn fv(f: &str, v: &str) -> FieldValue {
        (f.to_string(), v.to_string())
    }

    fn port_entry(i: u32) -> KeyOpFieldsValues {
        KeyOpFieldsValues::set(
            format!("PORT-1-{}", i),
            vec![
                fv("index", &i.to_string()),
                fv("port-type", "LINE_IN"),
                fv("port-id", &i.to_string()),
                fv("admin-state", "ENABLED"),
                fv("location", "slot-1"),
            ],
        )
    }

    fn sentinel(count: usize) -> KeyOpFieldsValues {
        KeyOpFieldsValues::set(CONFIG_DONE_KEY, vec![fv("count", &count.to_string())])
    }

    async fn push(f: &Fixture, entries: Vec<KeyOpFieldsValues>) {
        for entry in entries {
            f.ctx.dbs.appl.push_change("PORT", entry).await.unwrap();
        }
    }

    async fn run(f: &mut Fixture) {
        while let Some(executor) = f.orch.ready_executor().await {
            f.orch.execute(executor).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_bootstrap_reaches_done() {
        let mut f = fixture().await;
        push(&f, vec![sentinel(3), port_entry(1), port_entry(2), port_entry(3)]).await;
        run(&mut f).await;

        assert_eq!(f.orch.object_count(), 3);
        assert_eq!(f.orch.config_state(), ConfigState::Done);
        assert_eq!(f.ctx.progress.config_num(), 1);
        assert_eq!(f.hal.create_count(ObjectType::Port), 3);

        let oid = f.orch.oid("PORT-1-2").unwrap();
        let location = f.ctx.dbs.state.hget("PORT", "PORT-1-2", "location").await.unwrap();
        assert_eq!(location.as_deref(), Some("slot-1"));
        let name = f
            .ctx
            .dbs
            .counters
            .hget("COUNTERS_PORT_NAME_MAP", "", &oid.serialize())
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("PORT-1-2"));
        let row = f
            .ctx
            .dbs
            .flex_counter
            .hgetall(FLEX_COUNTER_TABLE, &format!("1S_STAT_STATUS|{}", oid.serialize()))
            .await
            .unwrap();
        assert_eq!(row, vec![fv("PORT_STATUS_ID_LIST", "")]);
    }

    #[tokio::test]
    async fn test_objects_wait_for_sentinel_and_work() {
        let mut f = fixture().await;
        f.ctx.fsm.set(OrchState::Ready);
        push(&f, vec![port_entry(1)]).await;
        run(&mut f).await;
        assert!(f.orch.has_pending_tasks());
        assert_eq!(f.hal.create_count(ObjectType::Port), 0);

        f.ctx.fsm.set(OrchState::Work);
        f.orch.do_task().await.unwrap();
        assert_eq!(f.orch.config_state(), ConfigState::Missing);
        assert_eq!(f.hal.create_count(ObjectType::Port), 0);

        push(&f, vec![sentinel(1)]).await;
        run(&mut f).await;
        assert_eq!(f.hal.create_count(ObjectType::Port), 1);
        assert_eq!(f.orch.config_state(), ConfigState::Done);
    }

    #[tokio::test]
    async fn test_update_deferred_until_done() {
        let mut f = fixture().await;
        push(&f, vec![sentinel(2), port_entry(1)]).await;
        run(&mut f).await;
        assert_eq!(f.orch.config_state(), ConfigState::Received);

        // Object 1 exists but the type is not done: the update waits.
        push(
            &f,
            vec![
                KeyOpFieldsValues::set("PORT-1-1", vec![fv("los-threshold", "-30.0")]),
                port_entry(2),
            ],
        )
        .await;
        f.orch.execute(Executor::Table(APPL_TABLE)).await.unwrap();
        assert_eq!(f.orch.config_state(), ConfigState::Done);
        assert_eq!(f.hal.set_count(ObjectType::Port, port::LOS_THRESHOLD), 0);
        assert!(f.orch.has_pending_tasks());

        f.orch.do_task().await.unwrap();
        assert_eq!(f.hal.set_count(ObjectType::Port, port::LOS_THRESHOLD), 1);
        assert!(!f.orch.has_pending_tasks());
    }

    #[tokio::test]
    async fn test_snapshot_accumulates_before_creation() {
        let mut f = fixture().await;
        push(
            &f,
            vec![
                port_entry(1),
                KeyOpFieldsValues::set("PORT-1-1", vec![fv("admin-state", "DISABLED")]),
            ],
        )
        .await;
        run(&mut f).await;
        push(&f, vec![sentinel(1)]).await;
        run(&mut f).await;

        let oid = f.orch.oid("PORT-1-1").unwrap();
        assert_eq!(f.hal.attr(oid, port::ADMIN_STATE), Some(AttrValue::Enum(1)));
    }

    #[tokio::test]
    async fn test_reconcile_removes_stale_keys() {
        let mut f = fixture().await;
        push(&f, vec![sentinel(3), port_entry(1), port_entry(2), port_entry(3)]).await;
        run(&mut f).await;
        let a = f.orch.oid("PORT-1-1").unwrap();
        let c = f.orch.oid("PORT-1-3").unwrap();
        f.hal.clear_calls();

        push(&f, vec![KeyOpFieldsValues::del("PORT-1-3")]).await;
        run(&mut f).await;

        assert_eq!(f.hal.removed(ObjectType::Port), vec![c]);
        assert_eq!(f.orch.oid("PORT-1-1"), Some(a));
        assert_eq!(f.orch.object_count(), 2);
        assert_eq!(f.hal.create_count(ObjectType::Port), 0);
        let name = f
            .ctx
            .dbs
            .counters
            .hget("COUNTERS_PORT_NAME_MAP", "", &c.serialize())
            .await
            .unwrap();
        assert_eq!(name, None);
    }

    #[tokio::test]
    async fn test_create_failure_retried() {
        let mut f = fixture().await;
        f.hal.fail_create(ObjectType::Port);
        push(&f, vec![sentinel(1), port_entry(1)]).await;
        run(&mut f).await;
        assert_eq!(f.orch.object_count(), 0);
        assert_eq!(f.orch.config_state(), ConfigState::Received);

        f.hal.clear_create_failure(ObjectType::Port);
        push(&f, vec![KeyOpFieldsValues::set("PORT-1-1", vec![fv("admin-state", "ENABLED")])]).await;
        run(&mut f).await;
        assert_eq!(f.orch.object_count(), 1);
        assert_eq!(f.orch.config_state(), ConfigState::Done);
    }

    #[tokio::test]
    async fn test_failed_create_retried_without_new_entries() {
        let mut f = fixture().await;
        f.hal.fail_create(ObjectType::Port);
        push(&f, vec![sentinel(1), port_entry(1)]).await;
        run(&mut f).await;
        f.orch.do_task().await.unwrap();
        assert_eq!(f.orch.object_count(), 0);
        assert_eq!(f.orch.config_state(), ConfigState::Received);
        assert_eq!(f.ctx.progress.config_num(), 0);

        f.hal.clear_create_failure(ObjectType::Port);
        f.orch.do_task().await.unwrap();
        assert_eq!(f.orch.object_count(), 1);
        assert_eq!(f.orch.config_state(), ConfigState::Done);
        assert_eq!(f.ctx.progress.config_num(), 1);
        assert_eq!(f.hal.create_count(ObjectType::Port), 1);

        f.orch.do_task().await.unwrap();
        assert_eq!(f.hal.create_count(ObjectType::Port), 1);
        assert_eq!(f.ctx.progress.config_num(), 1);
    }

    #[tokio::test]
    async fn test_update_in_completing_batch_deferred() {
        let mut f = fixture().await;
        f.hal.fail_create(ObjectType::Port);
        push(&f, vec![sentinel(2), port_entry(1)]).await;
        run(&mut f).await;
        assert_eq!(f.orch.object_count(), 0);
        f.hal.clear_create_failure(ObjectType::Port);

        // One pass creates both objects, completes the type and sees an
        // update for the first one.
        push(
            &f,
            vec![
                KeyOpFieldsValues::set("PORT-1-1", vec![fv("los-threshold", "-25.0")]),
                port_entry(2),
            ],
        )
        .await;
        f.orch.execute(Executor::Table(APPL_TABLE)).await.unwrap();
        assert_eq!(f.orch.object_count(), 2);
        assert_eq!(f.orch.config_state(), ConfigState::Done);
        assert_eq!(f.ctx.progress.config_num(), 1);
        assert_eq!(f.hal.set_count(ObjectType::Port, port::LOS_THRESHOLD), 0);
        assert!(f.orch.has_pending_tasks());

        f.orch.do_task().await.unwrap();
        assert_eq!(f.hal.set_count(ObjectType::Port, port::LOS_THRESHOLD), 1);
        assert!(!f.orch.has_pending_tasks());
    }

    #[tokio::test]
    async fn test_duplicate_sentinel_and_unknown_key() {
        let mut f = fixture().await;
        push(&f, vec![sentinel(1), port_entry(1)]).await;
        run(&mut f).await;
        push(
            &f,
            vec![sentinel(5), KeyOpFieldsValues::set("PORT-1-9", vec![fv("admin-state", "ENABLED")])],
        )
        .await;
        run(&mut f).await;

        assert_eq!(f.ctx.progress.config_num(), 1);
        assert_eq!(f.orch.object_count(), 1);
        assert!(!f.orch.has_pending_tasks());
    }

    #[tokio::test]
    async fn test_self_processed_name() {
        let mut f = fixture().await;
        push(&f, vec![sentinel(1), port_entry(1)]).await;
        run(&mut f).await;

        let mut result = NotificationConsumer::new(&f.ctx.dbs.state, "name-7").await.unwrap();
        push(
            &f,
            vec![KeyOpFieldsValues::set("PORT-1-1", vec![fv("name", "line-in"), fv("operation-id", "7")])],
        )
        .await;
        run(&mut f).await;

        let msg = result.recv_timeout(Duration::from_millis(100)).await.unwrap();
        assert_eq!(msg.op, "0");
        assert_eq!(msg.data, "Set PORT-1-1 name to line-in");
        let name = f.ctx.dbs.state.hget("PORT", "PORT-1-1", "name").await.unwrap();
        assert_eq!(name.as_deref(), Some("line-in"));
    }

    async fn set_present(f: &mut Fixture, key: &str, present: &str) {
        f.ctx
            .dbs
            .state
            .push_change("PORT", KeyOpFieldsValues::set(key, vec![fv("present", present)]))
            .await
            .unwrap();
        f.orch.execute(Executor::Table(STATE_TABLE)).await.unwrap();
    }

    #[tokio::test]
    async fn test_presence_debounce() {
        let mut f = fixture().await;
        push(&f, vec![sentinel(1), port_entry(1)]).await;
        run(&mut f).await;
        f.ctx.dbs.counters.hset("PORT", "PORT-1-1", &[fv("input-power", "-3.2")]).await.unwrap();

        set_present(&mut f, "PORT-1-1", "NOT_PRESENT").await;
        f.orch.execute(Executor::Timer(0)).await.unwrap();
        assert_eq!(f.orch.pending_purge().collect::<Vec<_>>(), vec!["PORT-1-1"]);

        // Back before the second tick: nothing is purged.
        set_present(&mut f, "PORT-1-1", "PRESENT").await;
        assert_eq!(f.orch.present("PORT-1-1"), Some("PRESENT"));
        assert_eq!(f.orch.pending_purge().count(), 0);
        f.orch.execute(Executor::Timer(0)).await.unwrap();
        f.orch.execute(Executor::Timer(0)).await.unwrap();
        assert_eq!(f.ctx.dbs.counters.hgetall("PORT", "PORT-1-1").await.unwrap().len(), 1);
        assert_eq!(f.hal.create_count(ObjectType::Port), 1);
    }

    #[tokio::test]
    async fn test_presence_repeat_ignored() {
        let mut f = fixture().await;
        push(&f, vec![sentinel(1), port_entry(1)]).await;
        run(&mut f).await;
        let oid = f.orch.oid("PORT-1-1").unwrap();
        let row = format!("1S_STAT_STATUS|{}", oid.serialize());

        set_present(&mut f, "PORT-1-1", "NOT_PRESENT").await;
        assert!(f.ctx.dbs.flex_counter.hgetall(FLEX_COUNTER_TABLE, &row).await.unwrap().is_empty());
        set_present(&mut f, "PORT-1-1", "PRESENT").await;
        assert!(!f.ctx.dbs.flex_counter.hgetall(FLEX_COUNTER_TABLE, &row).await.unwrap().is_empty());
        set_present(&mut f, "PORT-1-1", "PRESENT").await;
        assert_eq!(f.orch.present("PORT-1-1"), Some("PRESENT"));
    }

    #[tokio::test]
    async fn test_presence_purge_after_one_period() {
        let mut f = fixture().await;
        push(&f, vec![sentinel(1), port_entry(1)]).await;
        run(&mut f).await;
        f.ctx.dbs.counters.hset("PORT", "PORT-1-1", &[fv("input-power", "-3.2")]).await.unwrap();

        set_present(&mut f, "PORT-1-1", "NOT_PRESENT").await;
        f.orch.execute(Executor::Timer(0)).await.unwrap();
        assert_eq!(f.ctx.dbs.counters.hgetall("PORT", "PORT-1-1").await.unwrap().len(), 1);
        f.orch.execute(Executor::Timer(0)).await.unwrap();
        assert!(f.ctx.dbs.counters.hgetall("PORT", "PORT-1-1").await.unwrap().is_empty());
        assert!(f.ctx.dbs.state.hgetall("PORT", "PORT-1-1").await.unwrap().is_empty());
    }

    async fn request(f: &mut Fixture, op: &str, key: &str, values: Vec<FieldValue>) -> NotificationMessage {
        let mut replies = NotificationConsumer::new(&f.ctx.dbs.appl, "PORT_REPLY").await.unwrap();
        f.ctx
            .dbs
            .appl
            .publish("PORT_NOTIFICATION", &NotificationMessage::new(op, key, values))
            .await
            .unwrap();
        run(f).await;
        replies.recv_timeout(Duration::from_millis(100)).await.unwrap()
    }

    #[tokio::test]
    async fn test_imperative_get() {
        let mut f = fixture().await;
        push(&f, vec![sentinel(1), port_entry(1)]).await;
        run(&mut f).await;

        let reply = request(&mut f, "get", "PORT-1-1", vec![fv("oper-status", "")]).await;
        assert_eq!(reply.op, "SUCCESS");
        assert_eq!(reply.values, vec![fv("oper-status", "UNKNOWN")]);

        let reply = request(&mut f, "get", "PORT-1-1", vec![fv("admin-state", "")]).await;
        assert_eq!(reply.op, "FAILED");
        let reply = request(&mut f, "get", "PORT-1-9", vec![fv("oper-status", "")]).await;
        assert_eq!(reply.op, "FAILED");
    }

    #[tokio::test]
    async fn test_imperative_rejects_recoverable_and_not_working() {
        let mut f = fixture().await;
        push(&f, vec![sentinel(1), port_entry(1)]).await;
        run(&mut f).await;
        f.hal.clear_calls();

        let reply = request(&mut f, "set", "PORT-1-1", vec![fv("admin-state", "DISABLED")]).await;
        assert_eq!(reply.op, "FAILED");
        assert!(!f.hal.calls().iter().any(|c| matches!(c, HalCall::Set { .. })));

        f.ctx.fsm.set(OrchState::Pause);
        let reply = request(&mut f, "get", "PORT-1-1", vec![fv("oper-status", "")]).await;
        assert_eq!(reply.op, "FAILED");
        assert_eq!(reply.data, "PORT-1-1");
    }
}
