//! Root object orchestrator.
//!
//! Creates the linecard once the FSM is READY, moves the FSM to WORK, owns
//! board-mode application and purges counter and state rows when the
//! linecard pauses.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sonic_orch_common::{
    ConsumerConfig, DbConnector, DbResult, Executor, ExecutorSet, NotificationConsumer,
    NotificationMessage, NotificationProducer, Operation, Orch, OrchResult, SelectableTimer, Table, TableConsumer,
};
use sonic_otai::attrs::linecard;
use sonic_otai::{AttrValue, Attribute, NotificationHandler, ObjectApi, ObjectType, OperStatus, OtaiObjectId};

use super::ConfigProgress;
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::context::SharedRuntimeContext;
use crate::flex_counter::{CounterType, FlexCounterRegistry};
use crate::fsm::{OrchFsm, OrchState};
use crate::object::{AttrClassification, ObjectCore, ObjectOrchError, Result};
use crate::tables::{
    appl_table, counters_table, fields, name_map_table, notification_channel, reply, reply_channel, state_table,
};
use crate::{audit_log, debug_log, error_log, info_log, warn_log};

const NAME: &str = "LinecardOrch";

const CONFIG_ATTRS: &[sonic_otai::AttrId] = &[
    linecard::LINECARD_TYPE,
    linecard::BOARD_MODE,
    linecard::RESET,
    linecard::HOSTNAME,
    linecard::BAUD_RATE,
    linecard::COLLECT_LINECARD_LOG,
    linecard::HOST_IP,
    linecard::USER_NAME,
    linecard::USER_PASSWORD,
    linecard::UPGRADE_FILE_NAME,
    linecard::UPGRADE_FILE_PATH,
    linecard::UPGRADE_DOWNLOAD,
    linecard::UPGRADE_AUTO,
    linecard::UPGRADE_COMMIT,
    linecard::UPGRADE_COMMIT_PAUSE,
    linecard::UPGRADE_COMMIT_RESUME,
    linecard::UPGRADE_ROLLBACK,
    linecard::UPGRADE_REBOOT,
    linecard::LED_MODE,
    linecard::LED_FLASH_INTERVAL,
];

const READ_ONLY_ATTRS: &[sonic_otai::AttrId] = &[linecard::UPGRADE_STATE];

const COUNTER_TYPES: &[CounterType] = &[
    CounterType::LinecardGauge,
    CounterType::LinecardCounter,
    CounterType::LinecardStatus,
];

/// COUNTERS_DB tables emptied when the linecard pauses.
const PAUSE_COUNTER_TABLES: &[ObjectType] = &[
    ObjectType::Linecard,
    ObjectType::Port,
    ObjectType::Transceiver,
    ObjectType::LogicalChannel,
    ObjectType::Otn,
    ObjectType::Ethernet,
    ObjectType::PhysicalChannel,
    ObjectType::Och,
    ObjectType::Lldp,
    ObjectType::Assignment,
    ObjectType::Interface,
    ObjectType::Oa,
    ObjectType::Osc,
    ObjectType::Aps,
    ObjectType::ApsPort,
    ObjectType::Attenuator,
];

/// Linecard STATE fields kept across a pause.
const PRESERVED_STATE_FIELDS: &[&str] = &[
    "oper-status",
    "power-admin-state",
    "slot-status",
    "empty",
    "part-no",
    "serial-no",
    "hardware-version",
    "mfg-date",
    "removable",
];

const APPL_TABLE: usize = 0;
const STATE_TABLE: usize = 1;

#[derive(Debug, Clone)]
pub struct LinecardOrchConfig {
    /// Period of the FSM watch timer.
    pub timer_interval: Duration,
    /// Delay between board-mode reads while waiting for the change.
    pub board_mode_poll_interval: Duration,
    /// Reads before giving up on a board-mode change.
    pub board_mode_poll_limit: u32,
}

impl Default for LinecardOrchConfig {
    fn default() -> Self {
        Self {
            timer_interval: Duration::from_secs(1),
            board_mode_poll_interval: Duration::from_secs(1),
            // A P230C needs up to ten minutes to change its board mode.
            board_mode_poll_limit: 10 * 60,
        }
    }
}

/// State-store key of the linecard in `slot_id`.
pub fn linecard_key(slot_id: u32) -> String {
    format!("LINECARD-1-{}", slot_id)
}

pub struct LinecardOrch {
    core: ObjectCore,
    config: LinecardOrchConfig,
    fsm: Arc<OrchFsm>,
    counters: Arc<FlexCounterRegistry>,
    progress: Arc<ConfigProgress>,
    manifest: Option<PathBuf>,
    slot_id: u32,
    counters_db: Arc<dyn DbConnector>,
    name_map: Table,
    executors: ExecutorSet,
    reply: NotificationProducer,
    batch_size: usize,
    linecard: Option<(String, OtaiObjectId)>,
    last_state: OrchState,
}

impl LinecardOrch {
    /// Builds the orch; an ACTIVE linecard recorded in STATE_DB moves the
    /// FSM straight to READY.
    pub async fn new(ctx: &SharedRuntimeContext, config: LinecardOrchConfig) -> DbResult<Self> {
        let api = ctx.api(ObjectType::Linecard);
        let attrs = AttrClassification::build(NAME, &api, CONFIG_ATTRS, READ_ONLY_ATTRS);
        let core = ObjectCore::new(NAME, api, attrs, Arc::clone(&ctx.fsm), Arc::clone(&ctx.dbs.state), &[]);

        let mut executors = ExecutorSet::new();
        executors.add_table(TableConsumer::new(
            Arc::clone(&ctx.dbs.appl),
            ConsumerConfig::new(appl_table(ObjectType::Linecard)).with_batch_size(ctx.batch_size),
        ));
        executors.add_table(TableConsumer::new(
            Arc::clone(&ctx.dbs.state),
            ConsumerConfig::new(state_table(ObjectType::Linecard)).with_batch_size(ctx.batch_size),
        ));
        executors.add_notification(
            NotificationConsumer::new(&ctx.dbs.appl, &notification_channel(ObjectType::Linecard)).await?,
        );
        executors.add_timer(SelectableTimer::new(config.timer_interval));

        let oper_status = core
            .state_table()
            .hget(&linecard_key(ctx.slot_id), fields::OPER_STATUS)
            .await?;
        if oper_status.as_deref() == Some(OperStatus::Active.as_str()) {
            info_log!(NAME, "Orchagent go into ready state");
            ctx.fsm.set(OrchState::Ready);
        }

        Ok(Self {
            core,
            config,
            fsm: Arc::clone(&ctx.fsm),
            counters: Arc::clone(&ctx.counters),
            progress: Arc::clone(&ctx.progress),
            manifest: ctx.flex_counter_json.clone(),
            slot_id: ctx.slot_id,
            counters_db: Arc::clone(&ctx.dbs.counters),
            name_map: Table::new(Arc::clone(&ctx.dbs.counters), name_map_table(ObjectType::Linecard)),
            executors,
            reply: NotificationProducer::new(Arc::clone(&ctx.dbs.appl), reply_channel(ObjectType::Linecard)),
            batch_size: ctx.batch_size,
            linecard: None,
            last_state: OrchState::NotReady,
        })
    }

    pub fn linecard_oid(&self) -> Option<OtaiObjectId> {
        self.linecard.as_ref().map(|(_, oid)| *oid)
    }

    fn api(&self) -> &ObjectApi {
        self.core.api()
    }

    async fn do_appl_task(&mut self) -> Result<()> {
        if self.fsm.get() == OrchState::NotReady {
            return Ok(());
        }
        let Some(table) = self.executors.table(APPL_TABLE) else {
            return Ok(());
        };

        for entry in table.drain() {
            if entry.op != Operation::Set {
                warn_log!(NAME, "Unsupported operation {}", entry.op);
                continue;
            }

            let mut operation_id = "";
            let mut create_attrs = BTreeMap::new();
            let mut set_attrs = BTreeMap::new();
            let attrs = self.core.attrs();
            for (field, value) in &entry.fvs {
                if field == fields::OPERATION_ID {
                    operation_id = value.as_str();
                } else if field == fields::OBJECT_COUNT {
                    match value.parse::<usize>() {
                        Ok(total) => self.progress.set_total(total),
                        Err(_) => error_log!(NAME, "Invalid config total number, num={}", value),
                    }
                } else if field == "board-mode" {
                    create_attrs.insert(field.clone(), value.clone());
                } else if attrs.create_and_set_id(field).is_some() {
                    set_attrs.insert(field.clone(), value.clone());
                }
                if attrs.is_mandatory(field) {
                    create_attrs.insert(field.clone(), value.clone());
                }
            }

            if self.fsm.get() == OrchState::Ready && self.linecard.is_none() {
                self.create_linecard(&entry.key, &create_attrs).await?;
            } else if create_attrs.contains_key("board-mode") {
                set_attrs.insert("board-mode".to_string(), create_attrs["board-mode"].clone());
            }
            if self.fsm.is_working() && !set_attrs.is_empty() {
                let oid = self.linecard_oid();
                if !self.core.set_attrs(&entry.key, oid, &set_attrs, operation_id).await? {
                    error_log!(NAME, "Failed to set linecard attributes, {}", entry.key);
                }
            }
        }
        Ok(())
    }

    async fn create_linecard(&mut self, key: &str, create_attrs: &BTreeMap<String, String>) -> Result<()> {
        let mut attrs = Vec::new();
        let mut board_mode = None;
        for (field, value) in create_attrs {
            let attr = match self.core.translate(field, value) {
                Ok(attr) => attr,
                Err(e) => {
                    error_log!(NAME, "Failed to translate linecard attr, {}: {}", field, e);
                    continue;
                }
            };
            if attr.id == linecard::BOARD_MODE {
                board_mode = Some(attr.value);
                continue;
            }
            attrs.push(attr);
        }

        self.counters.init_counter_table(self.manifest.as_deref());

        let on_alarm: sonic_otai::value::LinecardAlarmFn = Arc::new(|oid, alarm| {
            info_log!(NAME, "Alarm notify, linecard {}: {}", oid, alarm);
        });
        let fsm = Arc::clone(&self.fsm);
        let on_state_change: sonic_otai::value::LinecardStateChangeFn =
            Arc::new(move |_, status| on_linecard_state_change(&fsm, status));
        attrs.push(Attribute::new(
            linecard::LINECARD_ALARM_NOTIFY,
            AttrValue::Notification(NotificationHandler::LinecardAlarm(on_alarm)),
        ));
        attrs.push(Attribute::new(
            linecard::LINECARD_STATE_CHANGE_NOTIFY,
            AttrValue::Notification(NotificationHandler::LinecardStateChange(on_state_change)),
        ));
        attrs.push(Attribute::new(linecard::COLLECT_LINECARD_ALARM, AttrValue::Bool(true)));

        let record = AuditRecord::new(AuditCategory::ResourceCreate, NAME, "create_linecard")
            .with_object_type(ObjectType::Linecard.short_name());
        let oid = match self.api().create(OtaiObjectId::NULL, &attrs) {
            Ok(oid) => oid,
            Err(e) => {
                error_log!(NAME, "Failed to create a linecard, rv:{}", e);
                audit_log!(record.with_object_id(key).with_error(e.to_string()));
                return Err(ObjectOrchError::fatal(NAME, format!("Failed to create a linecard: {}", e)));
            }
        };
        info_log!(NAME, "Create a linecard, id:{}", oid);
        self.linecard = Some((key.to_string(), oid));

        let start = Attribute::new(linecard::START_PRE_CONFIGURATION, AttrValue::Bool(true));
        if let Err(e) = self.api().set(oid, &start) {
            error_log!(NAME, "Failed to notify start pre-config, {}", e);
        }

        if let Some(mode) = board_mode {
            self.apply_board_mode(oid, mode).await;
        }

        self.name_map.hset("", &oid.serialize(), key).await?;
        for &counter_type in COUNTER_TYPES {
            self.counters.install(oid, counter_type).await?;
        }

        audit_log!(record
            .with_outcome(AuditOutcome::Success)
            .with_object_id(oid.serialize())
            .with_details(serde_json::json!({ "key": key, "attributes": attrs.len() })));

        self.progress.set_linecard_oid(oid);
        self.fsm.set(OrchState::Work);
        Ok(())
    }

    fn board_mode_of(&self, oid: OtaiObjectId) -> Option<AttrValue> {
        self.api()
            .get(oid, &[linecard::BOARD_MODE])
            .ok()
            .and_then(|attrs| attrs.into_iter().next())
            .map(|attr| attr.value)
    }

    /// Sets the board mode and waits for the hardware to report it.
    async fn apply_board_mode(&self, oid: OtaiObjectId, mode: AttrValue) {
        if self.board_mode_of(oid).as_ref() == Some(&mode) {
            debug_log!(NAME, "Linecard and maincard have a same board-mode, {:?}", mode);
            return;
        }

        info_log!(NAME, "Begin to set board-mode {:?}", mode);
        if let Err(e) = self.api().set(oid, &Attribute::new(linecard::BOARD_MODE, mode.clone())) {
            error_log!(NAME, "Failed to set board-mode status={}, mode={:?}", e, mode);
            return;
        }

        for _ in 0..self.config.board_mode_poll_limit {
            tokio::time::sleep(self.config.board_mode_poll_interval).await;
            let current = self.board_mode_of(oid);
            debug_log!(NAME, "board-mode = {:?}", current);
            if current.as_ref() == Some(&mode) {
                break;
            }
        }
        info_log!(NAME, "The end of setting board-mode");
    }

    fn do_state_task(&mut self) {
        let not_ready = self.fsm.get() == OrchState::NotReady;
        let Some(table) = self.executors.table(STATE_TABLE) else {
            return;
        };

        for entry in table.drain() {
            if !not_ready {
                continue;
            }
            match entry.get_field(fields::OPER_STATUS) {
                Some(status) if status == OperStatus::Active.as_str() => {
                    info_log!(NAME, "Linecard is active.");
                    self.fsm.set(OrchState::Ready);
                }
                Some(_) => info_log!(NAME, "Linecard is inactive."),
                None => {}
            }
        }
    }

    async fn do_timer(&mut self) -> DbResult<()> {
        let current = self.fsm.get();
        if self.last_state != current && current == OrchState::Pause {
            self.clear_linecard_data().await?;
        }
        self.last_state = current;
        Ok(())
    }

    async fn clear_linecard_data(&self) -> DbResult<()> {
        for &object_type in PAUSE_COUNTER_TABLES {
            let pattern = self.counters_db.row_name(counters_table(object_type), "*");
            let n = self.counters_db.del_pattern(&pattern).await?;
            info_log!(NAME, "clear counter-table {}, {} rows", pattern, n);
        }

        let state_db = self.core.state_db();
        for &object_type in PAUSE_COUNTER_TABLES.iter().filter(|t| **t != ObjectType::Linecard) {
            let pattern = state_db.row_name(state_table(object_type), "*");
            let n = state_db.del_pattern(&pattern).await?;
            info_log!(NAME, "clear state-table {}, {} rows", pattern, n);
        }

        let key = linecard_key(self.slot_id);
        let table = self.core.state_table();
        for (field, _) in table.get(&key).await?.unwrap_or_default() {
            if PRESERVED_STATE_FIELDS.contains(&field.as_str()) {
                continue;
            }
            info_log!(NAME, "clear state-table {} {}", key, field);
            table.hdel(&key, &field).await?;
        }

        let record = AuditRecord::new(AuditCategory::SystemLifecycle, NAME, "clear_linecard_data")
            .with_outcome(AuditOutcome::Success)
            .with_object_id(key);
        audit_log!(record);
        Ok(())
    }

    async fn do_request(&mut self, request: NotificationMessage) -> DbResult<()> {
        let NotificationMessage { op, data: key, mut values } = request;

        let op_ret = match self.linecard.as_ref().filter(|(k, _)| *k == key) {
            _ if !self.fsm.is_working() => reply::FAILED,
            None => {
                error_log!(NAME, "Failed to get oid, key={}", key);
                reply::FAILED
            }
            Some(&(_, oid)) => match op.as_str() {
                "set" => self.core.request_set(&key, oid, &values),
                "get" => self.core.request_get(oid, &mut values),
                _ => {
                    error_log!(NAME, "Unsupported operation {}", op);
                    reply::FAILED
                }
            },
        };

        self.reply.send(op_ret, &key, values).await?;
        Ok(())
    }
}

/// Maps HAL operational status changes onto the FSM; may run on any thread.
fn on_linecard_state_change(fsm: &OrchFsm, status: OperStatus) {
    info_log!(NAME, "linecard state change oper_status={}", status.as_str());
    match status {
        OperStatus::Active => {
            fsm.set(OrchState::Work);
            super::on_linecard_active();
        }
        OperStatus::Inactive => fsm.set(OrchState::Pause),
        OperStatus::Unknown => {}
    }
}

#[async_trait]
impl Orch for LinecardOrch {
    fn name(&self) -> &str {
        NAME
    }

    async fn ready_executor(&self) -> Option<Executor> {
        self.executors.ready().await
    }

    async fn execute(&mut self, executor: Executor) -> OrchResult<()> {
        match executor {
            Executor::Table(index) => {
                let batch_size = self.batch_size;
                if let Some(table) = self.executors.table(index) {
                    table.pops(batch_size).await?;
                }
                match index {
                    APPL_TABLE => self.do_appl_task().await?,
                    _ => self.do_state_task(),
                }
            }
            Executor::Notification(index) => {
                if let Some(request) = self.executors.pop_notification(index) {
                    self.do_request(request).await?;
                }
            }
            Executor::Timer(index) => {
                self.executors.fire_timer(index);
                self.do_timer().await?;
            }
        }
        Ok(())
    }

    async fn do_task(&mut self) -> OrchResult<()> {
        self.do_appl_task().await?;
        self.do_state_task();
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
    use crate::tables::FLEX_COUNTER_TABLE;
    use pretty_assertions::assert_eq;
    use sonic_orch_common::{FieldValue, KeyOpFieldsValues};
    use sonic_otai::{HalCall, VirtualOtai};

    fn fv(f: &str, v: &str) -> FieldValue {
        (f.to_string(), v.to_string())
    }

    fn fast() -> LinecardOrchConfig {
        LinecardOrchConfig {
            board_mode_poll_interval: Duration::ZERO,
            ..Default::default()
        }
    }

    async fn setup(hal: VirtualOtai) -> (Arc<VirtualOtai>, SharedRuntimeContext, LinecardOrch) {
        let hal = Arc::new(hal);
        let ctx = SharedRuntimeContext::new(hal.clone(), Databases::in_memory(), ContextOptions::default())
            .await
            .unwrap();
        let orch = LinecardOrch::new(&ctx, fast()).await.unwrap();
        (hal, ctx, orch)
    }

    async fn push_linecard(ctx: &SharedRuntimeContext, fvs: Vec<FieldValue>) {
        ctx.dbs
            .appl
            .push_change("LINECARD", KeyOpFieldsValues::set("LINECARD-1-0", fvs))
            .await
            .unwrap();
    }

    async fn run(orch: &mut LinecardOrch) -> OrchResult<()> {
        while let Some(executor) = orch.ready_executor().await {
            if matches!(executor, Executor::Timer(_)) {
                break;
            }
            orch.execute(executor).await?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_create_with_matching_board_mode() {
        let hal = VirtualOtai::new().with_default(ObjectType::Linecard, linecard::BOARD_MODE, AttrValue::Enum(1));
        let (hal, ctx, mut orch) = setup(hal).await;
        ctx.fsm.set(OrchState::Ready);

        push_linecard(
            &ctx,
            vec![fv("linecard-type", "P230C"), fv("board-mode", "L2_400G_CA_100GE")],
        )
        .await;
        run(&mut orch).await.unwrap();

        let oid = orch.linecard_oid().unwrap();
        assert_eq!(ctx.fsm.get(), OrchState::Work);
        assert_eq!(ctx.progress.linecard_oid(), oid);
        assert!(ctx.counters.is_initialized());
        assert_eq!(hal.get_count(ObjectType::Linecard, linecard::BOARD_MODE), 1);
        assert_eq!(hal.set_count(ObjectType::Linecard, linecard::BOARD_MODE), 0);
        assert_eq!(hal.set_count(ObjectType::Linecard, linecard::START_PRE_CONFIGURATION), 1);
        assert_eq!(hal.attr(oid, linecard::COLLECT_LINECARD_ALARM), Some(AttrValue::Bool(true)));

        let create = hal
            .calls()
            .into_iter()
            .find_map(|c| match c {
                HalCall::Create { attrs, .. } => Some(attrs),
                _ => None,
            })
            .unwrap();
        assert!(!create.iter().any(|a| a.id == linecard::BOARD_MODE));

        let name = ctx
            .dbs
            .counters
            .hget("COUNTERS_LINECARD_NAME_MAP", "", &oid.serialize())
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("LINECARD-1-0"));
        let keys = ctx.dbs.flex_counter.keys(FLEX_COUNTER_TABLE).await.unwrap();
        assert_eq!(keys.len(), 3);
    }

    #[tokio::test]
    async fn test_board_mode_polled_until_applied() {
        let (hal, ctx, mut orch) = setup(VirtualOtai::new()).await;
        ctx.fsm.set(OrchState::Ready);
        push_linecard(
            &ctx,
            vec![fv("linecard-type", "P230C"), fv("board-mode", "L1_200G_CA_100GE")],
        )
        .await;
        run(&mut orch).await.unwrap();

        let oid = orch.linecard_oid().unwrap();
        assert_eq!(hal.set_count(ObjectType::Linecard, linecard::BOARD_MODE), 1);
        assert_eq!(hal.get_count(ObjectType::Linecard, linecard::BOARD_MODE), 2);
        assert_eq!(hal.attr(oid, linecard::BOARD_MODE), Some(AttrValue::Enum(2)));
    }

    #[tokio::test]
    async fn test_ignored_while_not_ready() {
        let (hal, ctx, mut orch) = setup(VirtualOtai::new()).await;
        push_linecard(&ctx, vec![fv("linecard-type", "P230C")]).await;
        run(&mut orch).await.unwrap();
        assert_eq!(hal.create_count(ObjectType::Linecard), 0);
        assert!(orch.has_pending_tasks());

        ctx.dbs
            .state
            .push_change("LINECARD", KeyOpFieldsValues::set("LINECARD-1-0", vec![fv("oper-status", "ACTIVE")]))
            .await
            .unwrap();
        run(&mut orch).await.unwrap();
        assert_eq!(ctx.fsm.get(), OrchState::Ready);

        orch.do_task().await.unwrap();
        assert_eq!(hal.create_count(ObjectType::Linecard), 1);
        assert_eq!(ctx.fsm.get(), OrchState::Work);
    }

    #[tokio::test]
    async fn test_ready_from_recorded_state() {
        let hal = Arc::new(VirtualOtai::new());
        let ctx = SharedRuntimeContext::new(hal, Databases::in_memory(), ContextOptions::default())
            .await
            .unwrap();
        ctx.dbs
            .state
            .hset("LINECARD", "LINECARD-1-0", &[fv("oper-status", "ACTIVE")])
            .await
            .unwrap();
        LinecardOrch::new(&ctx, fast()).await.unwrap();
        assert_eq!(ctx.fsm.get(), OrchState::Ready);
    }

    #[tokio::test]
    async fn test_create_failure_is_fatal() {
        let hal = VirtualOtai::new();
        hal.fail_create(ObjectType::Linecard);
        let (_hal, ctx, mut orch) = setup(hal).await;
        ctx.fsm.set(OrchState::Ready);
        push_linecard(&ctx, vec![fv("linecard-type", "P230C")]).await;

        let err = run(&mut orch).await.unwrap_err();
        assert!(matches!(err, sonic_orch_common::OrchError::Fatal { .. }));
    }

    #[tokio::test]
    async fn test_state_change_callback_drives_fsm() {
        let (hal, ctx, mut orch) = setup(VirtualOtai::new()).await;
        ctx.fsm.set(OrchState::Ready);
        push_linecard(&ctx, vec![fv("linecard-type", "P230C")]).await;
        run(&mut orch).await.unwrap();

        hal.emit_linecard_state_change(OperStatus::Inactive);
        assert_eq!(ctx.fsm.get(), OrchState::Pause);
        hal.emit_linecard_state_change(OperStatus::Active);
        assert_eq!(ctx.fsm.get(), OrchState::Work);
    }

    #[tokio::test]
    async fn test_object_count_ends_pre_configuration() {
        let (hal, ctx, mut orch) = setup(VirtualOtai::new()).await;
        ctx.fsm.set(OrchState::Ready);
        push_linecard(&ctx, vec![fv("linecard-type", "P230C"), fv("object-count", "2")]).await;
        run(&mut orch).await.unwrap();
        assert_eq!(ctx.progress.total(), Some(2));

        ctx.progress.inc_config_num();
        assert_eq!(hal.set_count(ObjectType::Linecard, linecard::STOP_PRE_CONFIGURATION), 0);
        ctx.progress.inc_config_num();
        assert_eq!(hal.set_count(ObjectType::Linecard, linecard::STOP_PRE_CONFIGURATION), 1);
    }

    #[tokio::test]
    async fn test_update_after_work() {
        let (hal, ctx, mut orch) = setup(VirtualOtai::new()).await;
        ctx.fsm.set(OrchState::Ready);
        push_linecard(&ctx, vec![fv("linecard-type", "P230C"), fv("hostname", "olt-1")]).await;
        run(&mut orch).await.unwrap();
        let oid = orch.linecard_oid().unwrap();
        assert_eq!(hal.attr(oid, linecard::HOSTNAME), Some(AttrValue::Chardata("olt-1".into())));

        // Irrecoverable fields never travel the declarative path.
        push_linecard(&ctx, vec![fv("reset", "true"), fv("led-mode", "FLASH")]).await;
        run(&mut orch).await.unwrap();
        assert_eq!(hal.set_count(ObjectType::Linecard, linecard::RESET), 0);
        assert_eq!(hal.attr(oid, linecard::LED_MODE), Some(AttrValue::Enum(3)));
    }

    #[tokio::test]
    async fn test_pause_purges_counters_and_state() {
        let (_hal, ctx, mut orch) = setup(VirtualOtai::new()).await;
        ctx.fsm.set(OrchState::Ready);
        push_linecard(&ctx, vec![fv("linecard-type", "P230C")]).await;
        run(&mut orch).await.unwrap();

        ctx.dbs.counters.hset("PORT", "PORT-1-1-C1", &[fv("input-power", "1.0")]).await.unwrap();
        ctx.dbs.counters.hset("LINECARD", "LINECARD-1-0", &[fv("temperature", "40")]).await.unwrap();
        ctx.dbs.state.hset("PORT", "PORT-1-1-C1", &[fv("location", "slot-1")]).await.unwrap();
        ctx.dbs
            .state
            .hset(
                "LINECARD",
                "LINECARD-1-0",
                &[fv("oper-status", "INACTIVE"), fv("serial-no", "SN1"), fv("software-version", "1.2")],
            )
            .await
            .unwrap();

        orch.execute(Executor::Timer(0)).await.unwrap();
        assert!(!ctx.dbs.counters.hgetall("PORT", "PORT-1-1-C1").await.unwrap().is_empty());

        ctx.fsm.set(OrchState::Pause);
        orch.execute(Executor::Timer(0)).await.unwrap();

        assert!(ctx.dbs.counters.hgetall("PORT", "PORT-1-1-C1").await.unwrap().is_empty());
        assert!(ctx.dbs.counters.hgetall("LINECARD", "LINECARD-1-0").await.unwrap().is_empty());
        assert!(ctx.dbs.state.hgetall("PORT", "PORT-1-1-C1").await.unwrap().is_empty());
        let row = ctx.dbs.state.hgetall("LINECARD", "LINECARD-1-0").await.unwrap();
        assert_eq!(row, vec![fv("oper-status", "INACTIVE"), fv("serial-no", "SN1")]);
    }

    #[tokio::test]
    async fn test_imperative_get_upgrade_state() {
        let (_hal, ctx, mut orch) = setup(VirtualOtai::new()).await;
        ctx.fsm.set(OrchState::Ready);
        push_linecard(&ctx, vec![fv("linecard-type", "P230C")]).await;
        run(&mut orch).await.unwrap();

        let mut replies = NotificationConsumer::new(&ctx.dbs.appl, "LINECARD_REPLY").await.unwrap();
        ctx.dbs
            .appl
            .publish(
                "LINECARD_NOTIFICATION",
                &NotificationMessage::new("get", "LINECARD-1-0", vec![fv("upgrade-state", "")]),
            )
            .await
            .unwrap();
        run(&mut orch).await.unwrap();

        let reply = replies.recv_timeout(Duration::from_millis(100)).await.unwrap();
        assert_eq!(reply.op, "SUCCESS");
        assert_eq!(reply.values, vec![fv("upgrade-state", "IDLE")]);
    }
}
