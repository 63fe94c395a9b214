//! FlexCounterOrch implementation.
//!
//! Applies live reconfiguration of the three counter groups from CONFIG_DB.

use std::sync::Arc;

use async_trait::async_trait;
use sonic_orch_common::{
    ConsumerConfig, Executor, ExecutorSet, FieldValue, Operation, Orch, OrchResult, TableConsumer,
};

use super::group::CounterGroup;
use super::registry::FlexCounterRegistry;
use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::context::SharedRuntimeContext;
use crate::fsm::{OrchFsm, OrchState};
use crate::tables::{CFG_FLEX_COUNTER_GROUP_TABLE, CFG_FLEX_COUNTER_TABLE};
use crate::{audit_log, debug_log, info_log, warn_log};

/// Field names of group rows.
pub mod fields {
    pub const STATS_MODE: &str = "STATS_MODE";
    pub const POLL_INTERVAL: &str = "POLL_INTERVAL";
    pub const STATUS: &str = "FLEX_COUNTER_STATUS";
    pub const STATUS_ENABLE: &str = "enable";
    pub const STATUS_DISABLE: &str = "disable";
}

/// Error type for flex counter operations.
#[derive(Debug, thiserror::Error)]
pub enum FlexCounterError {
    #[error("Invalid poll interval: {0}")]
    InvalidPollInterval(String),

    #[error("Malformed counter manifest: {0}")]
    Manifest(String),
}

/// Result type for flex counter operations.
pub type Result<T> = std::result::Result<T, FlexCounterError>;

/// Configuration for the counter groups.
#[derive(Debug, Clone)]
pub struct FlexCounterOrchConfig {
    /// Interval every group starts with.
    pub default_poll_interval_ms: u32,
}

impl Default for FlexCounterOrchConfig {
    fn default() -> Self {
        Self {
            default_poll_interval_ms: 1000,
        }
    }
}

const GROUP_TABLE: usize = 0;
const COUNTER_TABLE: usize = 1;

/// Routes CONFIG_DB group changes to the registry's managers.
pub struct FlexCounterOrch {
    fsm: Arc<OrchFsm>,
    registry: Arc<FlexCounterRegistry>,
    executors: ExecutorSet,
    batch_size: usize,
}

impl FlexCounterOrch {
    pub fn new(ctx: &SharedRuntimeContext) -> Self {
        let mut executors = ExecutorSet::new();
        for table in [CFG_FLEX_COUNTER_GROUP_TABLE, CFG_FLEX_COUNTER_TABLE] {
            executors.add_table(TableConsumer::new(
                Arc::clone(&ctx.dbs.config),
                ConsumerConfig::new(table).with_batch_size(ctx.batch_size),
            ));
        }
        Self {
            fsm: Arc::clone(&ctx.fsm),
            registry: Arc::clone(&ctx.counters),
            executors,
            batch_size: ctx.batch_size,
        }
    }

    /// Group rows wait in the buffer until the agent works and the counter
    /// manifest is loaded.
    fn is_ready(&self) -> bool {
        self.fsm.get() > OrchState::Ready && self.registry.is_initialized()
    }

    async fn do_counter_group_task(&mut self) -> OrchResult<()> {
        if !self.is_ready() {
            return Ok(());
        }
        let Some(table) = self.executors.table(GROUP_TABLE) else {
            return Ok(());
        };
        let entries = table.drain();

        for entry in entries {
            info_log!("FlexCounterOrch", "FlexCounterOrch key is {} op is {}", entry.key, entry.op);
            let group = match entry.key.parse::<CounterGroup>() {
                Ok(group) => group,
                Err(e) => {
                    info_log!("FlexCounterOrch", "Invalid flex counter group input, {}", e.invalid_key);
                    continue;
                }
            };
            if entry.op == Operation::Set {
                self.process_set(group, &entry.fvs).await?;
            }
        }
        Ok(())
    }

    async fn process_set(&self, group: CounterGroup, fvs: &[FieldValue]) -> OrchResult<()> {
        let manager = self.registry.manager(group);
        for (field, value) in fvs {
            match field.as_str() {
                fields::POLL_INTERVAL => {
                    let interval = match value.parse::<u32>() {
                        Ok(interval) => interval,
                        Err(_) => {
                            warn_log!(
                                "FlexCounterOrch",
                                "{}",
                                FlexCounterError::InvalidPollInterval(value.clone())
                            );
                            continue;
                        }
                    };
                    manager.update_group_polling_interval(interval).await?;

                    let record = AuditRecord::new(
                        AuditCategory::ConfigurationChange,
                        "FlexCounterOrch",
                        format!("set_polling_interval: {}", group),
                    )
                    .with_outcome(AuditOutcome::Success)
                    .with_object_id(group.group_name())
                    .with_object_type("flex_counter_group")
                    .with_details(serde_json::json!({
                        "poll_interval_ms": interval,
                    }));
                    audit_log!(record);
                }
                fields::STATUS => {
                    let enable = value == fields::STATUS_ENABLE;
                    if enable {
                        manager.enable().await?;
                    } else {
                        manager.disable().await?;
                    }

                    let record = AuditRecord::new(
                        AuditCategory::ResourceModify,
                        "FlexCounterOrch",
                        format!("{}_group: {}", if enable { "enable" } else { "disable" }, group),
                    )
                    .with_outcome(AuditOutcome::Success)
                    .with_object_id(group.group_name())
                    .with_object_type("flex_counter_group")
                    .with_details(serde_json::json!({
                        "enabled": enable,
                    }));
                    audit_log!(record);
                }
                _ => info_log!("FlexCounterOrch", "Unsupported field {}", field),
            }
        }
        Ok(())
    }

    fn do_counter_task(&mut self) {
        let Some(table) = self.executors.table(COUNTER_TABLE) else {
            return;
        };
        for entry in table.drain() {
            warn_log!("FlexCounterOrch", "Invalid flex counter table entry {}", entry.key);
        }
    }

    async fn run_table(&mut self, index: usize) -> OrchResult<()> {
        match index {
            GROUP_TABLE => self.do_counter_group_task().await,
            _ => {
                self.do_counter_task();
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Orch for FlexCounterOrch {
    fn name(&self) -> &str {
        "FlexCounterOrch"
    }

    async fn ready_executor(&self) -> Option<Executor> {
        self.executors.ready().await
    }

    async fn execute(&mut self, executor: Executor) -> OrchResult<()> {
        if let Executor::Table(index) = executor {
            let batch_size = self.batch_size;
            if let Some(table) = self.executors.table(index) {
                let popped = table.pops(batch_size).await?;
                debug_log!("FlexCounterOrch", "Popped {} entries from {}", popped, table.table_name());
            }
            self.run_table(index).await?;
        }
        Ok(())
    }

    async fn do_task(&mut self) -> OrchResult<()> {
        for index in [GROUP_TABLE, COUNTER_TABLE] {
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
    use crate::tables::FLEX_COUNTER_GROUP_TABLE;
    use sonic_orch_common::KeyOpFieldsValues;
    use sonic_otai::VirtualOtai;

    async fn orch() -> (SharedRuntimeContext, FlexCounterOrch) {
        let ctx = SharedRuntimeContext::new(
            Arc::new(VirtualOtai::new()),
            Databases::in_memory(),
            ContextOptions::default(),
        )
        .await
        .unwrap();
        let orch = FlexCounterOrch::new(&ctx);
        (ctx, orch)
    }

    fn fv(f: &str, v: &str) -> FieldValue {
        (f.to_string(), v.to_string())
    }

    async fn push_groups(ctx: &SharedRuntimeContext, orch: &mut FlexCounterOrch, entries: Vec<KeyOpFieldsValues>) {
        for entry in entries {
            ctx.dbs.config.push_change(CFG_FLEX_COUNTER_GROUP_TABLE, entry).await.unwrap();
        }
        orch.execute(Executor::Table(GROUP_TABLE)).await.unwrap();
    }

    fn working(ctx: &SharedRuntimeContext) {
        ctx.counters.init_counter_table(None);
        ctx.fsm.set(OrchState::Work);
    }

    #[tokio::test]
    async fn test_group_task_waits_for_work() {
        let (ctx, mut orch) = orch().await;
        ctx.counters.init_counter_table(None);
        push_groups(
            &ctx,
            &mut orch,
            vec![KeyOpFieldsValues::set("1S_STAT_GAUGE", vec![fv("POLL_INTERVAL", "5000")])],
        )
        .await;
        assert!(orch.has_pending_tasks());

        ctx.fsm.set(OrchState::Work);
        orch.do_task().await.unwrap();
        assert!(!orch.has_pending_tasks());
        assert_eq!(ctx.counters.manager(CounterGroup::Gauge).polling_interval(), 5000);
    }

    #[tokio::test]
    async fn test_group_task_waits_for_manifest() {
        let (ctx, mut orch) = orch().await;
        ctx.fsm.set(OrchState::Work);
        push_groups(
            &ctx,
            &mut orch,
            vec![KeyOpFieldsValues::set("1S_STAT_GAUGE", vec![fv("POLL_INTERVAL", "5000")])],
        )
        .await;
        assert!(orch.has_pending_tasks());
        assert_eq!(ctx.counters.manager(CounterGroup::Gauge).polling_interval(), 1000);

        ctx.counters.init_counter_table(None);
        orch.do_task().await.unwrap();
        assert!(!orch.has_pending_tasks());
        assert_eq!(ctx.counters.manager(CounterGroup::Gauge).polling_interval(), 5000);
    }

    #[tokio::test]
    async fn test_status_and_unknown_group() {
        let (ctx, mut orch) = orch().await;
        working(&ctx);
        push_groups(
            &ctx,
            &mut orch,
            vec![
                KeyOpFieldsValues::set(
                    "1S_STAT_STATUS",
                    vec![fv("FLEX_COUNTER_STATUS", "disable"), fv("BULK_CHUNK_SIZE", "8")],
                ),
                KeyOpFieldsValues::set("PORT_STAT_COUNTER", vec![fv("FLEX_COUNTER_STATUS", "disable")]),
            ],
        )
        .await;

        assert!(!ctx.counters.manager(CounterGroup::Status).is_enabled());
        assert!(ctx.counters.manager(CounterGroup::Counter).is_enabled());
        let status = ctx
            .dbs
            .flex_counter
            .hget(FLEX_COUNTER_GROUP_TABLE, "1S_STAT_STATUS", "FLEX_COUNTER_STATUS")
            .await
            .unwrap();
        assert_eq!(status.as_deref(), Some("disable"));
    }

    #[tokio::test]
    async fn test_bad_interval_ignored() {
        let (ctx, mut orch) = orch().await;
        working(&ctx);
        push_groups(
            &ctx,
            &mut orch,
            vec![KeyOpFieldsValues::set("1S_STAT_COUNTER", vec![fv("POLL_INTERVAL", "fast")])],
        )
        .await;
        assert_eq!(ctx.counters.manager(CounterGroup::Counter).polling_interval(), 1000);
    }

    #[tokio::test]
    async fn test_execute_pops_config_table() {
        let (ctx, mut orch) = orch().await;
        working(&ctx);
        ctx.dbs
            .config
            .push_change(
                CFG_FLEX_COUNTER_GROUP_TABLE,
                KeyOpFieldsValues::set("1S_STAT_GAUGE", vec![fv("FLEX_COUNTER_STATUS", "disable")]),
            )
            .await
            .unwrap();

        let executor = orch.ready_executor().await.unwrap();
        assert_eq!(executor, Executor::Table(GROUP_TABLE));
        orch.execute(executor).await.unwrap();
        assert!(!ctx.counters.manager(CounterGroup::Gauge).is_enabled());
        assert!(orch.ready_executor().await.is_none());
    }
}
