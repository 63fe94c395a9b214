//! LinecardMgr implementation.
//!
//! Follows the CONFIG_DB linecard table. A SET is forwarded to APPL_DB with
//! all of its fields once STATE_DB reports `power-admin-state` as
//! `POWER_ENABLED` for the same key; before that the entry stays in the
//! pending buffer and a retry timer revisits it. A DEL is only logged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sonic_orch_common::{
    ConsumerConfig, DbConnector, DbResult, Executor, ExecutorSet, KeyOpFieldsValues, Operation, Orch, OrchResult,
    ProducerTable, SelectableTimer, Table, TableConsumer,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::tables::{LINECARD_TABLE, POWER_ADMIN_STATE, POWER_ENABLED};

const BATCH_SIZE: usize = 128;
const CONFIG_TABLE: usize = 0;

#[derive(Debug, Clone)]
pub struct LinecardMgrConfig {
    /// Longest wait for a ready executor before the loop idles.
    pub select_timeout: Duration,
    /// Interval between two readiness scans while waiting.
    pub poll_interval: Duration,
    /// Interval between two looks at rows still waiting for power.
    pub retry_interval: Duration,
}

impl Default for LinecardMgrConfig {
    fn default() -> Self {
        Self {
            select_timeout: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(10),
            retry_interval: Duration::from_millis(1000),
        }
    }
}

pub struct LinecardMgr {
    config: LinecardMgrConfig,
    cfg_table: Table,
    state_table: Table,
    appl: ProducerTable,
    executors: ExecutorSet,
}

impl LinecardMgr {
    pub fn new(
        config_db: Arc<dyn DbConnector>,
        appl_db: Arc<dyn DbConnector>,
        state_db: Arc<dyn DbConnector>,
        config: LinecardMgrConfig,
    ) -> Self {
        let mut executors = ExecutorSet::new();
        executors.add_table(TableConsumer::new(
            Arc::clone(&config_db),
            ConsumerConfig::new(LINECARD_TABLE).with_batch_size(BATCH_SIZE),
        ));
        executors.add_timer(SelectableTimer::new(config.retry_interval));

        Self {
            cfg_table: Table::new(config_db, LINECARD_TABLE),
            state_table: Table::new(state_db, LINECARD_TABLE),
            appl: ProducerTable::new(appl_db, LINECARD_TABLE),
            executors,
            config,
        }
    }

    /// Queues every linecard row already in CONFIG_DB.
    pub async fn load(&mut self) -> DbResult<usize> {
        let mut entries = Vec::new();
        for key in self.cfg_table.keys().await? {
            if let Some(fvs) = self.cfg_table.get(&key).await? {
                entries.push(KeyOpFieldsValues::set(key, fvs));
            }
        }
        let n = entries.len();
        if let Some(table) = self.executors.table(CONFIG_TABLE) {
            table.add_to_sync(entries);
        }
        Ok(n)
    }

    pub async fn is_power_enabled(&self, key: &str) -> DbResult<bool> {
        let state = self.state_table.hget(key, POWER_ADMIN_STATE).await?;
        let enabled = state.as_deref() == Some(POWER_ENABLED);
        if enabled {
            info!("{} power enabled", key);
        } else {
            debug!("{} power disabled", key);
        }
        Ok(enabled)
    }

    async fn do_linecard_task(&mut self) -> DbResult<()> {
        let Some(table) = self.executors.table(CONFIG_TABLE) else {
            return Ok(());
        };
        let entries = table.drain();

        let mut pending = Vec::new();
        for entry in entries {
            match entry.op {
                Operation::Set => {
                    if !self.is_power_enabled(&entry.key).await? {
                        pending.push(entry);
                        continue;
                    }
                    if entry.fvs.is_empty() {
                        continue;
                    }
                    for (field, value) in &entry.fvs {
                        debug!("{}: {} is {}", entry.key, field, value);
                    }
                    info!("Forwarding {} with {} fields", entry.key, entry.fvs.len());
                    self.appl.set(&entry.key, entry.fvs).await?;
                }
                Operation::Del => info!("Delete LineCard: {}", entry.key),
            }
        }

        if !pending.is_empty() {
            if let Some(table) = self.executors.table(CONFIG_TABLE) {
                table.requeue(pending);
            }
        }
        Ok(())
    }

    /// Loads CONFIG_DB and follows the linecard table until `token` is
    /// cancelled.
    pub async fn run(&mut self, token: CancellationToken) -> OrchResult<()> {
        let n = self.load().await?;
        info!("Loaded {} linecard rows from ConfigDB", n);
        self.do_linecard_task().await?;

        while !token.is_cancelled() {
            self.run_once().await?;
        }
        Ok(())
    }

    /// One loop iteration. Returns whether an executor ran.
    pub async fn run_once(&mut self) -> OrchResult<bool> {
        let Some(executor) = self.select().await else {
            return Ok(false);
        };
        self.execute(executor).await?;
        Ok(true)
    }

    async fn select(&self) -> Option<Executor> {
        let deadline = Instant::now() + self.config.select_timeout;
        loop {
            if let Some(executor) = self.executors.ready().await {
                return Some(executor);
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[async_trait]
impl Orch for LinecardMgr {
    fn name(&self) -> &str {
        "LinecardMgr"
    }

    async fn ready_executor(&self) -> Option<Executor> {
        self.executors.ready().await
    }

    async fn execute(&mut self, executor: Executor) -> OrchResult<()> {
        match executor {
            Executor::Table(index) => {
                if let Some(table) = self.executors.table(index) {
                    let popped = table.pops(BATCH_SIZE).await?;
                    debug!("Popped {} entries from {}", popped, table.table_name());
                }
            }
            Executor::Timer(index) => self.executors.fire_timer(index),
            Executor::Notification(_) => {}
        }
        self.do_task().await
    }

    async fn do_task(&mut self) -> OrchResult<()> {
        self.do_linecard_task().await?;
        Ok(())
    }

    fn has_pending_tasks(&self) -> bool {
        self.executors.has_pending()
    }

    fn dump_pending_tasks(&self) -> Vec<String> {
        self.executors.dump()
    }
}
