//! Mirroring of one CONFIG_DB table into its APPL_DB counterpart.
//!
//! The initial load copies every row carrying an `index` field and writes
//! the `ConfigDone` sentinel; afterwards the CONFIG_DB change-stream of the
//! table is followed for the rows accepted at load time.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use sonic_orch_common::{
    ConsumerConfig, DbConnector, DbId, Executor, ExecutorSet, KeyOpFieldsValues, MemoryDb, Orch, OrchResult,
    ProducerTable, Table, TableConsumer,
};
use tracing::{error, info};

use crate::error::Result;
use crate::tables::{fields, CONFIG_DONE_KEY};

const BATCH_SIZE: usize = 128;

/// Store connections shared by every sync.
#[derive(Clone)]
pub struct SyncDatabases {
    pub config: Arc<dyn DbConnector>,
    pub appl: Arc<dyn DbConnector>,
    pub state: Arc<dyn DbConnector>,
}

impl SyncDatabases {
    pub fn in_memory() -> Self {
        Self {
            config: Arc::new(MemoryDb::new(DbId::ConfigDb)),
            appl: Arc::new(MemoryDb::new(DbId::ApplDb)),
            state: Arc::new(MemoryDb::new(DbId::StateDb)),
        }
    }
}

/// A sync the daemon drives: an [`Orch`] with an initial load.
#[async_trait]
pub trait SyncService: Orch {
    /// Loads the CONFIG_DB table. `false` drops the sync from the daemon.
    async fn load(&mut self) -> Result<bool>;

    /// Stops background work owned by the sync.
    async fn shutdown(&mut self) {}
}

pub struct ConfigSync {
    service: String,
    cfg_table: Table,
    appl: ProducerTable,
    executors: ExecutorSet,
    entries: BTreeSet<String>,
    pending: BTreeMap<String, KeyOpFieldsValues>,
}

impl ConfigSync {
    pub fn new(service: &str, dbs: &SyncDatabases, cfg_table: &str, app_table: &str) -> Self {
        let mut executors = ExecutorSet::new();
        executors.add_table(TableConsumer::new(
            Arc::clone(&dbs.config),
            ConsumerConfig::new(cfg_table).with_batch_size(BATCH_SIZE),
        ));
        Self {
            service: service.to_string(),
            cfg_table: Table::new(Arc::clone(&dbs.config), cfg_table),
            appl: ProducerTable::new(Arc::clone(&dbs.appl), app_table),
            executors,
            entries: BTreeSet::new(),
            pending: BTreeMap::new(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Rows accepted by the initial load.
    pub fn entries(&self) -> &BTreeSet<String> {
        &self.entries
    }

    pub fn config_table(&self) -> &Table {
        &self.cfg_table
    }

    /// Follows the change-stream of another CONFIG_DB table; its entries are
    /// returned by [`pop_table`](Self::pop_table) and never mirrored.
    pub fn add_config_table(&mut self, table: &str) -> Executor {
        let db = Arc::clone(self.cfg_table.db());
        self.executors
            .add_table(TableConsumer::new(db, ConsumerConfig::new(table).with_batch_size(BATCH_SIZE)))
    }

    pub async fn pop_table(&mut self, index: usize) -> Result<Vec<KeyOpFieldsValues>> {
        let Some(table) = self.executors.table(index) else {
            return Ok(Vec::new());
        };
        table.pops(BATCH_SIZE).await?;
        Ok(table.drain())
    }

    pub async fn handle_config_from_config_db(&mut self) -> Result<bool> {
        info!("Getting {} configuration from ConfigDB...", self.service);

        let keys = self.cfg_table.keys().await?;
        if keys.is_empty() {
            info!("No {} configuration in ConfigDB", self.service);
            return Ok(false);
        }

        for key in keys {
            let fvs = self.cfg_table.get(&key).await?.unwrap_or_default();
            if !fvs.iter().any(|(f, _)| f == fields::INDEX) {
                error!("{}|{} is invalid, for it hasn't index field.", self.service, key);
                continue;
            }
            self.appl.set(&key, fvs).await?;
            self.entries.insert(key);
        }

        let done = vec![(fields::COUNT.to_string(), self.entries.len().to_string())];
        self.appl.set(CONFIG_DONE_KEY, done).await?;
        Ok(true)
    }

    /// Drains the table's change-stream, mirrors the SET entries of known
    /// rows and returns every accepted entry.
    pub async fn sync_changes(&mut self) -> Result<Vec<KeyOpFieldsValues>> {
        let mut accepted = Vec::new();
        for entry in self.pop_table(0).await? {
            if !self.entries.contains(&entry.key) {
                error!("{}|{} isn't a valid object", self.service, entry.key);
                continue;
            }
            info!("Getting {} configuration changed, key is {}", self.service, entry.key);
            if self.pending.insert(entry.key.clone(), entry.clone()).is_some() {
                info!("dropping previous pending config");
            }
            accepted.push(entry);
        }
        self.handle_config().await?;
        Ok(accepted)
    }

    async fn handle_config(&mut self) -> Result<()> {
        while let Some((key, entry)) = self.pending.pop_first() {
            info!("Updating {} configuration, key is {}, op is {}", self.service, key, entry.op);
            if entry.op.is_set() {
                self.appl.set(&key, entry.fvs).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Orch for ConfigSync {
    fn name(&self) -> &str {
        &self.service
    }

    async fn ready_executor(&self) -> Option<Executor> {
        self.executors.ready().await
    }

    async fn execute(&mut self, executor: Executor) -> OrchResult<()> {
        if executor == Executor::Table(0) {
            self.sync_changes().await?;
        }
        Ok(())
    }

    async fn do_task(&mut self) -> OrchResult<()> {
        Ok(())
    }

    fn has_pending_tasks(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[async_trait]
impl SyncService for ConfigSync {
    async fn load(&mut self) -> Result<bool> {
        self.handle_config_from_config_db().await
    }
}
