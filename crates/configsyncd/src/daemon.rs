//! The configsyncd event loop.

use std::sync::Arc;
use std::time::Duration;

use sonic_orch_common::{Executor, Orch, OrchResult, ProducerTable, Table};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::Result;
use crate::ocm::OcmConfigSync;
use crate::otdr::OtdrConfigSync;
use crate::scan::ScanContext;
use crate::sync::{ConfigSync, SyncDatabases, SyncService};
use crate::tables::{fields, LINECARD_TABLE, PLAIN_SYNCS};

#[derive(Debug, Clone)]
pub struct SyncDaemonConfig {
    /// Longest wait for a ready executor before the loop idles.
    pub select_timeout: Duration,
    /// Interval between two readiness scans while waiting.
    pub poll_interval: Duration,
    /// Interval between two looks for the linecard row.
    pub linecard_poll_interval: Duration,
}

impl Default for SyncDaemonConfig {
    fn default() -> Self {
        Self {
            select_timeout: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(10),
            linecard_poll_interval: Duration::from_millis(1000),
        }
    }
}

pub struct SyncDaemon {
    dbs: SyncDatabases,
    config: SyncDaemonConfig,
    syncs: Vec<Box<dyn SyncService>>,
    loaded: bool,
}

impl SyncDaemon {
    pub fn new(dbs: SyncDatabases, config: SyncDaemonConfig) -> Self {
        Self {
            dbs,
            config,
            syncs: Vec::new(),
            loaded: false,
        }
    }

    /// Every plain table sync followed by the OCM and OTDR syncs.
    pub fn with_default_syncs(dbs: SyncDatabases, config: SyncDaemonConfig) -> Self {
        let ctx = ScanContext::new(Arc::clone(&dbs.appl), Arc::clone(&dbs.state));
        let mut daemon = Self::new(dbs.clone(), config);
        for (service, table) in PLAIN_SYNCS {
            daemon.add_sync(Box::new(ConfigSync::new(service, &dbs, table, table)));
        }
        daemon.add_sync(Box::new(OcmConfigSync::new(&dbs, ctx.clone())));
        daemon.add_sync(Box::new(OtdrConfigSync::new(&dbs, ctx)));
        daemon
    }

    pub fn add_sync(&mut self, sync: Box<dyn SyncService>) {
        self.syncs.push(sync);
    }

    pub fn sync_names(&self) -> Vec<&str> {
        self.syncs.iter().map(|s| s.name()).collect()
    }

    /// Runs the initial load of every sync and keeps the ones that loaded.
    pub async fn load(&mut self) -> Result<usize> {
        let mut kept = Vec::with_capacity(self.syncs.len());
        for mut sync in std::mem::take(&mut self.syncs) {
            if sync.load().await? {
                kept.push(sync);
            } else {
                info!("ConfigDB does not have {} information, skipped", sync.name());
            }
        }
        self.syncs = kept;
        self.loaded = true;
        Ok(self.syncs.len())
    }

    /// Waits for the linecard row and publishes the number of loaded syncs
    /// on it. `false` if cancelled first.
    pub async fn announce_object_count(&self, token: &CancellationToken) -> Result<bool> {
        let linecards = Table::new(Arc::clone(&self.dbs.appl), LINECARD_TABLE);
        let producer = ProducerTable::new(Arc::clone(&self.dbs.appl), LINECARD_TABLE);
        let keys = loop {
            let keys = linecards.keys().await?;
            if !keys.is_empty() {
                break keys;
            }
            info!("Waiting for Linecard...");
            tokio::select! {
                _ = token.cancelled() => return Ok(false),
                _ = tokio::time::sleep(self.config.linecard_poll_interval) => {}
            }
        };

        let count = self.syncs.len().to_string();
        for key in keys {
            info!("Set object-count, key={}, count={}", key, count);
            producer.set(&key, vec![(fields::OBJECT_COUNT.to_string(), count.clone())]).await?;
        }
        Ok(true)
    }

    /// One loop iteration. Returns whether an executor ran.
    pub async fn run_once(&mut self) -> OrchResult<bool> {
        let Some((index, executor)) = self.select().await else {
            return Ok(false);
        };
        if let Some(sync) = self.syncs.get_mut(index) {
            debug!("{} ready: {:?}", sync.name(), executor);
            sync.execute(executor).await?;
        }
        for sync in self.syncs.iter_mut() {
            sync.do_task().await?;
        }
        Ok(true)
    }

    async fn select(&self) -> Option<(usize, Executor)> {
        let deadline = Instant::now() + self.config.select_timeout;
        loop {
            for (index, sync) in self.syncs.iter().enumerate() {
                if let Some(executor) = sync.ready_executor().await {
                    return Some((index, executor));
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Loads, announces and follows configuration changes until `token` is
    /// cancelled. Exits at once when no sync has configuration.
    pub async fn run(&mut self, token: CancellationToken) -> anyhow::Result<()> {
        if !self.loaded && self.load().await? == 0 {
            info!("No configuration in ConfigDB, exiting");
            return Ok(());
        }
        if self.announce_object_count(&token).await? {
            info!("Following configuration of {} syncs", self.syncs.len());
            let result = self.event_loop(&token).await;
            self.shutdown().await;
            result?;
        }
        Ok(())
    }

    async fn event_loop(&mut self, token: &CancellationToken) -> OrchResult<()> {
        while !token.is_cancelled() {
            self.run_once().await?;
        }
        Ok(())
    }

    pub async fn shutdown(&mut self) {
        for sync in self.syncs.iter_mut() {
            sync.shutdown().await;
        }
    }
}
