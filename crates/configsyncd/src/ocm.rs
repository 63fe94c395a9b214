//! OCM group scanning.
//!
//! A single `OCM_GROUP` row lists the OCMs to scan round-robin and the
//! frequency granularity pushed to each of them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sonic_orch_common::{
    Executor, FieldValue, KeyOpFieldsValues, NotificationProducer, Orch, OrchResult, ProducerTable, Table,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::scan::{sleep_or_cancel, ScanContext, ScanStatus, ScanTask};
use crate::sync::{ConfigSync, SyncDatabases, SyncService};
use crate::tables::{fields, operation_result_channel, OCM_GROUP_TABLE, OCM_NOTIFICATION, OCM_REPLY, OCM_TABLE};

const ROUND_INTERVAL: Duration = Duration::from_millis(100);
const UNAVAILABLE_BACKOFF: Duration = Duration::from_millis(5000);

fn parse_ocm_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

async fn scanning_loop(group: String, ocms: Vec<String>, ctx: ScanContext, token: CancellationToken) {
    loop {
        let mut wait = ROUND_INTERVAL;
        for ocm in &ocms {
            debug!("Begin to scan, ocm_group: {}, ocm: {}", group, ocm);
            let status = tokio::select! {
                _ = token.cancelled() => return,
                status = ctx.request_scan(OCM_NOTIFICATION, OCM_REPLY, ocm) => status,
            };
            match status {
                Ok(ScanStatus::Unavailable) => {
                    wait = UNAVAILABLE_BACKOFF;
                    break;
                }
                Ok(ScanStatus::Timeout) => error!("ocm scanning timeout, key={}", ocm),
                Ok(ScanStatus::Failed(ret)) => info!("ocm failed to scan, key={}, ret={}", ocm, ret),
                Ok(ScanStatus::Success) => {}
                Err(e) => warn!("ocm scan of {} failed: {}", ocm, e),
            }
        }
        if !sleep_or_cancel(&token, wait).await {
            return;
        }
    }
}

pub struct OcmGroupMgr {
    name: String,
    ocms: Vec<String>,
    granularity: Option<String>,
    appl_ocm: ProducerTable,
    ctx: ScanContext,
    task: Option<ScanTask>,
}

impl OcmGroupMgr {
    /// Builds the manager from the group's CONFIG_DB row and starts scanning
    /// when the row lists at least one OCM.
    pub async fn new(name: &str, row: &[FieldValue], dbs: &SyncDatabases, ctx: ScanContext) -> Result<Self> {
        let mut mgr = Self {
            name: name.to_string(),
            ocms: Vec::new(),
            granularity: None,
            appl_ocm: ProducerTable::new(Arc::clone(&dbs.appl), OCM_TABLE),
            ctx,
            task: None,
        };
        for (field, value) in row {
            match field.as_str() {
                fields::OCM_LIST => mgr.ocms = parse_ocm_list(value),
                fields::FREQUENCY_GRANULARITY => mgr.granularity = Some(value.clone()),
                _ => {}
            }
        }
        if mgr.ocms.is_empty() {
            return Ok(mgr);
        }
        if mgr.granularity.is_some() {
            mgr.push_granularity(None).await?;
        }
        mgr.start();
        Ok(mgr)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ocms(&self) -> &[String] {
        &self.ocms
    }

    pub fn is_scanning(&self) -> bool {
        self.task.is_some()
    }

    fn start(&mut self) {
        if self.ocms.is_empty() {
            return;
        }
        let (group, ocms, ctx) = (self.name.clone(), self.ocms.clone(), self.ctx.clone());
        self.task = Some(ScanTask::spawn(move |token| scanning_loop(group, ocms, ctx, token)));
        info!("{}, OCM scanning task started.", self.name);
    }

    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.stop().await;
            info!("{}, OCM scanning task ended.", self.name);
        }
    }

    async fn push_granularity(&self, operation_id: Option<&str>) -> Result<()> {
        let Some(granularity) = &self.granularity else {
            return Ok(());
        };
        let mut fvs = vec![(fields::FREQUENCY_GRANULARITY.to_string(), granularity.clone())];
        if let Some(id) = operation_id {
            fvs.push((fields::OPERATION_ID.to_string(), id.to_string()));
        }
        for ocm in &self.ocms {
            self.appl_ocm.set(ocm, fvs.clone()).await?;
        }
        Ok(())
    }

    async fn publish_result(&self, field: &str, operation_id: &str, message: String) -> Result<()> {
        let channel = operation_result_channel(field, operation_id);
        let producer = NotificationProducer::new(Arc::clone(&self.ctx.state), channel);
        producer.send("0", &message, Vec::new()).await?;
        Ok(())
    }

    pub async fn handle_config(&mut self, entry: &KeyOpFieldsValues) -> Result<()> {
        if !entry.op.is_set() {
            return Ok(());
        }
        self.stop().await;

        let mut list = None;
        let mut granularity_updated = false;
        let operation_id = entry.get_field(fields::OPERATION_ID).filter(|id| !id.is_empty());
        for (field, value) in &entry.fvs {
            match field.as_str() {
                fields::OCM_LIST => {
                    self.ocms = parse_ocm_list(value);
                    list = Some(value.clone());
                }
                fields::FREQUENCY_GRANULARITY => {
                    self.granularity = Some(value.clone());
                    granularity_updated = true;
                }
                _ => {}
            }
        }
        if granularity_updated {
            self.push_granularity(operation_id).await?;
        }
        self.start();

        let Some(id) = operation_id else {
            return Ok(());
        };
        if let Some(list) = list {
            let message = format!("Set {} ocm-list to {}", entry.key, list);
            self.publish_result(fields::OCM_LIST, id, message).await?;
        }
        if granularity_updated && self.ocms.is_empty() {
            let value = self.granularity.clone().unwrap_or_default();
            let message = format!("Set {} frequency-granularity to {}", entry.key, value);
            self.publish_result(fields::FREQUENCY_GRANULARITY, id, message).await?;
        }
        Ok(())
    }
}

pub struct OcmConfigSync {
    sync: ConfigSync,
    dbs: SyncDatabases,
    ctx: ScanContext,
    groups: Table,
    group_executor: Executor,
    manager: Option<OcmGroupMgr>,
}

impl OcmConfigSync {
    pub fn new(dbs: &SyncDatabases, ctx: ScanContext) -> Self {
        let mut sync = ConfigSync::new("ocmsync", dbs, OCM_TABLE, OCM_TABLE);
        let group_executor = sync.add_config_table(OCM_GROUP_TABLE);
        Self {
            sync,
            dbs: dbs.clone(),
            ctx,
            groups: Table::new(Arc::clone(&dbs.config), OCM_GROUP_TABLE),
            group_executor,
            manager: None,
        }
    }

    pub fn manager(&self) -> Option<&OcmGroupMgr> {
        self.manager.as_ref()
    }

    async fn create_manager(&self, name: &str) -> Result<OcmGroupMgr> {
        let row = self.groups.get(name).await?.unwrap_or_default();
        OcmGroupMgr::new(name, &row, &self.dbs, self.ctx.clone()).await
    }

    async fn handle_group_config(&mut self) -> Result<()> {
        let mut keys = self.groups.keys().await?;
        info!("ocm group count = {}", keys.len());
        keys.sort();
        let Some(first) = keys.first() else {
            info!("No ocm group configuration in ConfigDB");
            return Ok(());
        };
        if keys.len() > 1 {
            error!("Multiple ocm groups configuration in ConfigDB, using {}", first);
        }
        self.manager = Some(self.create_manager(first).await?);
        Ok(())
    }

    async fn sync_groups(&mut self, index: usize) -> Result<()> {
        for entry in self.sync.pop_table(index).await? {
            match self.manager.as_ref().map(|mgr| mgr.name().to_string()) {
                None => self.manager = Some(self.create_manager(&entry.key).await?),
                Some(name) if name != entry.key => {
                    error!("{} is invalid", entry.key);
                    continue;
                }
                Some(_) => {}
            }
            if let Some(mgr) = self.manager.as_mut() {
                mgr.handle_config(&entry).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Orch for OcmConfigSync {
    fn name(&self) -> &str {
        self.sync.service()
    }

    async fn ready_executor(&self) -> Option<Executor> {
        self.sync.ready_executor().await
    }

    async fn execute(&mut self, executor: Executor) -> OrchResult<()> {
        match executor {
            Executor::Table(index) if executor == self.group_executor => self.sync_groups(index).await?,
            other => self.sync.execute(other).await?,
        }
        Ok(())
    }

    async fn do_task(&mut self) -> OrchResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SyncService for OcmConfigSync {
    async fn load(&mut self) -> Result<bool> {
        if !self.sync.handle_config_from_config_db().await? {
            return Ok(false);
        }
        self.handle_group_config().await?;
        Ok(true)
    }

    async fn shutdown(&mut self) {
        if let Some(mgr) = self.manager.as_mut() {
            mgr.stop().await;
        }
    }
}
