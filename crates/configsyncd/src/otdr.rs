//! Periodic OTDR scans.
//!
//! Each OTDR row configures a schedule (`enable`, `start-time` in ns since
//! the epoch, `period` in seconds). A scan is only requested while the
//! OTDR reports `scanning-status=INACTIVE`, and scans of different OTDRs
//! never overlap.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sonic_orch_common::{Executor, FieldValue, Orch, OrchResult};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::scan::{sleep_or_cancel, ScanContext, ScanStatus, ScanTask};
use crate::sync::{ConfigSync, SyncDatabases, SyncService};
use crate::tables::{fields, OTDR_NOTIFICATION, OTDR_REPLY, OTDR_TABLE};

pub const DEFAULT_PERIOD: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanSchedule {
    pub enable: bool,
    /// Nanoseconds since the epoch; 0 starts at once.
    pub start_time_ns: u64,
    pub period: Duration,
}

impl Default for ScanSchedule {
    fn default() -> Self {
        Self {
            enable: false,
            start_time_ns: 0,
            period: DEFAULT_PERIOD,
        }
    }
}

impl ScanSchedule {
    /// Unparsable numbers read as 0; a zero period falls back to the default.
    pub fn from_fields(fvs: &[FieldValue]) -> Self {
        let mut schedule = Self::default();
        for (field, value) in fvs {
            match field.as_str() {
                fields::ENABLE => schedule.enable = value == "true",
                fields::START_TIME => schedule.start_time_ns = value.parse().unwrap_or(0),
                fields::PERIOD => {
                    let secs: u64 = value.parse().unwrap_or(0);
                    schedule.period = if secs == 0 { DEFAULT_PERIOD } else { Duration::from_secs(secs) };
                }
                _ => {}
            }
        }
        schedule
    }

    /// Wait before the first scan, given the current time in ms since the epoch.
    pub fn initial_delay(&self, now_ms: u64) -> Duration {
        if self.start_time_ns == 0 {
            return Duration::ZERO;
        }
        let start_ms = self.start_time_ns / 1_000_000;
        if start_ms >= now_ms {
            Duration::from_millis(start_ms - now_ms)
        } else {
            let period_ms = self.period.as_millis().max(1) as u64;
            Duration::from_millis(period_ms - (now_ms - start_ms) % period_ms)
        }
    }
}

/// Wait after a scan that took `elapsed` so that scans stay on the period grid.
pub fn next_delay(period: Duration, elapsed: Duration) -> Duration {
    let period_ms = period.as_millis().max(1);
    Duration::from_millis((period_ms - elapsed.as_millis() % period_ms) as u64)
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// Requests one scan of `name` if the OTDR is idle. `None` when skipped.
pub async fn scan_otdr(ctx: &ScanContext, name: &str) -> Result<Option<ScanStatus>> {
    let status = ctx.state.hget(OTDR_TABLE, name, fields::SCANNING_STATUS).await?;
    match status.as_deref() {
        Some("INACTIVE") => {}
        Some("ACTIVE") => {
            debug!("skip scan {}, it is active", name);
            return Ok(None);
        }
        _ => {
            debug!("skip scan {}, get scanning status failed", name);
            return Ok(None);
        }
    }
    ctx.request_scan(OTDR_NOTIFICATION, OTDR_REPLY, name).await.map(Some)
}

async fn scanning_loop(name: String, schedule: ScanSchedule, ctx: ScanContext, token: CancellationToken) {
    let delay = schedule.initial_delay(now_ms());
    info!("{}, delay {} ms", name, delay.as_millis());
    if !sleep_or_cancel(&token, delay).await {
        return;
    }

    loop {
        let started = Instant::now();
        debug!("Begin to scan, otdr: {}", name);
        {
            let _guard = ctx.scan_lock.lock().await;
            tokio::select! {
                _ = token.cancelled() => break,
                result = scan_otdr(&ctx, &name) => match result {
                    Ok(Some(ScanStatus::Timeout)) => error!("otdr scanning timeout, key={}", name),
                    Ok(Some(ScanStatus::Failed(ret))) => info!("otdr failed to scan, key={}, ret={}", name, ret),
                    Ok(Some(ScanStatus::Unavailable)) => info!("otdr failed to scan, key={}, ret=UNAVAILABLE", name),
                    Ok(_) => {}
                    Err(e) => warn!("otdr scan of {} failed: {}", name, e),
                },
            }
        }
        if !sleep_or_cancel(&token, next_delay(schedule.period, started.elapsed())).await {
            break;
        }
    }
}

pub struct OtdrScanningMgr {
    name: String,
    schedule: ScanSchedule,
    ctx: ScanContext,
    task: Option<ScanTask>,
}

impl OtdrScanningMgr {
    pub fn new(name: &str, schedule: ScanSchedule, ctx: ScanContext) -> Self {
        let mut mgr = Self {
            name: name.to_string(),
            schedule,
            ctx,
            task: None,
        };
        if schedule.enable {
            mgr.start();
        }
        mgr
    }

    pub fn schedule(&self) -> ScanSchedule {
        self.schedule
    }

    pub fn is_scanning(&self) -> bool {
        self.task.is_some()
    }

    fn start(&mut self) {
        let (name, schedule, ctx) = (self.name.clone(), self.schedule, self.ctx.clone());
        self.task = Some(ScanTask::spawn(move |token| scanning_loop(name, schedule, ctx, token)));
        info!("{}, OTDR scanning task started.", self.name);
    }

    pub async fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.stop().await;
            info!("{}, OTDR scanning task ended.", self.name);
        }
    }

    /// Applies a new schedule; the running loop is only restarted on change.
    pub async fn update(&mut self, schedule: ScanSchedule) {
        if schedule.enable == self.is_scanning()
            && schedule.start_time_ns == self.schedule.start_time_ns
            && schedule.period == self.schedule.period
        {
            return;
        }
        self.stop().await;
        self.schedule = schedule;
        if schedule.enable {
            self.start();
        }
    }
}

pub struct OtdrConfigSync {
    sync: ConfigSync,
    ctx: ScanContext,
    managers: BTreeMap<String, OtdrScanningMgr>,
}

impl OtdrConfigSync {
    pub fn new(dbs: &SyncDatabases, ctx: ScanContext) -> Self {
        Self {
            sync: ConfigSync::new("otdrsync", dbs, OTDR_TABLE, OTDR_TABLE),
            ctx,
            managers: BTreeMap::new(),
        }
    }

    pub fn manager(&self, name: &str) -> Option<&OtdrScanningMgr> {
        self.managers.get(name)
    }
}

#[async_trait]
impl Orch for OtdrConfigSync {
    fn name(&self) -> &str {
        self.sync.service()
    }

    async fn ready_executor(&self) -> Option<Executor> {
        self.sync.ready_executor().await
    }

    async fn execute(&mut self, executor: Executor) -> OrchResult<()> {
        if executor != Executor::Table(0) {
            return Ok(());
        }
        for entry in self.sync.sync_changes().await? {
            if let Some(mgr) = self.managers.get_mut(&entry.key) {
                mgr.update(ScanSchedule::from_fields(&entry.fvs)).await;
            }
        }
        Ok(())
    }

    async fn do_task(&mut self) -> OrchResult<()> {
        Ok(())
    }
}

#[async_trait]
impl SyncService for OtdrConfigSync {
    async fn load(&mut self) -> Result<bool> {
        if !self.sync.handle_config_from_config_db().await? {
            return Ok(false);
        }
        let names: Vec<String> = self.sync.entries().iter().cloned().collect();
        for name in names {
            let fvs = self.sync.config_table().get(&name).await?.unwrap_or_default();
            let mgr = OtdrScanningMgr::new(&name, ScanSchedule::from_fields(&fvs), self.ctx.clone());
            self.managers.insert(name, mgr);
        }
        Ok(true)
    }

    async fn shutdown(&mut self) {
        for mgr in self.managers.values_mut() {
            mgr.stop().await;
        }
    }
}
