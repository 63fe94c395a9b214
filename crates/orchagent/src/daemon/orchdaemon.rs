//! OrchDaemon implementation.
//!
//! The OrchDaemon owns every orchestrator in registration order and runs the
//! event loop:
//! - wait up to the select timeout for any executor with data
//! - execute that one executor
//! - give every orchestrator a `do_task` pass over its retry buffers
//!
//! An idle timeout flushes the HAL and services pending log rotation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sonic_orch_common::{DbResult, Executor, Orch, OrchError, OrchResult};
use sonic_otai::OtaiObjectId;

use crate::audit::{AuditCategory, AuditOutcome, AuditRecord};
use crate::context::SharedRuntimeContext;
use crate::diag::DiagOrch;
use crate::flex_counter::FlexCounterOrch;
use crate::linecard::{LinecardOrch, LinecardOrchConfig};
use crate::objects::build_object_orchs;
use crate::{audit_log, debug_log, error_log, info_log};

const NAME: &str = "OrchDaemon";

/// Configuration for the OrchDaemon.
#[derive(Debug, Clone)]
pub struct OrchDaemonConfig {
    /// Longest wait for a ready executor before the loop idles.
    pub select_timeout_ms: u64,
    /// Interval between two readiness scans while waiting.
    pub poll_interval_ms: u64,
    /// Batch size for consumer operations
    pub batch_size: usize,
}

impl Default for OrchDaemonConfig {
    fn default() -> Self {
        Self {
            select_timeout_ms: 1000,
            poll_interval_ms: 10,
            batch_size: 128,
        }
    }
}

/// Cloneable handle stopping the loop or requesting a log rotation from
/// another task or a signal handler.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stop: Arc<AtomicBool>,
    log_rotate: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn request_log_rotate(&self) {
        self.log_rotate.store(true, Ordering::Release);
    }

    fn take_log_rotate(&self) -> bool {
        self.log_rotate.swap(false, Ordering::AcqRel)
    }
}

/// The main orchestration daemon.
pub struct OrchDaemon {
    config: OrchDaemonConfig,
    ctx: SharedRuntimeContext,
    orchs: Vec<Box<dyn Orch>>,
    handle: StopHandle,
}

impl OrchDaemon {
    /// Creates a daemon with no orchestrator registered.
    pub fn new(ctx: SharedRuntimeContext, config: OrchDaemonConfig) -> Self {
        Self {
            config,
            ctx,
            orchs: Vec::new(),
            handle: StopHandle::default(),
        }
    }

    /// Creates a daemon with the linecard, every object type, the diagnostic
    /// channel and the counter group orchestrator registered.
    pub async fn with_default_orchs(
        ctx: SharedRuntimeContext,
        config: OrchDaemonConfig,
        linecard: LinecardOrchConfig,
    ) -> DbResult<Self> {
        let mut daemon = Self::new(ctx.clone(), config);

        daemon.register_orch(Box::new(LinecardOrch::new(&ctx, linecard).await?));
        for orch in build_object_orchs(&ctx).await? {
            daemon.register_orch(Box::new(orch));
        }
        daemon.register_orch(Box::new(DiagOrch::new(&ctx).await?));
        daemon.register_orch(Box::new(FlexCounterOrch::new(&ctx)));

        let record = AuditRecord::new(AuditCategory::SystemLifecycle, NAME, "daemon_initialization")
            .with_outcome(AuditOutcome::Success)
            .with_details(serde_json::json!({
                "orch_count": daemon.orchs.len(),
                "slot_id": ctx.slot_id,
            }));
        audit_log!(record);
        Ok(daemon)
    }

    /// Registers an orchestrator; `do_task` passes follow registration order.
    pub fn register_orch(&mut self, orch: Box<dyn Orch>) {
        debug_log!(NAME, "Registering {}", orch.name());
        self.orchs.push(orch);
    }

    pub fn orch_names(&self) -> Vec<&str> {
        self.orchs.iter().map(|o| o.name()).collect()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.handle.clone()
    }

    /// Runs the event loop until stopped or until an orchestrator fails
    /// fatally.
    pub async fn run(&mut self) -> OrchResult<()> {
        info_log!(NAME, "Starting OrchDaemon event loop with {} orchs", self.orchs.len());
        let record = AuditRecord::new(AuditCategory::SystemLifecycle, NAME, "event_loop_started")
            .with_outcome(AuditOutcome::Success)
            .with_details(serde_json::json!({
                "select_timeout_ms": self.config.select_timeout_ms,
                "batch_size": self.config.batch_size,
            }));
        audit_log!(record);

        let result = self.event_loop().await;
        if let Err(e) = &result {
            error_log!(NAME, "Event loop terminated: {}", e);
            audit_log!(AuditRecord::new(AuditCategory::ErrorCondition, NAME, "event_loop_failed").with_error(e.to_string()));
        } else {
            info_log!(NAME, "OrchDaemon event loop stopped");
            audit_log!(
                AuditRecord::new(AuditCategory::SystemLifecycle, NAME, "event_loop_stopped")
                    .with_outcome(AuditOutcome::Success)
            );
        }
        result
    }

    async fn event_loop(&mut self) -> OrchResult<()> {
        while !self.handle.is_stopped() {
            self.run_once().await?;
        }
        Ok(())
    }

    /// One loop iteration. Returns whether an executor ran.
    pub async fn run_once(&mut self) -> OrchResult<bool> {
        let Some((index, executor)) = self.select().await else {
            if !self.handle.is_stopped() {
                self.flush()?;
            }
            return Ok(false);
        };

        if let Some(orch) = self.orchs.get_mut(index) {
            orch.execute(executor).await?;
        }
        for orch in self.orchs.iter_mut() {
            orch.do_task().await?;
        }
        Ok(true)
    }

    /// Waits for the first orchestrator, in registration order, with a
    /// ready executor.
    async fn select(&self) -> Option<(usize, Executor)> {
        let deadline = Instant::now() + Duration::from_millis(self.config.select_timeout_ms);
        let poll = Duration::from_millis(self.config.poll_interval_ms.max(1));
        loop {
            for (index, orch) in self.orchs.iter().enumerate() {
                if let Some(executor) = orch.ready_executor().await {
                    return Some((index, executor));
                }
            }
            if self.handle.is_stopped() || Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(poll).await;
        }
    }

    /// Flushes buffered HAL writes once a linecard exists; a failure ends
    /// the daemon.
    fn flush(&self) -> OrchResult<()> {
        if self.ctx.progress.linecard_oid() != OtaiObjectId::NULL {
            if let Err(e) = self.ctx.hal.flush() {
                error_log!(NAME, "Failed to flush HAL pipeline {}", e);
                return Err(OrchError::fatal(NAME, format!("Failed to flush HAL pipeline: {}", e)));
            }
        }
        if self.handle.take_log_rotate() {
            info_log!(NAME, "performing log rotate");
            self.ctx.hal.perform_log_rotate();
        }
        Ok(())
    }

    /// Dumps pending work for debugging.
    pub fn dump(&self) -> Vec<String> {
        let mut lines = vec![format!("OrchDaemon stopped: {}", self.handle.is_stopped())];
        for orch in &self.orchs {
            let pending = orch.dump_pending_tasks();
            lines.push(format!("  {} - {} pending", orch.name(), pending.len()));
            lines.extend(pending.into_iter().map(|p| format!("    {}", p)));
        }
        lines
    }
}
