//! Base Orch trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::db::DbError;
use crate::executor::Executor;

/// Errors that stop the daemon loop.
#[derive(Error, Debug)]
pub enum OrchError {
    /// The process cannot continue (e.g. the root object could not be created).
    #[error("Fatal error in {orch}: {reason}")]
    Fatal { orch: String, reason: String },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl OrchError {
    pub fn fatal(orch: impl Into<String>, reason: impl Into<String>) -> Self {
        OrchError::Fatal {
            orch: orch.into(),
            reason: reason.into(),
        }
    }
}

pub type OrchResult<T> = std::result::Result<T, OrchError>;

/// Base trait for all orchestration agents.
///
/// Each Orch module implements this trait to participate in the
/// OrchDaemon event loop.
///
/// # Lifecycle
///
/// 1. Construction: Orch is created with its database connections and
///    subscribes to its tables and channels
/// 2. Registration: the Orch is handed to the daemon
/// 3. Event Loop: the daemon asks for a ready executor, runs `execute()` on
///    it, then calls `do_task()` on every registered Orch
/// 4. Shutdown: Orch is dropped
#[async_trait]
pub trait Orch: Send + Sync {
    /// Returns the name of this Orch (for logging and debugging).
    fn name(&self) -> &str;

    /// The first of this Orch's sources that has data, if any.
    async fn ready_executor(&self) -> Option<Executor>;

    /// Drains one ready source and runs its handler.
    async fn execute(&mut self, executor: Executor) -> OrchResult<()>;

    /// Re-runs every table handler over its pending buffer.
    async fn do_task(&mut self) -> OrchResult<()>;

    /// Returns true if this Orch has pending work.
    fn has_pending_tasks(&self) -> bool {
        false
    }

    /// Dumps pending tasks for debugging.
    fn dump_pending_tasks(&self) -> Vec<String> {
        vec![]
    }
}
