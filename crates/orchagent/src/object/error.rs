use sonic_orch_common::{DbError, OrchError};
use thiserror::Error;

/// Failures that stop an object orchestrator's pass.
///
/// HAL failures on individual objects are logged and reported, never raised;
/// only the root linecard create is fatal.
#[derive(Debug, Error)]
pub enum ObjectOrchError {
    #[error("{orch}: {reason}")]
    Fatal { orch: String, reason: String },

    #[error(transparent)]
    Db(#[from] DbError),
}

impl ObjectOrchError {
    pub fn fatal(orch: impl Into<String>, reason: impl Into<String>) -> Self {
        ObjectOrchError::Fatal {
            orch: orch.into(),
            reason: reason.into(),
        }
    }
}

impl From<ObjectOrchError> for OrchError {
    fn from(e: ObjectOrchError) -> Self {
        match e {
            ObjectOrchError::Fatal { orch, reason } => OrchError::fatal(orch, reason),
            ObjectOrchError::Db(e) => OrchError::Db(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, ObjectOrchError>;
