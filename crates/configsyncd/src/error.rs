use otn_tools::ToolError;
use sonic_orch_common::{DbError, OrchError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigSyncError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("scan request failed: {0}")]
    Request(#[from] ToolError),

    #[error("{service} has no usable configuration")]
    NoConfig { service: String },
}

impl From<ConfigSyncError> for OrchError {
    fn from(err: ConfigSyncError) -> Self {
        match err {
            ConfigSyncError::Db(e) => OrchError::Db(e),
            other => OrchError::fatal("configsyncd", other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigSyncError>;
