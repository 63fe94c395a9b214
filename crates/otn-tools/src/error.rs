use sonic_orch_common::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("no reply on {channel} within {timeout_ms} ms")]
    Timeout { channel: String, timeout_ms: u128 },

    #[error("request failed, op_ret {op_ret} status {data}")]
    Failed { op_ret: String, data: String },

    #[error("{0}")]
    Usage(String),

    #[error("Invalid table {0}")]
    InvalidTable(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl ToolError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ToolError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;
