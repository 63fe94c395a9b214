//! Clients for the request/reply channels served by the orchestration agent.
//!
//! - [`NotificationClient`]: one request, one awaited reply
//! - [`cmd`]: imperative `set`/`get` and the readiness query
//! - [`upgrade`]: transceiver firmware download and flash partition control
//! - [`dump`]: plain-text listing of the STATE_DB and COUNTERS_DB rows

pub mod client;
pub mod cmd;
pub mod dump;
mod error;
pub mod upgrade;

use std::sync::Arc;

use sonic_orch_common::{DbConnector, DbId};

pub use client::{NotificationClient, Reply};
pub use error::{Result, ToolError};

/// Opens the APPL_DB connection the tools talk over.
pub async fn connect_appl(host: &str, port: u16) -> Result<Arc<dyn DbConnector>> {
    connect_db(host, port, DbId::ApplDb).await
}

#[cfg(feature = "redis")]
pub async fn connect_db(host: &str, port: u16, id: DbId) -> Result<Arc<dyn DbConnector>> {
    use sonic_orch_common::{RedisConfig, RedisDb};

    let db = RedisDb::connect(RedisConfig::new(host, port, id)).await?;
    Ok(Arc::new(db))
}

#[cfg(not(feature = "redis"))]
pub async fn connect_db(_host: &str, _port: u16, id: DbId) -> Result<Arc<dyn DbConnector>> {
    log::warn!("Built without redis support, {} kept in process memory", id.name());
    Ok(Arc::new(sonic_orch_common::MemoryDb::new(id)))
}
