//! Common orchestration abstractions for the line-card control plane.
//!
//! This crate provides the core traits and types used by the orchestration
//! agent and the config-sync daemons:
//!
//! - [`Orch`]: Base trait for orchestration agents
//! - [`Consumer`]: Per-key pending buffer of a table's change-stream
//! - [`ExecutorSet`]: Tables, notification channels and timers of an Orch
//! - [`DbConnector`]: Key-value store abstraction, with [`MemoryDb`] and
//!   (feature `redis`) `RedisDb` implementations
//! - [`NotificationProducer`] / [`NotificationConsumer`]: request/reply channels
//!
//! # Architecture
//!
//! 1. Configuration is written to CONFIG_DB and mirrored into APPL_DB
//! 2. Orch modules consume APPL_DB change-streams through Consumers
//! 3. The OrchDaemon event loop dispatches ready sources to their Orchs
//! 4. Orchs translate configuration into HAL calls
//! 5. State is written back to STATE_DB and counters are registered in
//!    FLEX_COUNTER_DB
//!
//! # Example
//!
//! ```
//! use sonic_orch_common::{Consumer, ConsumerConfig, KeyOpFieldsValues};
//!
//! let mut consumer = Consumer::new(ConsumerConfig::new("PORT"));
//! consumer.add_to_sync(vec![
//!     KeyOpFieldsValues::set("PORT-1-1", vec![("index".into(), "1".into())]),
//!     KeyOpFieldsValues::set("PORT-1-1", vec![("admin-state".into(), "ENABLED".into())]),
//! ]);
//! let entries = consumer.drain();
//! assert_eq!(entries.len(), 1);
//! assert_eq!(entries[0].fvs.len(), 2);
//! ```

mod consumer;
mod db;
mod executor;
mod memory;
mod notification;
mod orch;
#[cfg(feature = "redis")]
mod redis_backend;

pub use consumer::{Consumer, ConsumerConfig, FieldValue, KeyOpFieldsValues, Operation};
pub use db::{glob_match, DbConnector, DbError, DbId, ProducerTable, Result as DbResult, Table};
pub use executor::{Executor, ExecutorSet, SelectableTimer, TableConsumer};
pub use memory::MemoryDb;
pub use notification::{NotificationConsumer, NotificationMessage, NotificationProducer, NotificationSubscription};
pub use orch::{Orch, OrchError, OrchResult};
#[cfg(feature = "redis")]
pub use redis_backend::{RedisConfig, RedisDb};
