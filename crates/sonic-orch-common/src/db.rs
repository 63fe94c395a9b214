//! Key-value store abstraction.
//!
//! Every daemon talks to the shared store through [`DbConnector`]. A
//! connector is bound to one logical database (APPL_DB, STATE_DB, ...) and
//! offers hash access, a per-table change-stream and pub/sub notification
//! channels. [`crate::MemoryDb`] implements it in process and
//! `RedisDb` (feature `redis`) against a live server.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::consumer::{FieldValue, KeyOpFieldsValues};
use crate::notification::{NotificationMessage, NotificationSubscription};

/// Errors from store operations.
#[derive(Error, Debug, Clone)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Command error: {0}")]
    Command(String),

    #[error("Invalid data format: {0}")]
    InvalidData(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, DbError>;

/// Logical database, numbered as in SONiC's database_config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbId {
    ApplDb = 0,
    CountersDb = 2,
    ConfigDb = 4,
    FlexCounterDb = 5,
    StateDb = 6,
}

impl DbId {
    pub fn name(&self) -> &'static str {
        match self {
            DbId::ApplDb => "APPL_DB",
            DbId::CountersDb => "COUNTERS_DB",
            DbId::ConfigDb => "CONFIG_DB",
            DbId::FlexCounterDb => "FLEX_COUNTER_DB",
            DbId::StateDb => "STATE_DB",
        }
    }

    /// Separator between table name and key.
    pub fn separator(&self) -> char {
        match self {
            DbId::ConfigDb | DbId::StateDb | DbId::FlexCounterDb => '|',
            DbId::ApplDb | DbId::CountersDb => ':',
        }
    }

    pub fn index(&self) -> u8 {
        *self as u8
    }
}

/// Connection to one logical database.
#[async_trait]
pub trait DbConnector: Send + Sync {
    fn id(&self) -> DbId;

    fn separator(&self) -> char {
        self.id().separator()
    }

    /// Full hash name of a row: `TABLE<sep>key`.
    fn row_name(&self, table: &str, key: &str) -> String {
        format!("{}{}{}", table, self.separator(), key)
    }

    async fn hset(&self, table: &str, key: &str, fvs: &[FieldValue]) -> Result<()>;

    async fn hget(&self, table: &str, key: &str, field: &str) -> Result<Option<String>>;

    /// All fields of a row; empty when the row does not exist.
    async fn hgetall(&self, table: &str, key: &str) -> Result<Vec<FieldValue>>;

    async fn hdel(&self, table: &str, key: &str, field: &str) -> Result<()>;

    async fn del(&self, table: &str, key: &str) -> Result<()>;

    /// Keys (without the table prefix) of every row in a table.
    async fn keys(&self, table: &str) -> Result<Vec<String>>;

    /// Full names of every row matching a glob pattern.
    async fn row_names(&self, pattern: &str) -> Result<Vec<String>>;

    /// Deletes every row whose full name matches a glob pattern.
    async fn del_pattern(&self, pattern: &str) -> Result<usize>;

    /// Appends an entry to a table's change-stream.
    async fn push_change(&self, table: &str, entry: KeyOpFieldsValues) -> Result<()>;

    /// Pops up to `max` entries from a table's change-stream, oldest first.
    async fn pop_changes(&self, table: &str, max: usize) -> Result<Vec<KeyOpFieldsValues>>;

    async fn pending_changes(&self, table: &str) -> Result<usize>;

    /// Publishes on a channel, returning the number of receivers.
    async fn publish(&self, channel: &str, message: &NotificationMessage) -> Result<usize>;

    async fn subscribe(&self, channel: &str) -> Result<NotificationSubscription>;
}

/// Glob matching with `*` and `?`, as used by `KEYS`.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((sp, sn)) = star {
            pi = sp + 1;
            ni = sn + 1;
            star = Some((sp, sn + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '*')
}

/// Hash-only view of a table.
#[derive(Clone)]
pub struct Table {
    db: Arc<dyn DbConnector>,
    name: String,
}

impl Table {
    pub fn new(db: Arc<dyn DbConnector>, name: impl Into<String>) -> Self {
        Self { db, name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn db(&self) -> &Arc<dyn DbConnector> {
        &self.db
    }

    pub async fn set(&self, key: &str, fvs: &[FieldValue]) -> Result<()> {
        self.db.hset(&self.name, key, fvs).await
    }

    pub async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.db
            .hset(&self.name, key, &[(field.to_string(), value.to_string())])
            .await
    }

    pub async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        self.db.hget(&self.name, key, field).await
    }

    /// Row contents, `None` when the row does not exist.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<FieldValue>>> {
        let fvs = self.db.hgetall(&self.name, key).await?;
        Ok(if fvs.is_empty() { None } else { Some(fvs) })
    }

    pub async fn hdel(&self, key: &str, field: &str) -> Result<()> {
        self.db.hdel(&self.name, key, field).await
    }

    pub async fn del(&self, key: &str) -> Result<()> {
        self.db.del(&self.name, key).await
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        self.db.keys(&self.name).await
    }
}

/// A table whose writes are also announced on its change-stream.
#[derive(Clone)]
pub struct ProducerTable {
    table: Table,
}

impl ProducerTable {
    pub fn new(db: Arc<dyn DbConnector>, name: impl Into<String>) -> Self {
        Self {
            table: Table::new(db, name),
        }
    }

    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub async fn set(&self, key: &str, fvs: Vec<FieldValue>) -> Result<()> {
        self.table.set(key, &fvs).await?;
        self.table
            .db()
            .push_change(self.table.name(), KeyOpFieldsValues::set(key, fvs))
            .await
    }

    pub async fn del(&self, key: &str) -> Result<()> {
        self.table.del(key).await?;
        self.table
            .db()
            .push_change(self.table.name(), KeyOpFieldsValues::del(key))
            .await
    }

    pub fn table(&self) -> &Table {
        &self.table
    }
}
