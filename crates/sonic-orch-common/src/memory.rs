//! In-process implementation of [`DbConnector`].

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::consumer::{FieldValue, KeyOpFieldsValues};
use crate::db::{glob_match, DbConnector, DbId, Result};
use crate::notification::{NotificationMessage, NotificationSubscription};

#[derive(Default)]
struct MemoryState {
    /// Rows by full name, fields in insertion order.
    hashes: BTreeMap<String, Vec<FieldValue>>,
    changes: HashMap<String, VecDeque<KeyOpFieldsValues>>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<NotificationMessage>>>,
}

/// A logical database held in memory.
///
/// Used by the tests of every crate and by the daemons when no Redis server
/// is configured.
pub struct MemoryDb {
    id: DbId,
    state: Mutex<MemoryState>,
}

impl MemoryDb {
    pub fn new(id: DbId) -> Self {
        Self {
            id,
            state: Mutex::new(MemoryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for MemoryDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDb").field("id", &self.id).finish()
    }
}

#[async_trait]
impl DbConnector for MemoryDb {
    fn id(&self) -> DbId {
        self.id
    }

    async fn hset(&self, table: &str, key: &str, fvs: &[FieldValue]) -> Result<()> {
        let name = self.row_name(table, key);
        let mut state = self.state();
        let row = state.hashes.entry(name).or_default();
        for (field, value) in fvs {
            match row.iter_mut().find(|(f, _)| f == field) {
                Some(existing) => existing.1 = value.clone(),
                None => row.push((field.clone(), value.clone())),
            }
        }
        Ok(())
    }

    async fn hget(&self, table: &str, key: &str, field: &str) -> Result<Option<String>> {
        let name = self.row_name(table, key);
        Ok(self
            .state()
            .hashes
            .get(&name)
            .and_then(|row| row.iter().find(|(f, _)| f == field).map(|(_, v)| v.clone())))
    }

    async fn hgetall(&self, table: &str, key: &str) -> Result<Vec<FieldValue>> {
        let name = self.row_name(table, key);
        Ok(self.state().hashes.get(&name).cloned().unwrap_or_default())
    }

    async fn hdel(&self, table: &str, key: &str, field: &str) -> Result<()> {
        let name = self.row_name(table, key);
        let mut state = self.state();
        let now_empty = match state.hashes.get_mut(&name) {
            Some(row) => {
                row.retain(|(f, _)| f != field);
                row.is_empty()
            }
            None => false,
        };
        if now_empty {
            state.hashes.remove(&name);
        }
        Ok(())
    }

    async fn del(&self, table: &str, key: &str) -> Result<()> {
        let name = self.row_name(table, key);
        self.state().hashes.remove(&name);
        Ok(())
    }

    async fn keys(&self, table: &str) -> Result<Vec<String>> {
        let prefix = format!("{}{}", table, self.separator());
        Ok(self
            .state()
            .hashes
            .keys()
            .filter_map(|name| name.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }

    async fn row_names(&self, pattern: &str) -> Result<Vec<String>> {
        Ok(self
            .state()
            .hashes
            .keys()
            .filter(|name| glob_match(pattern, name))
            .cloned()
            .collect())
    }

    async fn del_pattern(&self, pattern: &str) -> Result<usize> {
        let mut state = self.state();
        let before = state.hashes.len();
        state.hashes.retain(|name, _| !glob_match(pattern, name));
        Ok(before - state.hashes.len())
    }

    async fn push_change(&self, table: &str, entry: KeyOpFieldsValues) -> Result<()> {
        self.state()
            .changes
            .entry(table.to_string())
            .or_default()
            .push_back(entry);
        Ok(())
    }

    async fn pop_changes(&self, table: &str, max: usize) -> Result<Vec<KeyOpFieldsValues>> {
        let mut state = self.state();
        let Some(queue) = state.changes.get_mut(table) else {
            return Ok(vec![]);
        };
        let n = max.min(queue.len());
        Ok(queue.drain(..n).collect())
    }

    async fn pending_changes(&self, table: &str) -> Result<usize> {
        Ok(self.state().changes.get(table).map_or(0, VecDeque::len))
    }

    async fn publish(&self, channel: &str, message: &NotificationMessage) -> Result<usize> {
        let mut state = self.state();
        let Some(senders) = state.subscribers.get_mut(channel) else {
            return Ok(0);
        };
        senders.retain(|tx| tx.send(message.clone()).is_ok());
        Ok(senders.len())
    }

    async fn subscribe(&self, channel: &str) -> Result<NotificationSubscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state()
            .subscribers
            .entry(channel.to_string())
            .or_default()
            .push(tx);
        Ok(NotificationSubscription::new(channel, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ProducerTable, Table};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn fv(f: &str, v: &str) -> FieldValue {
        (f.to_string(), v.to_string())
    }

    #[tokio::test]
    async fn test_hash_ops() {
        let db = MemoryDb::new(DbId::StateDb);
        db.hset("PORT", "PORT-1-1", &[fv("a", "1"), fv("b", "2")]).await.unwrap();
        db.hset("PORT", "PORT-1-1", &[fv("a", "3")]).await.unwrap();

        assert_eq!(db.hget("PORT", "PORT-1-1", "a").await.unwrap(), Some("3".to_string()));
        assert_eq!(db.hgetall("PORT", "PORT-1-1").await.unwrap(), vec![fv("a", "3"), fv("b", "2")]);
        assert_eq!(db.keys("PORT").await.unwrap(), vec!["PORT-1-1".to_string()]);
        assert_eq!(db.row_names("*").await.unwrap(), vec!["PORT|PORT-1-1".to_string()]);
        assert!(db.row_names("OA|*").await.unwrap().is_empty());

        db.hdel("PORT", "PORT-1-1", "a").await.unwrap();
        db.hdel("PORT", "PORT-1-1", "b").await.unwrap();
        assert!(db.hgetall("PORT", "PORT-1-1").await.unwrap().is_empty());
        assert!(db.keys("PORT").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_del_pattern() {
        let db = MemoryDb::new(DbId::CountersDb);
        db.hset("OCH", "oid:0x1", &[fv("x", "1")]).await.unwrap();
        db.hset("OCH", "oid:0x1:15_pm_current", &[fv("x", "1")]).await.unwrap();
        db.hset("OCH", "oid:0x2", &[fv("x", "1")]).await.unwrap();

        assert_eq!(db.del_pattern("OCH:oid:0x1*").await.unwrap(), 2);
        assert_eq!(db.keys("OCH").await.unwrap(), vec!["oid:0x2".to_string()]);
    }

    #[tokio::test]
    async fn test_change_stream_order() {
        let db: Arc<dyn DbConnector> = Arc::new(MemoryDb::new(DbId::ApplDb));
        let table = ProducerTable::new(db.clone(), "PORT");
        table.set("A", vec![fv("index", "1")]).await.unwrap();
        table.del("A").await.unwrap();
        table.set("B", vec![fv("index", "2")]).await.unwrap();

        assert_eq!(db.pending_changes("PORT").await.unwrap(), 3);
        let first = db.pop_changes("PORT", 2).await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].key, "A");
        assert!(first[1].op.is_del());
        assert_eq!(db.pop_changes("PORT", 10).await.unwrap()[0].key, "B");
        assert!(db.pop_changes("PORT", 10).await.unwrap().is_empty());

        let plain = Table::new(db.clone(), "PORT");
        assert_eq!(plain.get("A").await.unwrap(), None);
        assert!(plain.get("B").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_publish_without_subscriber_is_dropped() {
        let db = MemoryDb::new(DbId::ApplDb);
        let msg = NotificationMessage::new("get", "k", vec![]);
        assert_eq!(db.publish("PORT_NOTIFICATION", &msg).await.unwrap(), 0);

        let mut sub = db.subscribe("PORT_NOTIFICATION").await.unwrap();
        assert_eq!(db.publish("PORT_NOTIFICATION", &msg).await.unwrap(), 1);
        assert_eq!(sub.try_recv(), Some(msg));
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let db = MemoryDb::new(DbId::ApplDb);
        let sub = db.subscribe("C").await.unwrap();
        drop(sub);
        let msg = NotificationMessage::new("x", "y", vec![]);
        assert_eq!(db.publish("C", &msg).await.unwrap(), 0);
    }
}
