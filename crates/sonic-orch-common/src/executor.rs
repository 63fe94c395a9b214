//! Event sources an Orch registers with the daemon.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::warn;

use crate::consumer::{Consumer, ConsumerConfig, KeyOpFieldsValues};
use crate::db::{DbConnector, Result};
use crate::notification::{NotificationConsumer, NotificationMessage};

/// Identifies one source inside an [`ExecutorSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Executor {
    Table(usize),
    Notification(usize),
    Timer(usize),
}

/// A [`Consumer`] bound to a table's change-stream.
pub struct TableConsumer {
    consumer: Consumer,
    db: Arc<dyn DbConnector>,
}

impl TableConsumer {
    pub fn new(db: Arc<dyn DbConnector>, config: ConsumerConfig) -> Self {
        Self {
            consumer: Consumer::new(config),
            db,
        }
    }

    pub fn table_name(&self) -> &str {
        self.consumer.table_name()
    }

    pub fn db(&self) -> &Arc<dyn DbConnector> {
        &self.db
    }

    /// True when the change-stream holds unread entries.
    pub async fn has_data(&self) -> bool {
        match self.db.pending_changes(self.consumer.table_name()).await {
            Ok(n) => n > 0,
            Err(e) => {
                warn!("Failed to poll {}: {}", self.consumer.table_name(), e);
                false
            }
        }
    }

    /// Moves up to one batch from the change-stream into the pending buffer.
    pub async fn pops(&mut self, batch_size: usize) -> Result<usize> {
        let entries = self.db.pop_changes(self.consumer.table_name(), batch_size).await?;
        let n = entries.len();
        self.consumer.add_to_sync(entries);
        Ok(n)
    }

    pub fn add_to_sync(&mut self, entries: Vec<KeyOpFieldsValues>) {
        self.consumer.add_to_sync(entries);
    }

    pub fn drain(&mut self) -> Vec<KeyOpFieldsValues> {
        self.consumer.drain()
    }

    pub fn requeue(&mut self, entries: Vec<KeyOpFieldsValues>) {
        self.consumer.requeue(entries);
    }

    pub fn has_pending(&self) -> bool {
        self.consumer.has_pending()
    }

    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }
}

/// A periodic timer polled by the daemon loop.
#[derive(Debug, Clone)]
pub struct SelectableTimer {
    interval: Duration,
    next: Instant,
}

impl SelectableTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now() + interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_ready(&self) -> bool {
        Instant::now() >= self.next
    }

    /// Re-arms the timer one interval from now.
    pub fn reset(&mut self) {
        self.next = Instant::now() + self.interval;
    }
}

/// Tables, notification channels and timers owned by one Orch.
#[derive(Default)]
pub struct ExecutorSet {
    pub tables: Vec<TableConsumer>,
    pub notifications: Vec<NotificationConsumer>,
    pub timers: Vec<SelectableTimer>,
}

impl ExecutorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, table: TableConsumer) -> Executor {
        self.tables.push(table);
        Executor::Table(self.tables.len() - 1)
    }

    pub fn add_notification(&mut self, consumer: NotificationConsumer) -> Executor {
        self.notifications.push(consumer);
        Executor::Notification(self.notifications.len() - 1)
    }

    pub fn add_timer(&mut self, timer: SelectableTimer) -> Executor {
        self.timers.push(timer);
        Executor::Timer(self.timers.len() - 1)
    }

    /// First source with data, tables before channels before timers.
    pub async fn ready(&self) -> Option<Executor> {
        for (i, table) in self.tables.iter().enumerate() {
            if table.has_data().await {
                return Some(Executor::Table(i));
            }
        }
        if let Some(i) = self.notifications.iter().position(NotificationConsumer::has_data) {
            return Some(Executor::Notification(i));
        }
        self.timers.iter().position(SelectableTimer::is_ready).map(Executor::Timer)
    }

    pub fn table(&mut self, index: usize) -> Option<&mut TableConsumer> {
        self.tables.get_mut(index)
    }

    pub fn pop_notification(&mut self, index: usize) -> Option<NotificationMessage> {
        self.notifications.get_mut(index).and_then(NotificationConsumer::pop)
    }

    /// Re-arms a fired timer.
    pub fn fire_timer(&mut self, index: usize) {
        if let Some(timer) = self.timers.get_mut(index) {
            timer.reset();
        }
    }

    pub fn has_pending(&self) -> bool {
        self.tables.iter().any(TableConsumer::has_pending)
    }

    pub fn dump(&self) -> Vec<String> {
        self.tables
            .iter()
            .flat_map(|t| {
                t.consumer()
                    .dump()
                    .into_iter()
                    .map(move |line| format!("{}: {}", t.table_name(), line))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbId;
    use crate::memory::MemoryDb;

    #[tokio::test]
    async fn test_table_consumer_pops_batch() {
        let db: Arc<dyn DbConnector> = Arc::new(MemoryDb::new(DbId::ApplDb));
        for i in 0..5 {
            db.push_change("PORT", KeyOpFieldsValues::set(format!("PORT-1-{}", i), vec![]))
                .await
                .unwrap();
        }
        let mut table = TableConsumer::new(db.clone(), ConsumerConfig::new("PORT"));
        assert!(table.has_data().await);
        assert_eq!(table.pops(3).await.unwrap(), 3);
        assert!(table.has_data().await);
        assert_eq!(table.pops(3).await.unwrap(), 2);
        assert!(!table.has_data().await);
        assert_eq!(table.drain().len(), 5);
    }

    #[tokio::test]
    async fn test_executor_set_ready_order() {
        let db: Arc<dyn DbConnector> = Arc::new(MemoryDb::new(DbId::ApplDb));
        let mut set = ExecutorSet::new();
        let table = set.add_table(TableConsumer::new(db.clone(), ConsumerConfig::new("PORT")));
        let channel = set.add_notification(NotificationConsumer::new(&db, "PORT_NOTIFICATION").await.unwrap());
        assert_eq!(set.ready().await, None);

        db.publish("PORT_NOTIFICATION", &NotificationMessage::new("get", "PORT-1-1", vec![]))
            .await
            .unwrap();
        assert_eq!(set.ready().await, Some(channel));

        db.push_change("PORT", KeyOpFieldsValues::del("PORT-1-1")).await.unwrap();
        assert_eq!(set.ready().await, Some(table));

        let Executor::Notification(i) = channel else { unreachable!() };
        assert_eq!(set.pop_notification(i).unwrap().data, "PORT-1-1");
    }

    #[test]
    fn test_timer() {
        let mut timer = SelectableTimer::new(Duration::from_millis(0));
        assert!(timer.is_ready());
        let mut slow = SelectableTimer::new(Duration::from_secs(60));
        assert!(!slow.is_ready());
        slow.reset();
        assert!(!slow.is_ready());
        timer.reset();
        assert_eq!(timer.interval(), Duration::from_millis(0));
    }
}
