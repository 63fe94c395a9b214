//! Change Consumer: per-key pending buffer fed from a table's change-stream.

use std::collections::{BTreeMap, VecDeque};

/// Operation type from Redis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Set operation (add or update)
    Set,
    /// Delete operation
    Del,
}

impl Operation {
    /// Returns true if this is a Set operation.
    pub fn is_set(&self) -> bool {
        matches!(self, Operation::Set)
    }

    /// Returns true if this is a Del operation.
    pub fn is_del(&self) -> bool {
        matches!(self, Operation::Del)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Set => "SET",
            Operation::Del => "DEL",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field-value pair of a row.
pub type FieldValue = (String, String);

/// Key, operation, and field-values tuple.
///
/// This is the unit of data carried on a table's change-stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOpFieldsValues {
    /// The key (e.g., "PORT-1-1", "ConfigDone")
    pub key: String,
    /// The operation (Set or Del)
    pub op: Operation,
    /// Field-value pairs (empty for Del operations)
    pub fvs: Vec<FieldValue>,
}

impl KeyOpFieldsValues {
    /// Creates a new entry.
    pub fn new(key: impl Into<String>, op: Operation, fvs: Vec<FieldValue>) -> Self {
        Self {
            key: key.into(),
            op,
            fvs,
        }
    }

    /// Creates a Set entry.
    pub fn set(key: impl Into<String>, fvs: Vec<FieldValue>) -> Self {
        Self::new(key, Operation::Set, fvs)
    }

    /// Creates a Del entry.
    pub fn del(key: impl Into<String>) -> Self {
        Self::new(key, Operation::Del, vec![])
    }

    /// Returns the value for a field, if present.
    pub fn get_field(&self, field: &str) -> Option<&str> {
        self.fvs
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if this entry has the given field.
    pub fn has_field(&self, field: &str) -> bool {
        self.fvs.iter().any(|(f, _)| f == field)
    }
}

/// Configuration for a Consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Table name (e.g., "PORT", "TRANSCEIVER")
    pub table_name: String,
    /// Pop batch size
    pub batch_size: usize,
}

impl ConsumerConfig {
    /// Creates a new consumer config.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            batch_size: 128,
        }
    }

    /// Sets the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

/// Pending-entry buffer of one table.
///
/// Entries popped from a change-stream are merged here and handed to the
/// owning Orch, which puts back whatever it could not finish.
///
/// # Deduplication Logic
///
/// When multiple operations arrive for the same key:
/// - DEL: replaces everything pending for the key
/// - SET after SET: merge field-values (newer overwrites older)
/// - SET after DEL: kept as a second entry (delete, then recreate)
///
/// So a key never has more than one DEL followed by one SET pending.
pub struct Consumer {
    config: ConsumerConfig,
    /// Pending tasks indexed by key for deduplication
    to_sync: BTreeMap<String, VecDeque<KeyOpFieldsValues>>,
    /// Total count of pending entries
    pending_count: usize,
}

impl Consumer {
    /// Creates a new consumer with the given configuration.
    pub fn new(config: ConsumerConfig) -> Self {
        Self {
            config,
            to_sync: BTreeMap::new(),
            pending_count: 0,
        }
    }

    /// Returns the table name.
    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    /// Returns true if there are pending entries.
    pub fn has_pending(&self) -> bool {
        self.pending_count > 0
    }

    /// Returns the number of pending entries.
    pub fn pending_count(&self) -> usize {
        self.pending_count
    }

    /// Adds entries to the sync queue with deduplication.
    pub fn add_to_sync(&mut self, entries: Vec<KeyOpFieldsValues>) {
        for entry in entries {
            self.add_single_entry(entry);
        }
    }

    fn add_single_entry(&mut self, entry: KeyOpFieldsValues) {
        let queue = self.to_sync.entry(entry.key.clone()).or_default();

        match entry.op {
            Operation::Del => {
                // DEL clears any pending SETs and replaces with DEL
                if !queue.is_empty() {
                    self.pending_count -= queue.len();
                    queue.clear();
                }
                queue.push_back(entry);
                self.pending_count += 1;
            }
            Operation::Set => {
                // SET merges with existing SET or appends
                if let Some(last) = queue.back_mut() {
                    if last.op == Operation::Set {
                        // Merge: newer values override
                        for (field, value) in entry.fvs {
                            if let Some(existing) = last.fvs.iter_mut().find(|(f, _)| *f == field) {
                                existing.1 = value;
                            } else {
                                last.fvs.push((field, value));
                            }
                        }
                        // Don't increment count - we merged
                        return;
                    }
                }
                // Either empty queue or last was DEL - append SET
                queue.push_back(entry);
                self.pending_count += 1;
            }
        }
    }

    /// Drains all pending entries in order.
    ///
    /// Returns entries grouped by key, maintaining operation order.
    pub fn drain(&mut self) -> Vec<KeyOpFieldsValues> {
        let mut result = Vec::with_capacity(self.pending_count);

        for (_key, mut queue) in std::mem::take(&mut self.to_sync) {
            while let Some(entry) = queue.pop_front() {
                result.push(entry);
            }
        }

        self.pending_count = 0;
        result
    }

    fn retry(&mut self, entry: KeyOpFieldsValues) {
        let queue = self.to_sync.entry(entry.key.clone()).or_default();
        queue.push_front(entry);
        self.pending_count += 1;
    }

    /// Puts back entries returned by [`drain`](Self::drain) that were not
    /// fully processed, ahead of anything queued since.
    pub fn requeue(&mut self, entries: Vec<KeyOpFieldsValues>) {
        for entry in entries.into_iter().rev() {
            self.retry(entry);
        }
    }

    /// Dumps pending entries for debugging.
    pub fn dump(&self) -> Vec<String> {
        self.to_sync
            .iter()
            .flat_map(|(key, queue)| {
                queue.iter().map(move |e| {
                    format!("{}: {} {:?}", key, e.op, e.fvs)
                })
            })
            .collect()
    }
}
