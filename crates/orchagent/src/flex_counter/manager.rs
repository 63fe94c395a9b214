//! Per-group flex counter manager.
//!
//! A manager owns one FLEX_COUNTER_GROUP_TABLE row and the
//! FLEX_COUNTER_TABLE rows `<group>|<oid>` of every object it installed.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use sonic_orch_common::{DbConnector, DbResult, ProducerTable, Table};
use sonic_otai::OtaiObjectId;

use super::group::{CounterType, StatsMode};
use super::orch::fields;
use crate::tables::{FLEX_COUNTER_GROUP_TABLE, FLEX_COUNTER_TABLE};
use crate::{debug_log, warn_log};

#[derive(Debug)]
struct ManagerState {
    polling_interval: u32,
    enabled: bool,
    installed_counters: HashSet<OtaiObjectId>,
}

/// Manages the counter-ID lists of one polling group.
pub struct FlexCounterManager {
    group_name: String,
    stats_mode: StatsMode,
    separator: char,
    state: Mutex<ManagerState>,
    group_table: ProducerTable,
    counter_table: ProducerTable,
}

impl FlexCounterManager {
    /// Purges stale rows of the group left by a previous run, then writes
    /// the group configuration.
    pub async fn new(
        db: Arc<dyn DbConnector>,
        group_name: impl Into<String>,
        stats_mode: StatsMode,
        polling_interval: u32,
        enabled: bool,
    ) -> DbResult<Self> {
        let group_name = group_name.into();
        let manager = Self {
            separator: db.separator(),
            group_name,
            stats_mode,
            state: Mutex::new(ManagerState {
                polling_interval,
                enabled,
                installed_counters: HashSet::new(),
            }),
            group_table: ProducerTable::new(Arc::clone(&db), FLEX_COUNTER_GROUP_TABLE),
            counter_table: ProducerTable::new(Arc::clone(&db), FLEX_COUNTER_TABLE),
        };

        let counters = Table::new(Arc::clone(&db), FLEX_COUNTER_TABLE);
        for key in counters.keys().await? {
            if key.contains(&manager.group_name) {
                manager.counter_table.del(&key).await?;
            }
        }

        let groups = Table::new(db, FLEX_COUNTER_GROUP_TABLE);
        if groups.keys().await?.iter().any(|k| *k == manager.group_name) {
            manager.group_table.del(&manager.group_name).await?;
        }

        manager.apply_group_configuration().await?;
        debug_log!("FlexCounterManager", "Initialized flex counter group '{}'", manager.group_name);
        Ok(manager)
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    pub fn stats_mode(&self) -> StatsMode {
        self.stats_mode
    }

    pub fn polling_interval(&self) -> u32 {
        self.lock().polling_interval
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    pub fn is_installed(&self, object_id: OtaiObjectId) -> bool {
        self.lock().installed_counters.contains(&object_id)
    }

    pub fn installed_count(&self) -> usize {
        self.lock().installed_counters.len()
    }

    fn lock(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn counter_key(&self, object_id: OtaiObjectId) -> String {
        format!("{}{}{}", self.group_name, self.separator, object_id.serialize())
    }

    async fn apply_group_configuration(&self) -> DbResult<()> {
        let (interval, enabled) = {
            let state = self.lock();
            (state.polling_interval, state.enabled)
        };
        let status = if enabled {
            fields::STATUS_ENABLE
        } else {
            fields::STATUS_DISABLE
        };
        self.group_table
            .set(
                &self.group_name,
                vec![
                    (fields::STATS_MODE.to_string(), self.stats_mode.as_str().to_string()),
                    (fields::POLL_INTERVAL.to_string(), interval.to_string()),
                    (fields::STATUS.to_string(), status.to_string()),
                ],
            )
            .await
    }

    pub async fn update_group_polling_interval(&self, polling_interval: u32) -> DbResult<()> {
        self.group_table
            .set(
                &self.group_name,
                vec![(fields::POLL_INTERVAL.to_string(), polling_interval.to_string())],
            )
            .await?;
        self.lock().polling_interval = polling_interval;
        debug_log!(
            "FlexCounterManager",
            "Set polling interval for flex counter group '{}' to {} ms",
            self.group_name,
            polling_interval
        );
        Ok(())
    }

    /// Does nothing if the group is already enabled.
    pub async fn enable(&self) -> DbResult<()> {
        self.set_enabled(true).await
    }

    /// Does nothing if the group is already disabled.
    pub async fn disable(&self) -> DbResult<()> {
        self.set_enabled(false).await
    }

    async fn set_enabled(&self, enabled: bool) -> DbResult<()> {
        if self.lock().enabled == enabled {
            return Ok(());
        }
        let status = if enabled {
            fields::STATUS_ENABLE
        } else {
            fields::STATUS_DISABLE
        };
        self.group_table
            .set(&self.group_name, vec![(fields::STATUS.to_string(), status.to_string())])
            .await?;
        self.lock().enabled = enabled;
        debug_log!("FlexCounterManager", "Flex counter group '{}' {}", self.group_name, status);
        Ok(())
    }

    /// Writes the IDs of `counter_type` to polls for `object_id`.
    pub async fn set_counter_id_list(
        &self,
        object_id: OtaiObjectId,
        counter_type: CounterType,
        counter_stats: &BTreeSet<String>,
    ) -> DbResult<()> {
        let stats = counter_stats.iter().map(String::as_str).collect::<Vec<_>>().join(",");
        self.counter_table
            .set(&self.counter_key(object_id), vec![(counter_type.id_list_field(), stats)])
            .await?;
        self.lock().installed_counters.insert(object_id);
        debug_log!(
            "FlexCounterManager",
            "Updated flex counter id list for object '{}' in group '{}'",
            object_id.serialize(),
            self.group_name
        );
        Ok(())
    }

    /// Stops polling every counter of `object_id`.
    pub async fn clear_counter_id_list(&self, object_id: OtaiObjectId) -> DbResult<()> {
        if !self.lock().installed_counters.contains(&object_id) {
            warn_log!(
                "FlexCounterManager",
                "No counters found on object '{}' in group '{}'",
                object_id.serialize(),
                self.group_name
            );
            return Ok(());
        }
        self.counter_table.del(&self.counter_key(object_id)).await?;
        self.lock().installed_counters.remove(&object_id);
        debug_log!(
            "FlexCounterManager",
            "Cleared flex counter id list for object '{}' in group '{}'",
            object_id.serialize(),
            self.group_name
        );
        Ok(())
    }

    /// Deletes every installed row and the group row.
    pub async fn teardown(&self) -> DbResult<()> {
        let installed: Vec<OtaiObjectId> = self.lock().installed_counters.drain().collect();
        for object_id in installed {
            self.counter_table.del(&self.counter_key(object_id)).await?;
        }
        self.group_table.del(&self.group_name).await?;
        debug_log!("FlexCounterManager", "Deleted flex counter group '{}'", self.group_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sonic_orch_common::{DbId, MemoryDb};
    use sonic_otai::ObjectType;

    fn flex_db() -> Arc<dyn DbConnector> {
        Arc::new(MemoryDb::new(DbId::FlexCounterDb))
    }

    fn stats(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_new_writes_group_row() {
        let db = flex_db();
        let mgr = FlexCounterManager::new(Arc::clone(&db), "1S_STAT_GAUGE", StatsMode::Gauge, 1000, true)
            .await
            .unwrap();
        assert_eq!(mgr.group_name(), "1S_STAT_GAUGE");

        let row = db.hgetall(FLEX_COUNTER_GROUP_TABLE, "1S_STAT_GAUGE").await.unwrap();
        assert_eq!(
            row,
            vec![
                ("STATS_MODE".to_string(), "STATS_MODE_GAUGE".to_string()),
                ("POLL_INTERVAL".to_string(), "1000".to_string()),
                ("FLEX_COUNTER_STATUS".to_string(), "enable".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_set_and_clear_counter_id_list() {
        let db = flex_db();
        let mgr = FlexCounterManager::new(Arc::clone(&db), "1S_STAT_STATUS", StatsMode::Status, 1000, true)
            .await
            .unwrap();
        let oid = OtaiObjectId::compose(ObjectType::Port, 1);

        mgr.set_counter_id_list(oid, CounterType::PortStatus, &stats(&["B", "A"]))
            .await
            .unwrap();
        assert!(mgr.is_installed(oid));

        let key = format!("1S_STAT_STATUS|{}", oid.serialize());
        let value = db.hget(FLEX_COUNTER_TABLE, &key, "PORT_STATUS_ID_LIST").await.unwrap();
        assert_eq!(value.as_deref(), Some("A,B"));

        mgr.clear_counter_id_list(oid).await.unwrap();
        assert!(!mgr.is_installed(oid));
        assert!(db.hgetall(FLEX_COUNTER_TABLE, &key).await.unwrap().is_empty());

        // Clearing twice only warns.
        mgr.clear_counter_id_list(oid).await.unwrap();
    }

    #[tokio::test]
    async fn test_restart_purges_stale_rows() {
        let db = flex_db();
        let oid = OtaiObjectId::compose(ObjectType::Transceiver, 3);
        let other = OtaiObjectId::compose(ObjectType::Transceiver, 4);

        let first = FlexCounterManager::new(Arc::clone(&db), "1S_STAT_GAUGE", StatsMode::Gauge, 1000, true)
            .await
            .unwrap();
        first
            .set_counter_id_list(oid, CounterType::TransceiverGauge, &stats(&["X"]))
            .await
            .unwrap();
        first
            .set_counter_id_list(other, CounterType::TransceiverGauge, &stats(&["Y"]))
            .await
            .unwrap();
        let once = db.hgetall(FLEX_COUNTER_TABLE, &format!("1S_STAT_GAUGE|{}", oid.serialize())).await.unwrap();

        let second = FlexCounterManager::new(Arc::clone(&db), "1S_STAT_GAUGE", StatsMode::Gauge, 1000, true)
            .await
            .unwrap();
        assert!(db.keys(FLEX_COUNTER_TABLE).await.unwrap().is_empty());

        second
            .set_counter_id_list(oid, CounterType::TransceiverGauge, &stats(&["X"]))
            .await
            .unwrap();
        let twice = db.hgetall(FLEX_COUNTER_TABLE, &format!("1S_STAT_GAUGE|{}", oid.serialize())).await.unwrap();
        assert_eq!(once, twice);
        assert_eq!(db.keys(FLEX_COUNTER_TABLE).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_restart_keeps_other_groups() {
        let db = flex_db();
        let oid = OtaiObjectId::compose(ObjectType::Oa, 1);
        let status = FlexCounterManager::new(Arc::clone(&db), "1S_STAT_STATUS", StatsMode::Status, 1000, true)
            .await
            .unwrap();
        status
            .set_counter_id_list(oid, CounterType::OaStatus, &stats(&["S"]))
            .await
            .unwrap();

        FlexCounterManager::new(Arc::clone(&db), "1S_STAT_GAUGE", StatsMode::Gauge, 1000, true)
            .await
            .unwrap();
        assert_eq!(db.keys(FLEX_COUNTER_TABLE).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_enable_disable_idempotent() {
        let db = flex_db();
        let mgr = FlexCounterManager::new(Arc::clone(&db), "1S_STAT_COUNTER", StatsMode::Counter, 1000, true)
            .await
            .unwrap();
        let before = db.pending_changes(FLEX_COUNTER_GROUP_TABLE).await.unwrap();

        mgr.enable().await.unwrap();
        assert_eq!(db.pending_changes(FLEX_COUNTER_GROUP_TABLE).await.unwrap(), before);

        mgr.disable().await.unwrap();
        assert!(!mgr.is_enabled());
        let status = db.hget(FLEX_COUNTER_GROUP_TABLE, "1S_STAT_COUNTER", "FLEX_COUNTER_STATUS").await.unwrap();
        assert_eq!(status.as_deref(), Some("disable"));

        mgr.update_group_polling_interval(5000).await.unwrap();
        assert_eq!(mgr.polling_interval(), 5000);
    }

    #[tokio::test]
    async fn test_teardown() {
        let db = flex_db();
        let mgr = FlexCounterManager::new(Arc::clone(&db), "1S_STAT_GAUGE", StatsMode::Gauge, 1000, true)
            .await
            .unwrap();
        let oid = OtaiObjectId::compose(ObjectType::Osc, 1);
        mgr.set_counter_id_list(oid, CounterType::OscGauge, &stats(&["G"])).await.unwrap();

        mgr.teardown().await.unwrap();
        assert!(db.keys(FLEX_COUNTER_TABLE).await.unwrap().is_empty());
        assert!(db.keys(FLEX_COUNTER_GROUP_TABLE).await.unwrap().is_empty());
        assert_eq!(mgr.installed_count(), 0);
    }
}
