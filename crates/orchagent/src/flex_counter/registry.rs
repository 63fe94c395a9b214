//! Counter-ID registry.
//!
//! Holds the counter-ID lists loaded from the static manifest and the three
//! group managers. Object orchestrators install and remove their objects'
//! lists through it; the registry is shared through the runtime context.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use sonic_orch_common::{DbConnector, DbResult};
use sonic_otai::OtaiObjectId;

use super::group::{CounterGroup, CounterType};
use super::manager::FlexCounterManager;
use super::orch::{FlexCounterError, FlexCounterOrchConfig, Result};
use crate::{info_log, warn_log};

const MANIFEST_OP: &str = "OP";
const MANIFEST_SET: &str = "SET";

/// Manifest-backed counter-ID lists plus the group managers.
pub struct FlexCounterRegistry {
    lists: RwLock<HashMap<CounterType, BTreeSet<String>>>,
    initialized: AtomicBool,
    gauge: FlexCounterManager,
    counter: FlexCounterManager,
    status: FlexCounterManager,
}

impl FlexCounterRegistry {
    pub async fn new(db: Arc<dyn DbConnector>, config: &FlexCounterOrchConfig) -> DbResult<Self> {
        let interval = config.default_poll_interval_ms;
        let make = |group: CounterGroup| {
            FlexCounterManager::new(Arc::clone(&db), group.group_name(), group.stats_mode(), interval, true)
        };
        Ok(Self {
            lists: RwLock::new(HashMap::new()),
            initialized: AtomicBool::new(false),
            gauge: make(CounterGroup::Gauge).await?,
            counter: make(CounterGroup::Counter).await?,
            status: make(CounterGroup::Status).await?,
        })
    }

    pub fn manager(&self, group: CounterGroup) -> &FlexCounterManager {
        match group {
            CounterGroup::Gauge => &self.gauge,
            CounterGroup::Counter => &self.counter,
            CounterGroup::Status => &self.status,
        }
    }

    /// True once the manifest has been consumed, whether or not it existed.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Loads the manifest at `path`. A missing or malformed manifest leaves
    /// the lists empty; the registry is marked initialized either way.
    pub fn init_counter_table(&self, path: Option<&Path>) {
        match path {
            None => info_log!("FlexCounterRegistry", "No flex counter manifest configured"),
            Some(path) => match std::fs::read_to_string(path) {
                Ok(json) => match self.load_manifest(&json) {
                    Ok(n) => info_log!(
                        "FlexCounterRegistry",
                        "Loaded {} counter id lists from {}",
                        n,
                        path.display()
                    ),
                    Err(e) => warn_log!("FlexCounterRegistry", "Loading file {} failed: {}", path.display(), e),
                },
                Err(e) => warn_log!("FlexCounterRegistry", "Loading file {} failed: {}", path.display(), e),
            },
        }
        self.initialized.store(true, Ordering::Release);
    }

    /// Merges manifest entries into the lists; returns how many entries were used.
    pub fn load_manifest(&self, json: &str) -> Result<usize> {
        let items: Vec<serde_json::Map<String, Value>> =
            serde_json::from_str(json).map_err(|e| FlexCounterError::Manifest(e.to_string()))?;

        let mut lists = self.lists.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut loaded = 0;
        for item in items {
            let op = item.get(MANIFEST_OP).and_then(Value::as_str).unwrap_or_default();
            for (key, values) in item.iter().filter(|(k, _)| k.as_str() != MANIFEST_OP) {
                let Some(counter_type) = CounterType::from_manifest_key(key) else {
                    info_log!("FlexCounterRegistry", "Invalid flex counter input, {}", key);
                    continue;
                };
                info_log!("FlexCounterRegistry", "key is {} op is {}", key, op);
                if op != MANIFEST_SET {
                    continue;
                }
                let Some(values) = values.as_object() else {
                    warn_log!("FlexCounterRegistry", "Counter list {} is not an object", key);
                    continue;
                };
                let ids = lists.entry(counter_type).or_default();
                ids.extend(values.values().filter_map(Value::as_str).map(str::to_string));
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Counter IDs of `counter_type` (empty when the manifest has none).
    pub fn counter_ids(&self, counter_type: CounterType) -> BTreeSet<String> {
        self.lists
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&counter_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Installs the manifest list of `counter_type` for `oid`.
    pub async fn install(&self, oid: OtaiObjectId, counter_type: CounterType) -> DbResult<()> {
        let ids = self.counter_ids(counter_type);
        self.install_with(oid, counter_type, &ids).await
    }

    /// Installs an explicit list for `oid`.
    pub async fn install_with(
        &self,
        oid: OtaiObjectId,
        counter_type: CounterType,
        ids: &BTreeSet<String>,
    ) -> DbResult<()> {
        self.manager(counter_type.group())
            .set_counter_id_list(oid, counter_type, ids)
            .await
    }

    /// Removes `oid` from every group polling one of `types`.
    pub async fn uninstall(&self, oid: OtaiObjectId, types: &[CounterType]) -> DbResult<()> {
        let groups: BTreeSet<CounterGroup> = types.iter().map(CounterType::group).collect();
        for group in groups {
            self.manager(group).clear_counter_id_list(oid).await?;
        }
        Ok(())
    }
}
