//! Runtime context handed to every orchestrator at construction.

use std::path::PathBuf;
use std::sync::Arc;

use sonic_orch_common::{DbConnector, DbId, DbResult, MemoryDb};
use sonic_otai::{ObjectApi, ObjectType, OtaiApi};

use crate::flex_counter::{FlexCounterOrchConfig, FlexCounterRegistry};
use crate::fsm::OrchFsm;
use crate::linecard::ConfigProgress;

/// Connections to the logical databases the agent uses.
#[derive(Clone)]
pub struct Databases {
    pub appl: Arc<dyn DbConnector>,
    pub state: Arc<dyn DbConnector>,
    pub counters: Arc<dyn DbConnector>,
    pub config: Arc<dyn DbConnector>,
    pub flex_counter: Arc<dyn DbConnector>,
}

impl Databases {
    /// One [`MemoryDb`] per logical database.
    pub fn in_memory() -> Self {
        Self {
            appl: Arc::new(MemoryDb::new(DbId::ApplDb)),
            state: Arc::new(MemoryDb::new(DbId::StateDb)),
            counters: Arc::new(MemoryDb::new(DbId::CountersDb)),
            config: Arc::new(MemoryDb::new(DbId::ConfigDb)),
            flex_counter: Arc::new(MemoryDb::new(DbId::FlexCounterDb)),
        }
    }
}

/// Process options copied into the context.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    pub slot_id: u32,
    pub batch_size: usize,
    pub flex_counter_json: Option<PathBuf>,
    pub flex_counter: FlexCounterOrchConfig,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            slot_id: 0,
            batch_size: 128,
            flex_counter_json: None,
            flex_counter: FlexCounterOrchConfig::default(),
        }
    }
}

/// State shared by all orchestrators: readiness FSM, HAL binding, counter
/// registry, linecard completion progress and database handles.
#[derive(Clone)]
pub struct SharedRuntimeContext {
    pub fsm: Arc<OrchFsm>,
    pub hal: Arc<dyn OtaiApi>,
    pub dbs: Databases,
    pub counters: Arc<FlexCounterRegistry>,
    pub progress: Arc<ConfigProgress>,
    pub slot_id: u32,
    pub batch_size: usize,
    pub flex_counter_json: Option<PathBuf>,
}

impl SharedRuntimeContext {
    /// Builds the context; creating the counter registry resets the counter
    /// groups in FLEX_COUNTER_DB.
    pub async fn new(hal: Arc<dyn OtaiApi>, dbs: Databases, options: ContextOptions) -> DbResult<Self> {
        let counters = FlexCounterRegistry::new(Arc::clone(&dbs.flex_counter), &options.flex_counter).await?;
        Ok(Self {
            fsm: Arc::new(OrchFsm::default()),
            progress: Arc::new(ConfigProgress::new(Arc::clone(&hal))),
            hal,
            dbs,
            counters: Arc::new(counters),
            slot_id: options.slot_id,
            batch_size: options.batch_size,
            flex_counter_json: options.flex_counter_json,
        })
    }

    /// HAL binding for one object type.
    pub fn api(&self, object_type: ObjectType) -> ObjectApi {
        ObjectApi::new(object_type, Arc::clone(&self.hal))
    }
}
