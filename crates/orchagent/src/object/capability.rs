//! Optional behaviours an object type plugs into the generic engine.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use sonic_orch_common::{DbConnector, DbResult, FieldValue, NotificationMessage};
use sonic_otai::{Attribute, ObjectApi, OtaiObjectId};

use crate::flex_counter::{CounterType, FlexCounterRegistry};

/// Registers an object's counter-ID lists once it exists or is present again.
#[async_trait]
pub trait CounterAware: Send + Sync {
    /// Every counter type the object may be polled with.
    fn counter_types(&self) -> &[CounterType];

    /// `create_only` is the create-only snapshot of the object's key.
    async fn install(
        &self,
        counters: &FlexCounterRegistry,
        oid: OtaiObjectId,
        create_only: &BTreeMap<String, String>,
    ) -> DbResult<()>;

    async fn uninstall(&self, counters: &FlexCounterRegistry, oid: OtaiObjectId) -> DbResult<()> {
        counters.uninstall(oid, self.counter_types()).await
    }

    /// Called when the object reports NOT_PRESENT.
    async fn on_absent(&self, counters: &FlexCounterRegistry, oid: OtaiObjectId) -> DbResult<()> {
        self.uninstall(counters, oid).await
    }
}

/// Installs a fixed set of counter types.
#[derive(Debug, Clone, Copy)]
pub struct StaticCounters(pub &'static [CounterType]);

#[async_trait]
impl CounterAware for StaticCounters {
    fn counter_types(&self) -> &[CounterType] {
        self.0
    }

    async fn install(
        &self,
        counters: &FlexCounterRegistry,
        oid: OtaiObjectId,
        _create_only: &BTreeMap<String, String>,
    ) -> DbResult<()> {
        for &counter_type in self.0 {
            counters.install(oid, counter_type).await?;
        }
        Ok(())
    }
}

/// Propagates a presence change to dependent sub-objects.
#[async_trait]
pub trait PresenceAware: Send + Sync {
    /// `auxiliary` holds the auxiliary fields last declared for `key`.
    async fn propagate(
        &self,
        state_db: &Arc<dyn DbConnector>,
        key: &str,
        auxiliary: &[FieldValue],
        present: &str,
    ) -> DbResult<()>;
}

/// Attributes appended to the create call of every object.
pub trait ExtraAttrsOnCreate: Send + Sync {
    fn extra_attrs(&self, key: &str) -> Vec<Attribute>;
}

/// View of the engine handed to a [`SideChannel`] handler.
pub struct SideChannelContext<'a> {
    pub api: &'a ObjectApi,
    pub key2oid: &'a BTreeMap<String, OtaiObjectId>,
    pub appl_db: &'a Arc<dyn DbConnector>,
}

/// An extra request channel owned by an object type.
#[async_trait]
pub trait SideChannel: Send + Sync {
    fn channel(&self) -> &'static str;

    async fn handle(&self, request: NotificationMessage, ctx: SideChannelContext<'_>) -> DbResult<()>;
}

/// The capabilities an object type was built with.
#[derive(Default)]
pub struct Capabilities {
    pub counters: Option<Box<dyn CounterAware>>,
    pub presence: Option<Box<dyn PresenceAware>>,
    pub extra_attrs: Option<Box<dyn ExtraAttrsOnCreate>>,
    pub side_channel: Option<Box<dyn SideChannel>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counters(mut self, counters: impl CounterAware + 'static) -> Self {
        self.counters = Some(Box::new(counters));
        self
    }

    pub fn with_presence(mut self, presence: impl PresenceAware + 'static) -> Self {
        self.presence = Some(Box::new(presence));
        self
    }

    pub fn with_extra_attrs(mut self, extra: impl ExtraAttrsOnCreate + 'static) -> Self {
        self.extra_attrs = Some(Box::new(extra));
        self
    }

    pub fn with_side_channel(mut self, channel: impl SideChannel + 'static) -> Self {
        self.side_channel = Some(Box::new(channel));
        self
    }
}
